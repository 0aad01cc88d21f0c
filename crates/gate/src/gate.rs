use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::{
    notify::{Channel, Subscription},
    rules::{DEFAULT_RULES, ToolRule},
};

/// Connection and pause flags of a debugging session
///
/// `is_paused` implies `is_connected`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFlags {
    pub is_connected: bool,
    pub is_paused: bool,
}

impl SessionFlags {
    pub fn state(&self) -> GateState {
        match (self.is_connected, self.is_paused) {
            (false, _) => GateState::Disconnected,
            (true, false) => GateState::Connected,
            (true, true) => GateState::DebuggerPaused,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GateState {
    Disconnected,
    Connected,
    DebuggerPaused,
}

impl GateState {
    pub fn description(&self) -> &'static str {
        match self {
            GateState::Disconnected => "Not connected to a debugger",
            GateState::Connected => "Connected to debugger, program running",
            GateState::DebuggerPaused => "Debugger paused, stepping and inspection available",
        }
    }
}

impl std::fmt::Display for GateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateState::Disconnected => write!(f, "disconnected"),
            GateState::Connected => write!(f, "connected"),
            GateState::DebuggerPaused => write!(f, "debuggerPaused"),
        }
    }
}

/// Why a tool is currently disabled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    UnknownTool(String),
    OnlyWhenDisconnected,
    RequiresConnection,
    RequiresPause,
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Denial::UnknownTool(name) => write!(f, "Unknown tool: {name}"),
            Denial::OnlyWhenDisconnected => {
                write!(f, "Only available when disconnected from debugger")
            }
            Denial::RequiresConnection => write!(f, "Requires debugger connection"),
            Denial::RequiresPause => write!(f, "Requires debugger to be paused"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolState {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Diagnostic snapshot of the gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateDebugInfo {
    pub current_state: GateState,
    pub is_connected: bool,
    pub is_paused: bool,
    pub enabled_tools: Vec<&'static str>,
    pub disabled_tools: Vec<&'static str>,
    pub description: &'static str,
}

/// Decides which tools may run given the session flags
pub struct CapabilityGate {
    rules: &'static [ToolRule],
    flags: Mutex<SessionFlags>,
    state_change: Channel<SessionFlags>,
}

impl Default for CapabilityGate {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityGate {
    pub fn new() -> Self {
        Self::with_rules(DEFAULT_RULES)
    }

    pub fn with_rules(rules: &'static [ToolRule]) -> Self {
        Self {
            rules,
            flags: Mutex::new(SessionFlags::default()),
            state_change: Channel::new("gate.state_change"),
        }
    }

    pub fn rules(&self) -> &'static [ToolRule] {
        self.rules
    }

    pub fn flags(&self) -> SessionFlags {
        *self.flags.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> GateState {
        self.flags().state()
    }

    /// Record a connection change. Disconnecting also clears the pause flag.
    ///
    /// Returns `true` if the flags changed (and subscribers were notified).
    #[tracing::instrument(skip(self))]
    pub fn set_connection(&self, connected: bool) -> bool {
        let updated = {
            let mut flags = self.flags.lock().unwrap_or_else(PoisonError::into_inner);
            if flags.is_connected == connected {
                return false;
            }
            flags.is_connected = connected;
            if !connected {
                flags.is_paused = false;
            }
            *flags
        };

        tracing::debug!(state = %updated.state(), "gate state changed");
        self.state_change.emit(&updated);
        true
    }

    /// Record a pause change. Pausing while disconnected is refused.
    ///
    /// Returns `true` if the flags changed (and subscribers were notified).
    #[tracing::instrument(skip(self))]
    pub fn set_paused(&self, paused: bool) -> bool {
        let updated = {
            let mut flags = self.flags.lock().unwrap_or_else(PoisonError::into_inner);
            if flags.is_paused == paused {
                return false;
            }
            if paused && !flags.is_connected {
                tracing::warn!("ignoring pause while disconnected");
                return false;
            }
            flags.is_paused = paused;
            *flags
        };

        tracing::debug!(state = %updated.state(), "gate state changed");
        self.state_change.emit(&updated);
        true
    }

    /// Subscribe to edge-triggered flag changes
    pub fn on_state_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&SessionFlags) -> eyre::Result<()> + Send + Sync + 'static,
    {
        self.state_change.subscribe(callback)
    }

    pub fn is_tool_enabled(&self, name: &str) -> bool {
        self.evaluate(name, self.flags()).is_ok()
    }

    pub fn tool_state(&self, name: &str) -> ToolState {
        match self.evaluate(name, self.flags()) {
            Ok(()) => ToolState {
                enabled: true,
                reason: None,
            },
            Err(denial) => ToolState {
                enabled: false,
                reason: Some(denial.to_string()),
            },
        }
    }

    pub fn enabled_tools(&self) -> Vec<&'static str> {
        self.partition(self.flags()).0
    }

    pub fn disabled_tools(&self) -> Vec<&'static str> {
        self.partition(self.flags()).1
    }

    pub fn debug_info(&self) -> GateDebugInfo {
        let flags = self.flags();
        let (enabled_tools, disabled_tools) = self.partition(flags);
        let state = flags.state();
        GateDebugInfo {
            current_state: state,
            is_connected: flags.is_connected,
            is_paused: flags.is_paused,
            enabled_tools,
            disabled_tools,
            description: state.description(),
        }
    }

    /// Check `name` against `flags`. The first failing condition wins.
    pub fn evaluate(&self, name: &str, flags: SessionFlags) -> Result<(), Denial> {
        let rule = self
            .rules
            .iter()
            .find(|rule| rule.name == name)
            .ok_or_else(|| Denial::UnknownTool(name.to_string()))?;
        check(rule, flags)
    }

    fn partition(&self, flags: SessionFlags) -> (Vec<&'static str>, Vec<&'static str>) {
        let (enabled, disabled): (Vec<&ToolRule>, Vec<&ToolRule>) = self
            .rules
            .iter()
            .partition(|rule| check(rule, flags).is_ok());
        (
            enabled.into_iter().map(|r| r.name).collect(),
            disabled.into_iter().map(|r| r.name).collect(),
        )
    }
}

fn check(rule: &ToolRule, flags: SessionFlags) -> Result<(), Denial> {
    if rule.only_when_disconnected && flags.is_connected {
        return Err(Denial::OnlyWhenDisconnected);
    }
    if rule.requires_connection && !flags.is_connected {
        return Err(Denial::RequiresConnection);
    }
    if rule.requires_pause && !flags.is_paused {
        return Err(Denial::RequiresPause);
    }
    Ok(())
}

impl std::fmt::Debug for CapabilityGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityGate")
            .field("flags", &self.flags())
            .field("rules", &self.rules.len())
            .finish()
    }
}
