use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use gate::{CapabilityGate, Channel, SessionFlags};
use indexmap::IndexMap;
use serde_json::Value;

use crate::{
    connection::Target,
    console,
    protocol::ConsoleApiCalled,
    records::{DebuggerEvent, LogpointHit, TrackedBreakpoint},
};

/// The typed notifications a session publishes
pub(crate) struct SessionChannels {
    pub(crate) state_change: Channel<SessionFlags>,
    pub(crate) debugger_paused: Channel<DebuggerEvent>,
    pub(crate) debugger_resumed: Channel<DebuggerEvent>,
    pub(crate) logpoint_hit: Channel<LogpointHit>,
}

impl SessionChannels {
    fn new() -> Self {
        Self {
            state_change: Channel::new("session.state_change"),
            debugger_paused: Channel::new("session.debugger_paused"),
            debugger_resumed: Channel::new("session.debugger_resumed"),
            logpoint_hit: Channel::new("session.logpoint_hit"),
        }
    }
}

#[derive(Default)]
pub(crate) struct SessionState {
    pub(crate) flags: SessionFlags,
    pub(crate) target: Option<Target>,

    /// Bumped on every connect attempt and disconnect; sinks from older
    /// generations are ignored
    generation: u64,

    /// Pause state reported by the current attempt before it was marked
    /// connected
    pending_pause: Option<bool>,

    pub(crate) logpoint_hits: Vec<LogpointHit>,
    pub(crate) debugger_events: Vec<DebuggerEvent>,
    pub(crate) breakpoints: IndexMap<String, TrackedBreakpoint>,
}

impl SessionState {
    fn accepts(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

/// Outcome of a pause or resume accepted from a current sink
struct Transition {
    /// The attempt is already marked connected, so flags and gate follow
    live: bool,
    changed: Option<SessionFlags>,
}

/// State shared between the session and the event sinks it hands out
pub(crate) struct SessionInternals {
    pub(crate) gate: Arc<CapabilityGate>,
    pub(crate) channels: SessionChannels,
    sentinel: String,
    state: Mutex<SessionState>,

    /// Held across a state update and the matching gate update so the gate
    /// sees flag changes in the order they were applied
    transitions: Mutex<()>,
}

impl SessionInternals {
    pub(crate) fn new(gate: Arc<CapabilityGate>, sentinel: impl Into<String>) -> Self {
        Self {
            gate,
            channels: SessionChannels::new(),
            sentinel: sentinel.into(),
            state: Mutex::new(SessionState::default()),
            transitions: Mutex::new(()),
        }
    }

    /// Run `f` with the state locked. Never emit from inside `f`.
    pub(crate) fn with_state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut SessionState) -> T,
    {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    pub(crate) fn flags(&self) -> SessionFlags {
        self.with_state(|state| state.flags)
    }

    fn lock_transitions(&self) -> MutexGuard<'_, ()> {
        self.transitions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a connect attempt, invalidating every earlier sink
    pub(crate) fn begin_attempt(&self) -> u64 {
        self.with_state(|state| {
            state.generation += 1;
            state.pending_pause = None;
            state.generation
        })
    }

    /// Invalidate the sinks of an attempt that was rolled back
    pub(crate) fn abandon_attempt(&self, generation: u64) {
        self.with_state(|state| {
            if state.generation == generation {
                state.generation += 1;
                state.pending_pause = None;
            }
        });
    }

    /// Publish the attempt as connected, keeping any pause its sink already
    /// reported
    pub(crate) fn mark_connected(&self, generation: u64, target: Target) {
        let transitions = self.lock_transitions();
        let changed = self.with_state(|state| {
            if state.generation != generation {
                tracing::warn!(generation, current = state.generation, "connect attempt superseded");
                return None;
            }
            let before = state.flags;
            state.flags = SessionFlags {
                is_connected: true,
                is_paused: state.pending_pause.take().unwrap_or(false),
            };
            state.target = Some(target);
            Some((state.flags, (before != state.flags).then_some(state.flags)))
        });
        let Some((flags, changed)) = changed else {
            return;
        };

        self.gate.set_connection(true);
        self.gate.set_paused(flags.is_paused);
        drop(transitions);

        if let Some(flags) = changed {
            self.channels.state_change.emit(&flags);
        }
    }

    pub(crate) fn mark_disconnected(&self) {
        let transitions = self.lock_transitions();
        let changed = self.with_state(|state| {
            state.generation += 1;
            state.pending_pause = None;
            let before = state.flags;
            state.flags = SessionFlags::default();
            state.target = None;
            (before != state.flags).then_some(state.flags)
        });

        self.gate.set_connection(false);
        drop(transitions);

        if let Some(flags) = changed {
            self.channels.state_change.emit(&flags);
        }
    }

    #[tracing::instrument(skip(self, event), level = "trace")]
    pub(crate) fn on_console_api_called(&self, generation: u64, event: ConsoleApiCalled) {
        let message = console::render_args(&event.args);
        if !message.contains(&self.sentinel) {
            tracing::trace!(%message, "console message without logpoint sentinel");
            return;
        }

        let hit = LogpointHit {
            message,
            timestamp: event.timestamp,
            execution_context_id: event.execution_context_id,
            stack_trace: event.stack_trace,
        };

        let accepted = self.with_state(|state| {
            if !state.accepts(generation) {
                return false;
            }
            state.logpoint_hits.push(hit.clone());
            true
        });
        if !accepted {
            tracing::debug!("dropping console event from stale connection");
            return;
        }

        tracing::debug!(message = %hit.message, "logpoint hit");
        self.channels.logpoint_hit.emit(&hit);
    }

    #[tracing::instrument(skip(self, details), level = "trace")]
    pub(crate) fn on_paused(&self, generation: u64, details: Value) {
        let event = DebuggerEvent::paused(details);
        tracing::debug!(reason = ?event.reason(), "debugger paused");
        if self.transition(generation, &event) {
            self.channels.debugger_paused.emit(&event);
        } else {
            tracing::debug!("dropping paused event from stale connection");
        }
    }

    #[tracing::instrument(skip(self), level = "trace")]
    pub(crate) fn on_resumed(&self, generation: u64) {
        let event = DebuggerEvent::resumed();
        tracing::debug!("debugger resumed");
        if self.transition(generation, &event) {
            self.channels.debugger_resumed.emit(&event);
        } else {
            tracing::debug!("dropping resumed event from stale connection");
        }
    }

    /// Record `event` and apply its pause flag, then mirror it into the
    /// gate and notify `state_change` if it changed.
    ///
    /// While the attempt is not yet marked connected the flag is parked in
    /// `pending_pause`. Returns false if the sink is stale.
    fn transition(&self, generation: u64, event: &DebuggerEvent) -> bool {
        let paused = event.is_paused();
        let transitions = self.lock_transitions();
        let outcome = self.with_state(|state| {
            if !state.accepts(generation) {
                return None;
            }
            state.debugger_events.push(event.clone());
            if !state.flags.is_connected {
                state.pending_pause = Some(paused);
                return Some(Transition {
                    live: false,
                    changed: None,
                });
            }
            let changed = state.flags.is_paused != paused;
            state.flags.is_paused = paused;
            Some(Transition {
                live: true,
                changed: changed.then_some(state.flags),
            })
        });
        let Some(outcome) = outcome else {
            return false;
        };

        if outcome.live {
            self.gate.set_paused(paused);
        }
        drop(transitions);

        if let Some(flags) = outcome.changed {
            self.channels.state_change.emit(&flags);
        }
        true
    }
}
