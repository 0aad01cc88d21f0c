use serde::Serialize;

/// Static policy for a single tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRule {
    pub name: &'static str,
    pub requires_connection: bool,
    pub requires_pause: bool,
    pub only_when_disconnected: bool,
}

impl ToolRule {
    /// A rule with no conditions, always enabled
    pub const fn always(name: &'static str) -> Self {
        Self {
            name,
            requires_connection: false,
            requires_pause: false,
            only_when_disconnected: false,
        }
    }

    pub const fn connected(name: &'static str) -> Self {
        Self {
            requires_connection: true,
            ..Self::always(name)
        }
    }

    pub const fn paused(name: &'static str) -> Self {
        Self {
            requires_connection: true,
            requires_pause: true,
            ..Self::always(name)
        }
    }

    pub const fn disconnected(name: &'static str) -> Self {
        Self {
            only_when_disconnected: true,
            ..Self::always(name)
        }
    }
}

/// Tool surface of the inspector debugging server
pub const DEFAULT_RULES: &[ToolRule] = &[
    // lifecycle
    ToolRule::disconnected("attach"),
    ToolRule::disconnected("enable_debugging"),
    ToolRule::connected("detach"),
    // breakpoints and logpoints
    ToolRule::connected("set_breakpoint"),
    ToolRule::connected("remove_breakpoint"),
    ToolRule::always("list_breakpoints"),
    ToolRule::connected("set_logpoint"),
    ToolRule::always("get_logpoint_hits"),
    ToolRule::always("clear_logpoint_hits"),
    // execution control
    ToolRule::connected("pause"),
    ToolRule::connected("continue"),
    ToolRule::paused("next"),
    ToolRule::paused("step_into"),
    ToolRule::paused("step_out"),
    // inspection
    ToolRule::connected("evaluate"),
    ToolRule::paused("get_call_stack"),
    ToolRule::paused("get_scope_variables"),
    // diagnostics
    ToolRule::always("get_debugger_events"),
    ToolRule::always("clear_debugger_events"),
    ToolRule::always("get_debugger_state"),
];
