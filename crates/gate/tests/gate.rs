use std::{
    io::IsTerminal,
    sync::{Arc, Mutex},
};

use gate::{CapabilityGate, DEFAULT_RULES, GateState, SessionFlags};
use tracing_subscriber::EnvFilter;

// test suite "constructor"
#[ctor::ctor]
fn init() {
    let in_ci = std::env::var("CI")
        .map(|val| val == "true")
        .unwrap_or(false);

    if std::io::stderr().is_terminal() || in_ci {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .json()
            .try_init();
    }

    // error traces
    let _ = color_eyre::install();
}

fn recorder(gate: &CapabilityGate) -> Arc<Mutex<Vec<SessionFlags>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _ = gate.on_state_change(move |flags| {
        sink.lock().unwrap().push(*flags);
        Ok(())
    });
    seen
}

fn flags(is_connected: bool, is_paused: bool) -> SessionFlags {
    SessionFlags {
        is_connected,
        is_paused,
    }
}

#[test]
fn unknown_tools_are_always_denied() {
    let gate = CapabilityGate::new();

    for setup in [(false, false), (true, false), (true, true)] {
        gate.set_connection(setup.0);
        gate.set_paused(setup.1);

        for name in ["", "ATTACH", "launch_rocket", "continue "] {
            assert!(!gate.is_tool_enabled(name));
            let state = gate.tool_state(name);
            assert!(!state.enabled);
            assert_eq!(state.reason.as_deref(), Some(format!("Unknown tool: {name}").as_str()));
        }
    }
}

#[test]
fn initial_state_is_disconnected() {
    let gate = CapabilityGate::new();

    assert_eq!(gate.state(), GateState::Disconnected);
    assert!(gate.is_tool_enabled("attach"));
    assert!(!gate.is_tool_enabled("continue"));
    assert_eq!(
        gate.tool_state("continue").reason.as_deref(),
        Some("Requires debugger connection")
    );
    assert_eq!(gate.tool_state("attach").reason, None);
}

#[test]
fn connecting_flips_permissions_and_notifies_once() {
    let gate = CapabilityGate::new();
    let seen = recorder(&gate);

    assert!(gate.set_connection(true));

    assert!(!gate.is_tool_enabled("attach"));
    assert_eq!(
        gate.tool_state("attach").reason.as_deref(),
        Some("Only available when disconnected from debugger")
    );
    assert!(gate.is_tool_enabled("continue"));
    assert_eq!(*seen.lock().unwrap(), vec![flags(true, false)]);
}

#[test]
fn stepping_requires_pause() {
    let gate = CapabilityGate::new();
    gate.set_connection(true);

    gate.set_paused(true);
    assert!(gate.is_tool_enabled("next"));
    assert_eq!(gate.state(), GateState::DebuggerPaused);

    gate.set_paused(false);
    assert!(!gate.is_tool_enabled("next"));
    assert_eq!(
        gate.tool_state("next").reason.as_deref(),
        Some("Requires debugger to be paused")
    );
}

#[test]
fn disconnect_from_paused_clears_both_flags_in_one_step() {
    let gate = CapabilityGate::new();
    gate.set_connection(true);
    gate.set_paused(true);
    let seen = recorder(&gate);

    assert!(gate.set_connection(false));

    assert_eq!(gate.flags(), flags(false, false));
    assert_eq!(*seen.lock().unwrap(), vec![flags(false, false)]);
}

#[test]
fn repeated_values_do_not_notify() {
    let gate = CapabilityGate::new();
    let seen = recorder(&gate);

    assert!(!gate.set_connection(false));
    assert!(!gate.set_paused(false));
    assert!(gate.set_connection(true));
    assert!(!gate.set_connection(true));
    assert!(gate.set_paused(true));
    assert!(!gate.set_paused(true));

    assert_eq!(
        *seen.lock().unwrap(),
        vec![flags(true, false), flags(true, true)]
    );
}

#[test]
fn faulty_subscriber_does_not_block_later_ones() {
    let gate = CapabilityGate::new();
    let _ = gate.on_state_change(|_| Err(eyre::eyre!("subscriber exploded")));
    let _ = gate.on_state_change(|_| panic!("subscriber panicked"));
    let seen = recorder(&gate);

    assert!(gate.set_connection(true));

    assert_eq!(*seen.lock().unwrap(), vec![flags(true, false)]);
    assert!(gate.flags().is_connected);
}

#[test]
fn unsubscribed_callbacks_are_not_invoked() {
    let gate = CapabilityGate::new();
    let seen = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&seen);
    let subscription = gate.on_state_change(move |_| {
        *counter.lock().unwrap() += 1;
        Ok(())
    });

    gate.set_connection(true);
    subscription.unsubscribe();
    gate.set_connection(false);

    assert_eq!(*seen.lock().unwrap(), 1);
}

#[test]
fn subscriber_may_query_the_gate() {
    let gate = Arc::new(CapabilityGate::new());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let inner = Arc::clone(&gate);
    let sink = Arc::clone(&seen);
    let _ = gate.on_state_change(move |_| {
        sink.lock().unwrap().push(inner.is_tool_enabled("detach"));
        Ok(())
    });

    gate.set_connection(true);
    gate.set_connection(false);

    assert_eq!(*seen.lock().unwrap(), vec![true, false]);
}

#[test]
fn enabled_and_disabled_lists_cover_the_table() {
    let gate = CapabilityGate::new();

    for (connected, paused) in [(false, false), (true, false), (true, true)] {
        gate.set_connection(connected);
        gate.set_paused(paused);

        let enabled = gate.enabled_tools();
        let disabled = gate.disabled_tools();
        assert_eq!(enabled.len() + disabled.len(), DEFAULT_RULES.len());
        assert!(enabled.iter().all(|name| gate.is_tool_enabled(name)));
        assert!(disabled.iter().all(|name| !gate.is_tool_enabled(name)));
    }
}

#[test]
fn rules_without_conditions_are_always_enabled() {
    let gate = CapabilityGate::new();
    let always: Vec<_> = DEFAULT_RULES
        .iter()
        .filter(|r| !r.requires_connection && !r.requires_pause && !r.only_when_disconnected)
        .map(|r| r.name)
        .collect();
    assert!(!always.is_empty());

    for (connected, paused) in [(false, false), (true, false), (true, true)] {
        gate.set_connection(connected);
        gate.set_paused(paused);
        for name in &always {
            assert!(gate.is_tool_enabled(name), "{name} disabled in {}", gate.state());
        }
    }
}

#[test]
fn debug_info_snapshot() {
    let gate = CapabilityGate::new();
    gate.set_connection(true);

    let info = gate.debug_info();
    assert_eq!(info.current_state, GateState::Connected);
    assert!(info.is_connected);
    assert!(!info.is_paused);
    assert!(info.enabled_tools.contains(&"continue"));
    assert!(info.disabled_tools.contains(&"attach"));
    assert!(info.disabled_tools.contains(&"step_into"));
    assert_eq!(info.description, "Connected to debugger, program running");
}
