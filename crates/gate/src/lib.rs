//! Tool permission gate for an inspector debugging session
//!
//! The gate knows nothing about the debugging protocol. It holds two flags
//! (connected, paused), a static table of [`ToolRule`]s, and answers whether
//! a named tool may currently run.
mod gate;
pub mod notify;
mod rules;

pub use gate::{CapabilityGate, Denial, GateDebugInfo, GateState, SessionFlags, ToolState};
pub use notify::{Channel, Subscription};
pub use rules::{DEFAULT_RULES, ToolRule};
