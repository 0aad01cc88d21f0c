//! Inspector debugging session
//!
//! Owns the single connection to a Node.js inspector, turns its pause,
//! resume and console notifications into queryable records, and mirrors the
//! connection/pause flags into a [`gate::CapabilityGate`].
mod connection;
mod console;
mod error;
mod internals;
pub mod protocol;
mod readiness;
mod records;
mod session;
mod signal;
mod sink;

pub use connection::{Connection, Connector, Target};
pub use console::render_args;
pub use error::{Result, SessionError};
pub use records::{DebuggerEvent, LogpointHit, TrackedBreakpoint};
pub use session::Session;
pub use signal::{InspectorSignal, ProcessSignaller};
pub use sink::EventSink;

pub use gate::{CapabilityGate, SessionFlags, Subscription};
