//! Error types for session lifecycle operations.

use std::time::Duration;

use crate::connection::Target;

/// Failures of connection-related operations
///
/// None of these leave a half-configured connection behind: after an error
/// the session is disconnected and can be connected again.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Opening or configuring the inspector connection failed.
    #[error("failed to connect to {target}: {message}")]
    Connection {
        /// Where the connection was attempted.
        target: Target,
        /// The transport error chain.
        message: String,
    },

    /// The readiness signal could not be delivered to the process.
    #[error("failed to signal process {pid}: {message}")]
    SignalDelivery {
        /// The process that was signalled.
        pid: i32,
        /// The underlying error chain.
        message: String,
    },

    /// The process never opened its inspector port.
    #[error("inspector port {port} not reachable after {elapsed:?}")]
    ReadinessTimeout {
        /// The port being polled.
        port: u16,
        /// Time spent polling.
        elapsed: Duration,
    },
}

impl SessionError {
    pub(crate) fn connection(target: &Target, error: eyre::Report) -> Self {
        Self::Connection {
            target: target.clone(),
            message: format!("{error:#}"),
        }
    }
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;
