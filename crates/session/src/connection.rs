//! The seam to the inspector protocol client
//!
//! The session never speaks the protocol itself. A [`Connector`] opens
//! [`Connection`]s, and a connection delivers notifications through the
//! [`EventSink`] it is given.

use async_trait::async_trait;
use serde::Serialize;

use crate::{protocol::PauseOnExceptions, sink::EventSink};

/// Where to find an inspector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Target {
    /// Discover the debugger websocket from `host:port`
    Address { host: String, port: u16 },

    /// An explicit `ws://` debugger URL
    Url { url: String },
}

impl Target {
    pub fn address(host: impl Into<String>, port: u16) -> Self {
        Self::Address {
            host: host.into(),
            port,
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self::Url { url: url.into() }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Address { host, port } => write!(f, "{host}:{port}"),
            Target::Url { url } => write!(f, "{url}"),
        }
    }
}

/// Opens inspector connections
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, target: &Target) -> eyre::Result<Box<dyn Connection>>;
}

/// A live inspector connection
#[async_trait]
pub trait Connection: Send {
    /// `Debugger.enable`
    async fn enable_debugger(&mut self) -> eyre::Result<()>;

    /// `Runtime.enable`
    async fn enable_runtime(&mut self) -> eyre::Result<()>;

    /// `Debugger.setPauseOnExceptions`
    async fn set_pause_on_exceptions(&mut self, state: PauseOnExceptions) -> eyre::Result<()>;

    /// `Debugger.setAsyncCallStackDepth`
    async fn set_async_call_stack_depth(&mut self, max_depth: u32) -> eyre::Result<()>;

    /// Route `Runtime.consoleAPICalled`, `Debugger.paused` and
    /// `Debugger.resumed` to `sink`.
    ///
    /// Must not deliver notifications from within this call.
    fn register_listeners(&mut self, sink: EventSink) -> eyre::Result<()>;

    async fn close(&mut self) -> eyre::Result<()>;
}
