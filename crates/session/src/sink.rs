use std::sync::{Arc, Weak};

use serde_json::Value;

use crate::{internals::SessionInternals, protocol::ConsoleApiCalled};

/// Receives inspector notifications on behalf of a session
///
/// Each connect attempt hands a fresh sink to its connection. Once that
/// connection is closed or replaced, its sink silently drops whatever it is
/// given, and so does a sink that outlives its session.
#[derive(Clone)]
pub struct EventSink {
    internals: Weak<SessionInternals>,
    generation: u64,
}

impl EventSink {
    pub(crate) fn new(internals: &Arc<SessionInternals>, generation: u64) -> Self {
        Self {
            internals: Arc::downgrade(internals),
            generation,
        }
    }

    /// `Runtime.consoleAPICalled`
    pub fn console_api_called(&self, event: ConsoleApiCalled) {
        if let Some(internals) = self.internals.upgrade() {
            internals.on_console_api_called(self.generation, event);
        }
    }

    /// `Debugger.paused`, with the notification parameters as sent
    pub fn paused(&self, details: Value) {
        if let Some(internals) = self.internals.upgrade() {
            internals.on_paused(self.generation, details);
        }
    }

    /// `Debugger.resumed`
    pub fn resumed(&self) {
        if let Some(internals) = self.internals.upgrade() {
            internals.on_resumed(self.generation);
        }
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("generation", &self.generation)
            .finish()
    }
}
