use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocol::StackTrace;

/// A console message carrying the logpoint sentinel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogpointHit {
    pub message: String,
    pub timestamp: f64,
    pub execution_context_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<StackTrace>,
}

/// Execution transition reported by the debugger
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DebuggerEvent {
    /// `details` is the raw `Debugger.paused` payload
    Paused { timestamp: f64, details: Value },
    Resumed { timestamp: f64 },
}

impl DebuggerEvent {
    pub fn paused(details: Value) -> Self {
        Self::Paused {
            timestamp: now_millis(),
            details,
        }
    }

    pub fn resumed() -> Self {
        Self::Resumed {
            timestamp: now_millis(),
        }
    }

    pub fn timestamp(&self) -> f64 {
        match self {
            DebuggerEvent::Paused { timestamp, .. } | DebuggerEvent::Resumed { timestamp } => {
                *timestamp
            }
        }
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, DebuggerEvent::Paused { .. })
    }

    /// Pause reason (`breakpoint`, `exception`, `other`, ...) if present
    pub fn reason(&self) -> Option<&str> {
        match self {
            DebuggerEvent::Paused { details, .. } => details.get("reason").and_then(Value::as_str),
            DebuggerEvent::Resumed { .. } => None,
        }
    }
}

/// A breakpoint the caller asked the session to remember
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedBreakpoint {
    pub breakpoint_id: String,
    pub url: String,
    pub line_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Set for logpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_message: Option<String>,
}

impl TrackedBreakpoint {
    pub fn new(breakpoint_id: impl Into<String>, url: impl Into<String>, line_number: u32) -> Self {
        Self {
            breakpoint_id: breakpoint_id.into(),
            url: url.into(),
            line_number,
            column_number: None,
            condition: None,
            log_message: None,
        }
    }

    pub fn is_logpoint(&self) -> bool {
        self.log_message.is_some()
    }
}

pub(crate) fn now_millis() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or_default()
}
