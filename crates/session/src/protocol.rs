//! Notification payloads delivered by the inspector connection
//!
//! Field names follow the inspector protocol so payloads deserialize
//! directly from its JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A value mirrored from the debugged runtime
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Primitive values JSON cannot carry (`NaN`, `-0`, bigints)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unserializable_value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RemoteObject {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            kind: "string".to_string(),
            value: Some(Value::String(value.into())),
            ..Default::default()
        }
    }

    pub fn undefined() -> Self {
        Self {
            kind: "undefined".to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFrame {
    pub function_name: String,
    pub script_id: String,
    pub url: String,
    pub line_number: i64,
    pub column_number: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackTrace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub call_frames: Vec<CallFrame>,

    /// Asynchronous parent stack, bounded by the configured async depth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<StackTrace>>,
}

/// `Runtime.consoleAPICalled`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleApiCalled {
    /// Console method (`log`, `warning`, ...)
    #[serde(rename = "type")]
    pub kind: String,

    pub args: Vec<RemoteObject>,

    pub execution_context_id: i64,

    /// Milliseconds since the epoch, as reported by the runtime
    pub timestamp: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<StackTrace>,
}

/// Argument of `Debugger.setPauseOnExceptions`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PauseOnExceptions {
    None,
    Uncaught,
    All,
}

impl std::fmt::Display for PauseOnExceptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PauseOnExceptions::None => write!(f, "none"),
            PauseOnExceptions::Uncaught => write!(f, "uncaught"),
            PauseOnExceptions::All => write!(f, "all"),
        }
    }
}
