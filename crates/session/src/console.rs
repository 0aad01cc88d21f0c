use serde_json::Value;

use crate::protocol::RemoteObject;

/// Render console arguments the way the console prints them, separated by
/// single spaces.
pub fn render_args(args: &[RemoteObject]) -> String {
    args.iter().map(render_arg).collect::<Vec<_>>().join(" ")
}

fn render_arg(arg: &RemoteObject) -> String {
    match (arg.kind.as_str(), &arg.value) {
        ("string", Some(Value::String(s))) => s.clone(),
        ("undefined", _) => "undefined".to_string(),
        (_, Some(Value::String(s))) => s.clone(),
        (_, Some(value)) => value.to_string(),
        (kind, None) => arg
            .unserializable_value
            .clone()
            .or_else(|| arg.description.clone())
            .unwrap_or_else(|| kind.to_string()),
    }
}
