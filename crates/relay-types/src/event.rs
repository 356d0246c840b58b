//! The raw event envelope delivered by the transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// One inbound gateway event: a `type` tag plus a payload whose shape
/// depends on that tag.
///
/// This is the only wire contract the translator depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RawEvent {
    /// Event type tag, e.g. `GUILD_CREATE`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Event payload.
    #[serde(default)]
    pub data: Value,
}

impl RawEvent {
    /// Build an event from a type tag and payload.
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_wire_shape() {
        let event: Result<RawEvent, _> =
            serde_json::from_value(json!({"type": "GUILD_CREATE", "data": {"id": "1"}}));
        let event = event.ok();
        assert_eq!(
            event,
            Some(RawEvent::new("GUILD_CREATE", json!({"id": "1"})))
        );
    }

    #[test]
    fn missing_data_defaults_to_null() {
        let event: Result<RawEvent, _> = serde_json::from_str(r#"{"type":"RESUMED"}"#);
        assert_eq!(event.ok().map(|e| e.data), Some(Value::Null));
    }
}
