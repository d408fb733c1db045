//! Suggestion batch decoding.
//!
//! The service answers `suggest_inputs` with either a JSON array or an
//! object whose `raw` member holds the array as a JSON string. Anything else
//! decodes to an empty batch.

use recorder_protocols::Suggestion;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// A decoded batch with request timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestOutcome {
    pub suggestions: Vec<Suggestion>,
    /// Time spent waiting on the service.
    pub server_duration_ms: u64,
    /// Time from issuing the request to the batch being stored.
    pub total_request_duration_ms: u64,
}

/// Decode a `suggest_inputs` reply, recovering from malformed payloads.
pub fn parse_batch(reply: Value) -> Vec<Suggestion> {
    let items = match reply {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("raw") {
            Some(Value::String(raw)) => match serde_json::from_str(&raw) {
                Ok(Value::Array(items)) => items,
                Ok(_) => {
                    warn!("Suggestion batch 'raw' is not an array");
                    return Vec::new();
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse suggestion batch 'raw'");
                    return Vec::new();
                }
            },
            Some(Value::Array(items)) => items,
            _ => {
                warn!("Suggestion batch has no usable 'raw' member");
                return Vec::new();
            }
        },
        _ => {
            warn!("Suggestion batch is not an array");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .map(|item| match serde_json::from_value::<Suggestion>(item) {
            Ok(suggestion) => suggestion,
            Err(e) => {
                // Keep the slot so later indices still line up with the page.
                warn!(error = %e, "Malformed suggestion entry");
                Suggestion::default()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_array_reply() {
        let batch = parse_batch(json!([
            {"id": "email", "name": "email", "type": "email", "range": "", "examples": []},
            {"id": "age", "range": "18-99", "examples": [18, 42]}
        ]));
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].field_id, "email");
        assert_eq!(batch[1].good_examples, vec!["18", "42"]);
    }

    #[test]
    fn test_raw_reply() {
        let batch = parse_batch(json!({"raw": "[{\"id\": \"q\", \"range\": \"search text\"}]"}));
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].description, "search text");
    }

    #[test]
    fn test_raw_not_json() {
        assert!(parse_batch(json!({"raw": "```json\n[oops"})).is_empty());
    }

    #[test]
    fn test_raw_not_array() {
        assert!(parse_batch(json!({"raw": "{\"id\": \"q\"}"})).is_empty());
    }

    #[test]
    fn test_other_shapes() {
        assert!(parse_batch(json!({"error": "model failed"})).is_empty());
        assert!(parse_batch(json!("plain text")).is_empty());
        assert!(parse_batch(Value::Null).is_empty());
    }

    #[test]
    fn test_non_object_entry_keeps_its_slot() {
        let batch = parse_batch(json!(["junk", {"id": "b"}]));
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], Suggestion::default());
        assert_eq!(batch[1].field_id, "b");
    }
}
