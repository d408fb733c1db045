//! Per-field input suggestions and confirmation payloads.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Provenance of a suggestion's current values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionOrigin {
    /// As received in the most recent batch.
    #[default]
    Fetched,
    /// Reviewer-supplied values written before the server answered.
    Local,
    /// Values the server returned for a submitted edit.
    ServerConfirmed,
}

impl SuggestionOrigin {
    fn is_fetched(&self) -> bool {
        *self == SuggestionOrigin::Fetched
    }
}

/// Backend-proposed metadata for one form field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "id", default, deserialize_with = "lenient_string")]
    pub field_id: String,

    #[serde(rename = "name", default, deserialize_with = "lenient_string")]
    pub field_name: String,

    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub field_type: String,

    /// Description of the acceptable input range.
    #[serde(rename = "range", default, deserialize_with = "lenient_string")]
    pub description: String,

    #[serde(rename = "examples", default, deserialize_with = "lenient_list")]
    pub good_examples: Vec<String>,

    #[serde(default, deserialize_with = "lenient_list")]
    pub bad_examples: Vec<String>,

    #[serde(default, skip_serializing_if = "SuggestionOrigin::is_fetched")]
    pub origin: SuggestionOrigin,
}

impl Suggestion {
    pub fn new(field_id: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            field_name: field_name.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, field_type: impl Into<String>) -> Self {
        self.field_type = field_type.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_examples(mut self, examples: Vec<String>) -> Self {
        self.good_examples = examples;
        self
    }

    /// Name used when talking to the backend about this field.
    pub fn field_label(&self) -> &str {
        if self.field_name.is_empty() {
            &self.field_id
        } else {
            &self.field_name
        }
    }
}

/// Accepts strings, numbers, booleans or null for a text field.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_to_string(Value::deserialize(deserializer)?).unwrap_or_default())
}

/// Accepts an array of scalars, a single scalar, or null.
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(scalar_to_string).collect(),
        Value::Null => Vec::new(),
        other => scalar_to_string(other).into_iter().collect(),
    })
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Identity a suggestion index was fetched for.
///
/// Indices are reused across batch refreshes, so every lookup or update by
/// index must also match the field's id or name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldIdentity {
    pub idx: usize,
    #[serde(rename = "id", default)]
    pub field_id: String,
    #[serde(rename = "name", default)]
    pub field_name: String,
    #[serde(rename = "type", default)]
    pub field_type: String,
}

impl FieldIdentity {
    pub fn new(idx: usize, field_id: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            idx,
            field_id: field_id.into(),
            field_name: field_name.into(),
            field_type: String::new(),
        }
    }

    pub fn of(idx: usize, suggestion: &Suggestion) -> Self {
        Self {
            idx,
            field_id: suggestion.field_id.clone(),
            field_name: suggestion.field_name.clone(),
            field_type: suggestion.field_type.clone(),
        }
    }

    /// Whether `suggestion` is the field this identity refers to.
    ///
    /// Ids are compared when both sides have one, otherwise names. An
    /// identity with neither id nor name matches anything.
    pub fn matches(&self, suggestion: &Suggestion) -> bool {
        self.matches_field(&suggestion.field_id, &suggestion.field_name)
    }

    /// Whether two identities address the same field at the same index.
    pub fn same_field(&self, other: &FieldIdentity) -> bool {
        self.idx == other.idx && self.matches_field(&other.field_id, &other.field_name)
    }

    fn matches_field(&self, field_id: &str, field_name: &str) -> bool {
        if !self.field_id.is_empty() && !field_id.is_empty() {
            return self.field_id == field_id;
        }
        if !self.field_name.is_empty() && !field_name.is_empty() {
            return self.field_name == field_name;
        }
        self.field_id.is_empty() && self.field_name.is_empty()
    }

    /// Name used when talking to the backend about this field.
    pub fn field_label(&self) -> &str {
        if self.field_name.is_empty() {
            &self.field_id
        } else {
            &self.field_name
        }
    }
}

/// Reviewer-supplied replacement values for a suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SuggestionEdit {
    #[serde(rename = "range", default)]
    pub description: String,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub bad_examples: Vec<String>,
}

impl SuggestionEdit {
    /// Split a newline-separated examples text box into trimmed, non-empty lines.
    pub fn parse_lines(text: &str) -> Vec<String> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// A confirmation that has not been acknowledged by the backend yet.
///
/// Resent verbatim on every drain; the payload carries no per-attempt
/// identifiers so the server can deduplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingConfirmation {
    pub field: String,
    #[serde(rename = "time")]
    pub timestamp_ms: i64,
    #[serde(rename = "url")]
    pub page_url: String,
    pub suggestion_index: usize,
    #[serde(rename = "suggestion")]
    pub payload: Suggestion,
}
