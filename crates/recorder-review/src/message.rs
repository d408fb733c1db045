//! Messages between the origin page and review surfaces.

use recorder_protocols::{FieldIdentity, Suggestion, SuggestionEdit};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, ReviewError};

/// How far a [`ReviewMessage::SuggestionUpdated`] value has travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpdateOutcome {
    /// Reviewer values written locally; the service has not answered.
    Optimistic,
    /// The service accepted the edit; the suggestion carries its values.
    ServerConfirmed,
    /// The service call failed; the local values were kept.
    Failed,
}

/// Review surface to origin: `CancelEdit`, `ConfirmEdit`, `SubmitEdit`.
/// Origin to review surfaces: `SuggestionUpdated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ReviewMessage {
    CancelEdit {
        #[serde(rename = "itemInfo")]
        item: FieldIdentity,
    },
    ConfirmEdit {
        #[serde(rename = "itemInfo")]
        item: FieldIdentity,
    },
    SubmitEdit {
        #[serde(rename = "itemInfo")]
        item: FieldIdentity,
        #[serde(rename = "data")]
        edit: SuggestionEdit,
    },
    SuggestionUpdated {
        #[serde(rename = "itemInfo")]
        item: FieldIdentity,
        suggestion: Suggestion,
        outcome: UpdateOutcome,
    },
}

const ACTIONS: [&str; 4] = ["cancelEdit", "confirmEdit", "submitEdit", "suggestionUpdated"];

impl ReviewMessage {
    pub fn item(&self) -> &FieldIdentity {
        match self {
            ReviewMessage::CancelEdit { item }
            | ReviewMessage::ConfirmEdit { item }
            | ReviewMessage::SubmitEdit { item, .. }
            | ReviewMessage::SuggestionUpdated { item, .. } => item,
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            ReviewMessage::CancelEdit { .. } => ACTIONS[0],
            ReviewMessage::ConfirmEdit { .. } => ACTIONS[1],
            ReviewMessage::SubmitEdit { .. } => ACTIONS[2],
            ReviewMessage::SuggestionUpdated { .. } => ACTIONS[3],
        }
    }

    /// Decode a message, rejecting unknown actions.
    pub fn parse(value: Value) -> Result<Self> {
        let action = match value.get("action") {
            Some(Value::String(action)) => action.clone(),
            Some(other) => return Err(ReviewError::UnknownAction(other.to_string())),
            None => return Err(ReviewError::MalformedMessage("missing 'action'".to_string())),
        };
        if !ACTIONS.contains(&action.as_str()) {
            return Err(ReviewError::UnknownAction(action));
        }
        serde_json::from_value(value).map_err(|e| ReviewError::MalformedMessage(e.to_string()))
    }
}
