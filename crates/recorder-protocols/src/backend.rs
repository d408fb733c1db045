//! Remote service protocol.
//!
//! The service is a JSON-over-HTTP API with a fixed base path. Each call is a
//! single request/response; nothing here retries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::ActionRecord;
use crate::error::BackendError;
use crate::suggestion::{PendingConfirmation, SuggestionEdit};

/// Body of `POST /update_input_suggestion`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSuggestionRequest {
    pub field: String,
    pub range: String,
    pub examples: Vec<String>,
    pub bad_examples: Vec<String>,
}

impl UpdateSuggestionRequest {
    pub fn new(field: impl Into<String>, edit: &SuggestionEdit) -> Self {
        Self {
            field: field.into(),
            range: edit.description.clone(),
            examples: edit.examples.clone(),
            bad_examples: edit.bad_examples.clone(),
        }
    }
}

/// Reply to `POST /update_input_suggestion`.
///
/// An absent field means "keep the local value".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateSuggestionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_examples: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_bad_examples: Option<Vec<String>>,
}

impl UpdateSuggestionResponse {
    /// True when the server returned nothing to overwrite.
    pub fn is_empty(&self) -> bool {
        self.range.is_none() && self.new_examples.is_none() && self.new_bad_examples.is_none()
    }
}

/// Body of `POST /snapshot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub event_type: String,
    pub time: i64,
    pub url: String,
    pub html: String,
    pub css: String,
    #[serde(default)]
    pub event: Option<ActionRecord>,
}

/// The remote authority for suggestions, confirmations and recorded logs.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `POST /suggest_inputs`. Returns the raw reply; the caller decides how
    /// to recover from a malformed batch.
    async fn suggest_inputs(&self, html: &str) -> Result<Value, BackendError>;

    /// `POST /update_input_suggestion`.
    async fn update_input_suggestion(
        &self,
        request: &UpdateSuggestionRequest,
    ) -> Result<UpdateSuggestionResponse, BackendError>;

    /// `POST /confirm_suggestion`. Any 2xx reply is an acknowledgement.
    async fn confirm_suggestion(&self, confirmation: &PendingConfirmation)
        -> Result<(), BackendError>;

    /// `POST /events`.
    async fn post_events(&self, events: &[ActionRecord]) -> Result<(), BackendError>;

    /// `POST /snapshot`.
    async fn post_snapshot(&self, snapshot: &PageSnapshot) -> Result<(), BackendError>;
}
