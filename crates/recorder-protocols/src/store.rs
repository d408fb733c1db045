//! Persisted state protocol.
//!
//! State lives in a flat namespace of JSON documents. Reads and writes are
//! individually atomic, but a read followed by a write is not isolated from
//! other writers; callers that need read-modify-write correctness must route
//! all writes for a key through one owner.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;

/// Keys of the persisted namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StateKey {
    /// `bool`, default `false`.
    RecordingEnabled,
    /// `ActionRecord[]` for one capturing context, default `[]`.
    ActionLog(String),
    /// `Suggestion[]` for the active page, default `[]`.
    CurrentSuggestions,
    /// `PendingConfirmation[]`, default `[]`.
    PendingConfirmations,
    /// `bool`, set when the last log flush or snapshot failed.
    ServerError,
}

impl StateKey {
    pub fn as_key(&self) -> String {
        match self {
            StateKey::RecordingEnabled => "recording-enabled".to_string(),
            StateKey::ActionLog(context) => format!("action-log.{}", context),
            StateKey::CurrentSuggestions => "current-suggestions".to_string(),
            StateKey::PendingConfirmations => "pending-confirmations".to_string(),
            StateKey::ServerError => "server-error".to_string(),
        }
    }

    /// Whether `context` can name an action log.
    pub fn is_valid_context(context: &str) -> bool {
        !context.is_empty() && is_valid_key(&StateKey::ActionLog(context.to_string()).as_key())
    }
}

/// Keys are restricted to `[A-Za-z0-9._-]` and may not start with a dot, so
/// every key is also a plain file name.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Flat key/value JSON storage.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read a key. `None` if it was never written or has been removed.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the value of a key.
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Remove a key.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// All keys currently present.
    async fn keys(&self) -> Result<Vec<String>, StoreError>;
}
