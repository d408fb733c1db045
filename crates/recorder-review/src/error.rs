//! Review workflow errors.

use recorder_protocols::{BackendError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReviewError {
    /// The index now holds a different field than the caller expected.
    #[error("Field mismatch at index {idx}: expected '{expected}', found '{found}'")]
    FieldMismatch {
        idx: usize,
        expected: String,
        found: String,
    },

    #[error("Invalid suggestion index {idx} (batch has {len})")]
    InvalidIndex { idx: usize, len: usize },

    #[error("Unknown review action: {0}")]
    UnknownAction(String),

    #[error("Malformed review message: {0}")]
    MalformedMessage(String),

    #[error("Review session for index {0} is already closed")]
    SessionClosed(usize),

    #[error("No suggestion marker at this element")]
    NoMarker,

    #[error("The origin page stopped listening")]
    OriginGone,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

pub type Result<T> = std::result::Result<T, ReviewError>;
