//! Error types for recording and locator resolution.

use recorder_protocols::{BackendError, StoreError};
use thiserror::Error;

use crate::dom::NodeId;

/// Locator parsing and resolution failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocatorError {
    #[error("Malformed locator: {0}")]
    Malformed(String),

    #[error("No element matches locator {0}")]
    NotFound(String),
}

/// Errors raised while capturing or flushing actions.
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Event target {0:?} is not an element of the page")]
    UnknownTarget(NodeId),
}

pub type Result<T> = std::result::Result<T, RecorderError>;
