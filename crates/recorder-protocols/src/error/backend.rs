//! Backend transport errors.

use thiserror::Error;

/// Failure talking to the remote service.
///
/// Every variant is a transport failure from the caller's point of view;
/// callers decide how to degrade (retry queue, failed marker, or a visible
/// error) based on which operation failed, not on the variant.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),
}

impl BackendError {
    /// HTTP status code if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
