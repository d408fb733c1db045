//! Sync error types.

use recorder_protocols::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Signal setup failed: {0}")]
    SignalSetup(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
