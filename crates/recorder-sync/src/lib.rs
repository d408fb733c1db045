//! # Recorder Sync
//!
//! Delivers suggestion confirmations that failed inline. Failed items stay in
//! the persisted queue and are retried one at a time on a fixed schedule.

mod daemon;
mod error;
mod signal;

pub use daemon::{DrainReport, SyncDaemon};
pub use error::SyncError;
pub use signal::ShutdownSignal;
