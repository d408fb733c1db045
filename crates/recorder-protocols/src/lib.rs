//! # Recorder Protocols
//!
//! Shared data model and interface definitions for the page recorder and the
//! suggestion review workflow. Contains only types and traits - no
//! implementations.
//!
//! ## Core Traits
//!
//! - [`Backend`] - The remote suggestion/recording service
//! - [`StateStore`] - Process-wide persisted key/value state

pub mod action;
pub mod backend;
pub mod error;
pub mod store;
pub mod suggestion;

pub use action::{
    ActionKind, ActionRecord, Coordinates, ExpectedValueSource, SuggestionEventDetails,
    TargetInfo, VerificationCommand, VerificationDetails,
};
pub use backend::{Backend, PageSnapshot, UpdateSuggestionRequest, UpdateSuggestionResponse};
pub use error::{BackendError, StoreError};
pub use store::{StateKey, StateStore, is_valid_key};
pub use suggestion::{FieldIdentity, PendingConfirmation, Suggestion, SuggestionEdit, SuggestionOrigin};

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
