//! # Recorder Review
//!
//! Human review of per-field input suggestions:
//!
//! - [`SuggestionStore`] - the persisted batch, two-phase edits, identity checks
//! - [`MarkerBoard`] - per-field markers and their state
//! - [`ReviewMessage`] - the closed set of messages between page and review surface
//! - [`ReviewSession`] - one review surface's state machine
//! - [`OriginCoordinator`] - the page side of the exchange
//! - [`ReviewSurface`] - the review side of the exchange

pub mod batch;
pub mod coordinator;
pub mod error;
pub mod marker;
pub mod message;
pub mod session;
pub mod store;
pub mod surface;

#[cfg(test)]
mod test_support;

pub use batch::{SuggestOutcome, parse_batch};
pub use coordinator::OriginCoordinator;
pub use error::ReviewError;
pub use marker::{Marker, MarkerBoard, MarkerState};
pub use message::{ReviewMessage, UpdateOutcome};
pub use session::{EditedFields, ReviewSession, SessionState, SubmitWait};
pub use store::SuggestionStore;
pub use surface::ReviewSurface;
