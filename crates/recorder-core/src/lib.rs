//! # Recorder Core
//!
//! Page-side machinery of the recorder:
//!
//! - [`dom`] - arena DOM with HTML import and serialization
//! - [`locator`] - element locators (`//*[@id="x"]`, `/html/body/div[2]`)
//! - [`recorder`] - turns DOM events into persisted action records
//! - [`state`] - typed persisted state over memory or file stores
//! - [`http`] - the JSON/HTTP [`Backend`](recorder_protocols::Backend)

pub mod dom;
pub mod error;
pub mod http;
pub mod locator;
pub mod page;
pub mod recorder;
pub mod snapshot;
pub mod state;

pub use dom::{Document, NodeId};
pub use error::{LocatorError, RecorderError};
pub use http::HttpBackend;
pub use locator::{Locator, PathStep, locate, resolve};
pub use page::{DomEvent, Page, ReadyState};
pub use recorder::EventRecorder;
pub use snapshot::{SnapshotBody, SnapshotGate};
pub use state::{FileStateStore, MemoryStateStore, PersistedState};
