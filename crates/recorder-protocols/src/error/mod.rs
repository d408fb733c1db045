//! Error types for the protocol layer.

mod backend;
mod store;

pub use backend::*;
pub use store::*;
