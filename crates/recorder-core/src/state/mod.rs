//! Persisted state: key/value stores and a typed view over them.

mod file;
mod memory;
mod persisted;

pub use file::FileStateStore;
pub use memory::MemoryStateStore;
pub use persisted::PersistedState;

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
