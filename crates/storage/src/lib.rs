//! Task sources for vigil.
//!
//! The task store itself lives elsewhere; this crate defines the traits the
//! monitor reads through, plus an in-memory and a JSON-file implementation.

#![warn(missing_docs)]

pub mod trait_;
pub mod memory;
pub mod json_storage;

pub use trait_::{dependents_of, DependencyResolver, Result, StorageError, TaskSnapshotProvider};
pub use memory::InMemoryTaskStore;
pub use json_storage::JsonTaskSnapshot;
