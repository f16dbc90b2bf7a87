//! The default in-process storage backend.
//!
//! Keeps every table in persistent maps so a transaction snapshot is a cheap
//! structural share, not a deep copy.

mod store;

pub use store::InMemoryCoordinator;
