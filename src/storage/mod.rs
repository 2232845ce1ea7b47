//! Storage and persistence layer
//!
//! Collections live in JSON files on disk; this module reads, searches and
//! rewrites them.

pub mod collection;
pub mod locks;

// Re-export main storage types
pub use collection::{identity_string, CollectionStore, Record};
pub use locks::FileLocks;
