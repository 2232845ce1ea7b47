//! JSON File Server - a mock REST backend over JSON files
//!
//! Each configured route exposes one JSON file holding an array of objects
//! as a collection: list (optionally paginated), fetch by id, create,
//! replace and patch. The file is the only state; it is re-read on every
//! request and rewritten on every mutation.
#![warn(missing_docs)]

// Core foundational modules
pub mod core;

// Main functional modules
pub mod storage;
pub mod pagination;
pub mod resource;
pub mod api;

// Re-export commonly used items for convenience
pub use core::{Config, Error, Result};

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
