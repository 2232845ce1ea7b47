//! Core system types and foundations
//!
//! Error handling, configuration and logging setup shared by the storage,
//! pagination and API layers.

pub mod error;
pub mod config;
pub mod logging;

// Re-export commonly used items
pub use error::{Error, Result};
pub use config::Config;
