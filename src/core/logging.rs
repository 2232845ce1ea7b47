//! Tracing subscriber setup
//!
//! The level comes from [`LoggingConfig`] and is handed to the subscriber
//! once at startup. `RUST_LOG`, when set, wins over the configured level.

use crate::core::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Build the filter for the configured level
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Install the global tracing subscriber
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init(config: &LoggingConfig) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_target(false)
        .try_init();
}
