//! Error types and handling for the JSON file server
//!
//! Each layer has its own error enum. Everything a request can hit is folded
//! into [`ResourceError`] at the facade boundary, which knows the HTTP status
//! it maps to. [`Error`] covers configuration and startup.

use std::path::PathBuf;
use thiserror::Error;

/// Main result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Startup and configuration errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors from std
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a collection store
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing file could not be read or written
    #[error("cannot access {path:?}: {source}")]
    Io {
        /// Backing file path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The backing file is not a JSON array of objects
    #[error("cannot parse {path:?}: {source}")]
    Parse {
        /// Backing file path
        path: PathBuf,
        /// Underlying error
        source: serde_json::Error,
    },

    /// The collection could not be serialized back to JSON
    #[error("cannot encode collection: {0}")]
    Encode(#[source] serde_json::Error),

    /// Replace/patch submitted without an identity value
    #[error("no '{field}' in item")]
    MissingIdentity {
        /// Name of the identity field
        field: String,
    },

    /// No record carries the requested identity
    #[error("Object with id {0} not found")]
    NotFound(String),
}

/// Malformed client-supplied pagination parameters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageRequestError {
    /// `page` is not a valid page number
    #[error("invalid 'page' parameter [{0}]")]
    InvalidPage(String),

    /// `size` is not a positive integer
    #[error("invalid 'size' parameter [{0}]")]
    InvalidSize(String),
}

/// Outcome of a failed resource operation
#[derive(Error, Debug)]
pub enum ResourceError {
    /// Store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Bad pagination parameters
    #[error(transparent)]
    PageRequest(#[from] PageRequestError),

    /// Request body is not a single JSON object
    #[error("invalid request body: {0}")]
    InvalidBody(#[source] serde_json::Error),

    /// Verb not served on this path
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    /// The blocking task running the operation did not complete
    #[error("request task failed: {0}")]
    Task(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Parse { path: path.into(), source }
    }
}

impl ResourceError {
    /// HTTP status code this error is reported with
    pub fn status(&self) -> u16 {
        match self {
            ResourceError::Store(StoreError::NotFound(_)) => 404,
            ResourceError::Store(StoreError::MissingIdentity { .. }) => 400,
            ResourceError::Store(_) => 500,
            ResourceError::PageRequest(_) => 400,
            ResourceError::InvalidBody(_) => 400,
            ResourceError::MethodNotAllowed => 405,
            ResourceError::Task(_) => 500,
        }
    }

    /// Check if this is a server error (5xx equivalent)
    pub fn is_server_error(&self) -> bool {
        self.status() >= 500
    }

    /// Message carried in the `{status, message}` error body
    pub fn message(&self) -> String {
        if self.is_server_error() {
            format!("Internal server error {}", self)
        } else {
            self.to_string()
        }
    }
}
