//! Error types for akita-hyper

use std::io;
use thiserror::Error;

/// Result type for akita-hyper operations
pub type Result<T> = std::result::Result<T, AkitaError>;

/// Boxed error raised by the application under test
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur in akita-hyper
#[derive(Debug, Error)]
pub enum AkitaError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Request could not be built from the given parts
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The application under test returned an error instead of a response
    #[error("Application error: {0}")]
    Application(#[source] BoxError),

    /// The response body could not be read
    #[error("Failed to read body: {0}")]
    Body(String),

    /// Response body too large
    #[error("Data too large: {size} bytes exceeds limit of {limit} bytes")]
    DataTooLarge {
        /// Actual size
        size: usize,
        /// Size limit
        limit: usize,
    },

    /// HAR writer was already closed
    #[error("HAR writer already closed")]
    WriterClosed,

    /// Collector failed to accept an exchange
    #[error("Collector error: {0}")]
    Collector(String),
}
