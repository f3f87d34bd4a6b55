//! Error types for statistics aggregation and reporting

use thiserror::Error;

/// Error type for the statistics aggregator
#[derive(Error, Debug)]
pub enum Error {
    /// A stored field has a value of the wrong type
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// Invalid encoder, unit category or output configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (for file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;
