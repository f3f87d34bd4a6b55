//! Error types for result aggregation
//!
//! Provides the unified error type shared by all tally crates.

use thiserror::Error;

/// Core error type for merge, ratio and write operations
#[derive(Error, Debug)]
pub enum Error {
    /// Merge or ratio attempted on a value that holds no data
    #[error(
        "Unset payload: {0} does not contain any data yet; \
         use set_data() before applying any operations"
    )]
    UnsetPayload(String),

    /// Invalid composition or registry lookup
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Capability or output selector not provided by any stored payload
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    /// Two operands of different payload kinds
    #[error("Kind mismatch: expected {expected}, got {actual}")]
    KindMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// Invalid input data (shape or layout mismatch)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Malformed file content while reading an output back
    #[error("Parse error: {0}")]
    Parse(String),

    /// IO error (for file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error for an operand without data
    pub fn unset(what: &str) -> Self {
        Self::UnsetPayload(what.to_string())
    }

    /// Create an error for size mismatch
    pub fn size_mismatch(expected: usize, actual: usize, context: &str) -> Self {
        Self::InvalidInput(format!(
            "Size mismatch in {context}: expected {expected}, got {actual}"
        ))
    }

    /// Create an error for mismatching shapes
    pub fn shape_mismatch(expected: &[usize], actual: &[usize], context: &str) -> Self {
        Self::InvalidInput(format!(
            "Shape mismatch in {context}: expected {expected:?}, got {actual:?}"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::unset("array payload");
        assert_eq!(
            err.to_string(),
            "Unset payload: array payload does not contain any data yet; \
             use set_data() before applying any operations"
        );

        let err = Error::Configuration("unknown payload kind 'mesh'".to_string());
        assert_eq!(err.to_string(), "Configuration error: unknown payload kind 'mesh'");

        let err = Error::UnknownAttribute("spacing".to_string());
        assert_eq!(err.to_string(), "Unknown attribute: spacing");

        let err = Error::KindMismatch {
            expected: "array",
            actual: "image",
        };
        assert_eq!(err.to_string(), "Kind mismatch: expected array, got image");
    }

    #[test]
    fn test_error_helper_functions() {
        let err = Error::size_mismatch(2, 3, "composite members");
        assert_eq!(
            err.to_string(),
            "Invalid input: Size mismatch in composite members: expected 2, got 3"
        );

        let err = Error::shape_mismatch(&[2, 2], &[4], "array add");
        assert_eq!(
            err.to_string(),
            "Invalid input: Shape mismatch in array add: expected [2, 2], got [4]"
        );
    }

    #[test]
    fn test_error_from_io_error() {
        use std::io;

        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        match err {
            Error::Io(_) => assert!(err.to_string().contains("file not found")),
            _ => panic!("Wrong error type"),
        }
    }

    #[test]
    fn test_error_from_anyhow() {
        let err: Error = anyhow::anyhow!("custom error message").into();
        assert!(matches!(err, Error::Other(_)));
        assert!(err.to_string().contains("custom error message"));
    }
}
