//! Error types for AlphaKey.

use thiserror::Error;

/// Main error type for frame and stream handling.
#[derive(Error, Debug)]
pub enum AlphaKeyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
}

/// Result type alias for AlphaKey operations.
pub type Result<T> = std::result::Result<T, AlphaKeyError>;
