//! Error types for GifTrim.

use thiserror::Error;

/// Main error type for GifTrim operations.
#[derive(Error, Debug)]
pub enum GifTrimError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for GifTrim operations.
pub type Result<T> = std::result::Result<T, GifTrimError>;
