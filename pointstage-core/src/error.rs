//! Error types for pointstage

use thiserror::Error;

/// Main error type for pointstage operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not enough memory: {0}")]
    OutOfMemory(String),

    #[error("Stage error: {0}")]
    Stage(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Result type alias for pointstage operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::collections::TryReserveError> for Error {
    fn from(e: std::collections::TryReserveError) -> Self {
        Error::OutOfMemory(e.to_string())
    }
}
