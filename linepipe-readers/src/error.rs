//! Error types for file-backed stores

use thiserror::Error;

/// Error type for file-backed stores
#[derive(Error, Debug)]
pub enum Error {
    /// Core library error
    #[error("Core error: {0}")]
    Core(#[from] linepipe_core::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV format error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type for file-backed stores
pub type Result<T> = std::result::Result<T, Error>;

// Store implementations surface core errors; reader-specific failures fold
// into the closest core variant.
impl From<Error> for linepipe_core::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Core(e) => e,
            Error::Io(e) => linepipe_core::Error::Io(e),
            Error::Csv(e) => linepipe_core::Error::Decode(e.to_string()),
            Error::InvalidArgument(message) => linepipe_core::Error::InvalidArgument(message),
        }
    }
}
