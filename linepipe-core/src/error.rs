//! Error types for dataset pipelines

use std::io;
use thiserror::Error;

/// Result type for dataset pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for dataset pipeline operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Index out of bounds
    #[error("index {index} out of range for length {len}")]
    IndexOutOfBounds {
        /// The requested index
        index: usize,
        /// The length of the container
        len: usize,
    },

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Record shape mismatch
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Malformed data while decoding a record
    #[error("Decode error: {0}")]
    Decode(String),

    /// Source exhausted (no more data)
    #[error("Source exhausted")]
    SourceExhausted,
}
