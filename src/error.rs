//! Error types for vod-media.

use std::io;
use thiserror::Error;

/// Result type for vod-media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for vod-media operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error while reading sample data.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Corrupt or truncated sample index.
    #[error("{0}")]
    Index(String),

    /// Invalid builder input or range request.
    #[error("{0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a sample-index decode error.
    pub fn index(msg: impl Into<String>) -> Self {
        Self::Index(msg.into())
    }

    /// Create an invalid-input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
