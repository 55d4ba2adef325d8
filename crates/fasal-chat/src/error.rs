//! Error types for fasal-chat

use fasal_stream::ErrorKind;
use thiserror::Error;

/// Result type alias using fasal-chat Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can end a chat request
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the streaming transport
    #[error(transparent)]
    Stream(#[from] fasal_stream::Error),
}

impl Error {
    /// Classify this error for the user-facing notice
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Stream(e) => e.kind(),
        }
    }

    /// Whether sending the same message again may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Stream(e) => e.is_retryable(),
        }
    }
}
