//! Error types for fasal-stream

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using fasal-stream Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while requesting or reading a chat response
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request or body read failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered 429
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Endpoint answered 402
    #[error("Payment required")]
    PaymentRequired,

    /// Endpoint answered some other non-success status
    #[error("Failed to get response: {status}")]
    Status { status: u16, body: String },

    /// Endpoint answered success without a readable body
    #[error("No response body")]
    MissingBody,

    /// Transport failure not originating from reqwest
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid client configuration (endpoint, credential)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse classification used to pick the user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// HTTP 429
    RateLimited,
    /// HTTP 402
    PaymentRequired,
    /// Everything else: other statuses, network and read failures
    Transport,
}

impl Error {
    /// Map an unsuccessful HTTP status to an error
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        match status {
            429 => Error::RateLimited,
            402 => Error::PaymentRequired,
            _ => Error::Status {
                status,
                body: body.into(),
            },
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::RateLimited => ErrorKind::RateLimited,
            Error::PaymentRequired => ErrorKind::PaymentRequired,
            _ => ErrorKind::Transport,
        }
    }

    /// Whether the user can reasonably try the same request again
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::RateLimited
            | Error::Http(_)
            | Error::Status { .. }
            | Error::MissingBody
            | Error::Transport(_) => true,
            Error::PaymentRequired | Error::InvalidConfig(_) => false,
        }
    }
}
