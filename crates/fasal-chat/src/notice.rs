//! User-facing notices

use fasal_stream::ErrorKind;
use serde::{Deserialize, Serialize};

use crate::error::Error;

pub const RATE_LIMITED_MESSAGE: &str = "Rate limit exceeded. Please try again in a moment.";
pub const PAYMENT_REQUIRED_MESSAGE: &str = "AI service requires payment. Please contact administrator.";
pub const TRANSPORT_MESSAGE: &str = "Failed to get response. Please try again.";
pub const CLEARED_MESSAGE: &str = "Chat history cleared";
pub const COPIED_MESSAGE: &str = "Response copied to clipboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A short message shown to the user outside the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// The notice shown when a request fails with `kind`
    pub fn for_kind(kind: ErrorKind) -> Self {
        Self::error(match kind {
            ErrorKind::RateLimited => RATE_LIMITED_MESSAGE,
            ErrorKind::PaymentRequired => PAYMENT_REQUIRED_MESSAGE,
            ErrorKind::Transport => TRANSPORT_MESSAGE,
        })
    }

    pub fn for_error(error: &Error) -> Self {
        Self::for_kind(error.kind())
    }

    pub fn cleared() -> Self {
        Self::success(CLEARED_MESSAGE)
    }

    pub fn copied() -> Self {
        Self::success(COPIED_MESSAGE)
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_notices() {
        let notice = Notice::for_error(&Error::from(fasal_stream::Error::from_status(429, "")));
        assert!(notice.is_error());
        assert_eq!(notice.message, "Rate limit exceeded. Please try again in a moment.");

        let notice = Notice::for_error(&Error::from(fasal_stream::Error::from_status(402, "")));
        assert_eq!(notice.message, "AI service requires payment. Please contact administrator.");

        let notice = Notice::for_error(&Error::from(fasal_stream::Error::from_status(500, "")));
        assert_eq!(notice.message, "Failed to get response. Please try again.");

        let notice = Notice::for_error(&Error::from(fasal_stream::Error::MissingBody));
        assert_eq!(notice.message, TRANSPORT_MESSAGE);
    }

    #[test]
    fn test_success_notices() {
        assert_eq!(Notice::cleared().message, "Chat history cleared");
        assert_eq!(Notice::copied().message, "Response copied to clipboard");
        assert!(!Notice::copied().is_error());
    }
}
