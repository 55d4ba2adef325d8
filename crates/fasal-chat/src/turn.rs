//! A single entry of the conversation

use serde::{Deserialize, Serialize};

/// Who authored a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    /// Creation time in milliseconds since the epoch (display only)
    pub timestamp: i64,
}

impl Turn {
    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into())
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content.into())
    }

    /// Create the empty assistant turn that a streaming reply fills in
    pub fn assistant_placeholder() -> Self {
        Self::new(Role::Assistant, String::new())
    }

    fn new(role: Role, content: String) -> Self {
        Self {
            role,
            content,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    /// An assistant turn that has not received any text
    pub fn is_empty_placeholder(&self) -> bool {
        self.is_assistant() && self.content.is_empty()
    }
}
