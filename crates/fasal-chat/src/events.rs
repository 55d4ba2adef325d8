//! Chat event types

use fasal_stream::{ErrorKind, StreamEnd};
use serde::{Deserialize, Serialize};

use crate::conversation::RequestPhase;
use crate::notice::Notice;

/// Events emitted while a session handles requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A user turn was appended and the request is being sent
    RequestStart { message: String },

    /// The request lifecycle moved to a new phase
    PhaseChanged { phase: RequestPhase },

    /// The endpoint accepted the request; an empty assistant turn was appended
    AssistantStart,

    /// The assistant turn now holds `content` (full text so far)
    AssistantUpdate { content: String },

    /// The reply completed
    AssistantEnd { content: String, end: StreamEnd },

    /// The request failed
    Failed { kind: ErrorKind, message: String },

    /// The request was aborted by the user; `content` is what was kept
    Aborted { content: String },

    /// The conversation was cleared
    Cleared,

    /// Something to show the user
    Notice(Notice),
}
