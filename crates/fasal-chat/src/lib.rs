//! fasal-chat: Chat session state and request lifecycle
//!
//! This crate owns the conversation shown to the user and drives one
//! streaming request at a time through a [`ChatTransport`], publishing
//! [`ChatEvent`]s as the reply grows.

pub mod accumulator;
pub mod conversation;
pub mod error;
pub mod events;
pub mod handle;
pub mod notice;
pub mod session;
pub mod transport;
pub mod turn;

pub use accumulator::StreamAccumulator;
pub use conversation::{ChatState, RequestPhase};
pub use error::{Error, Result};
pub use events::ChatEvent;
pub use handle::ChatHandle;
pub use notice::{Notice, NoticeLevel};
pub use session::{ChatSession, SubmitOutcome};
pub use transport::{ChatTransport, HttpTransport};
pub use turn::{Role, Turn};
