//! Conversation state: turns, loading flag, request phase and generation.

use serde::{Deserialize, Serialize};

use crate::turn::Turn;

/// Where the current request is in its lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestPhase {
    /// No request in flight
    #[default]
    Idle,
    /// Request sent, waiting for the response status
    Sending,
    /// Response accepted, reading the body
    Streaming,
    /// The request failed; returns to Idle once it settles
    Error,
}

/// The ordered turns of one session plus request bookkeeping.
///
/// `generation` changes on every [`ChatState::clear`]; a request remembers the
/// generation it started in and must not write into a newer one.
#[derive(Debug, Default)]
pub struct ChatState {
    turns: Vec<Turn>,
    loading: bool,
    phase: RequestPhase,
    generation: u64,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// All turns in display order
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Append a turn, returning its position
    pub fn append_turn(&mut self, turn: Turn) -> usize {
        self.turns.push(turn);
        self.turns.len() - 1
    }

    /// Replace the content of the last turn if it is an assistant turn
    pub fn replace_last_turn(&mut self, content: impl Into<String>) -> bool {
        match self.turns.last_mut() {
            Some(turn) if turn.is_assistant() => {
                turn.content = content.into();
                true
            }
            _ => false,
        }
    }

    /// Remove the last turn if it is an assistant turn without text
    pub fn prune_empty_placeholder(&mut self) -> bool {
        if self.turns.last().is_some_and(Turn::is_empty_placeholder) {
            self.turns.pop();
            true
        } else {
            false
        }
    }

    /// Drop every turn and start a new generation
    pub fn clear(&mut self) -> u64 {
        self.turns.clear();
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn phase(&self) -> RequestPhase {
        self.phase
    }

    pub fn set_phase(&mut self, phase: RequestPhase) {
        self.phase = phase;
    }

    /// Assistant turns that hold text, in order
    pub fn assistant_replies(&self) -> impl Iterator<Item = &Turn> {
        self.turns
            .iter()
            .filter(|turn| turn.is_assistant() && !turn.content.is_empty())
    }

    /// The `n`th (1-based) non-empty assistant reply
    pub fn assistant_reply(&self, n: usize) -> Option<&Turn> {
        n.checked_sub(1)
            .and_then(|index| self.assistant_replies().nth(index))
    }

    /// The most recent non-empty assistant reply
    pub fn last_assistant_reply(&self) -> Option<&Turn> {
        self.assistant_replies().last()
    }
}
