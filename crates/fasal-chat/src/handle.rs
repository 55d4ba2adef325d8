//! A cloneable handle for poking the session from UI code.

use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::sync::{Notify, broadcast};
use tokio_util::sync::CancellationToken;

use crate::{
    conversation::{ChatState, RequestPhase},
    events::ChatEvent,
    notice::Notice,
    turn::Turn,
};

/// A cloneable handle for poking the session from external code.
///
/// All fields are `Arc`-wrapped, so cloning is cheap. The state lock is only
/// ever held for short, non-async sections.
#[derive(Clone)]
pub struct ChatHandle {
    pub(crate) state: Arc<Mutex<ChatState>>,
    pub(crate) cancel: Arc<Mutex<CancellationToken>>,
    pub(crate) in_flight: Arc<AtomicBool>,
    pub(crate) idle_notify: Arc<Notify>,
    pub(crate) event_tx: broadcast::Sender<ChatEvent>,
}

impl ChatHandle {
    pub(crate) fn new() -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            state: Arc::new(Mutex::new(ChatState::new())),
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
            in_flight: Arc::new(AtomicBool::new(false)),
            idle_notify: Arc::new(Notify::new()),
            event_tx,
        }
    }

    pub(crate) fn emit(&self, event: ChatEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.event_tx.subscribe()
    }

    /// Abort the in-flight request, keeping any text already received.
    pub fn abort(&self) {
        self.cancel.lock().cancel();
    }

    /// Empty the conversation and cancel the in-flight request.
    ///
    /// Fragments that arrive for the cancelled request are dropped.
    pub fn clear(&self) {
        let generation = self.state.lock().clear();
        self.cancel.lock().cancel();
        tracing::debug!(generation, "Conversation cleared");
        self.emit(ChatEvent::Cleared);
        self.emit(ChatEvent::Notice(Notice::cleared()));
    }

    /// Whether a request is in flight.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().is_loading()
    }

    pub fn phase(&self) -> RequestPhase {
        self.state.lock().phase()
    }

    /// Snapshot of the conversation
    pub fn turns(&self) -> Vec<Turn> {
        self.state.lock().turns().to_vec()
    }

    /// Text of the `n`th (1-based) assistant reply, or the latest when `None`
    pub fn reply_text(&self, n: Option<usize>) -> Option<String> {
        let state = self.state.lock();
        let turn = match n {
            Some(n) => state.assistant_reply(n),
            None => state.last_assistant_reply(),
        };
        turn.map(|turn| turn.content.clone())
    }

    /// Wait until no request is in flight.
    pub async fn wait_for_idle(&self) {
        let notified = self.idle_notify.notified();
        if !self.is_in_flight() {
            return;
        }
        notified.await;
    }
}

/// Marks a request as in flight for as long as it lives.
///
/// Dropping it on any exit path resets loading, returns the phase to Idle and
/// frees the session for the next request.
pub(crate) struct InFlightGuard {
    handle: ChatHandle,
}

impl InFlightGuard {
    /// Claim the session, or `None` if a request is already in flight
    pub(crate) fn acquire(handle: &ChatHandle) -> Option<Self> {
        handle
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self {
            handle: handle.clone(),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        {
            let mut state = self.handle.state.lock();
            state.set_loading(false);
            state.set_phase(RequestPhase::Idle);
        }
        self.handle.in_flight.store(false, Ordering::Release);
        self.handle.emit(ChatEvent::PhaseChanged {
            phase: RequestPhase::Idle,
        });
        self.handle.idle_notify.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_is_exclusive() {
        let handle = ChatHandle::new();
        let guard = InFlightGuard::acquire(&handle).unwrap();
        assert!(handle.is_in_flight());
        assert!(InFlightGuard::acquire(&handle).is_none());

        drop(guard);
        assert!(!handle.is_in_flight());
        assert!(InFlightGuard::acquire(&handle).is_some());
    }

    #[test]
    fn test_guard_drop_resets_state() {
        let handle = ChatHandle::new();
        let mut rx = handle.subscribe();
        {
            let _guard = InFlightGuard::acquire(&handle).unwrap();
            let mut state = handle.state.lock();
            state.set_loading(true);
            state.set_phase(RequestPhase::Error);
        }
        assert!(!handle.is_loading());
        assert_eq!(handle.phase(), RequestPhase::Idle);
        assert_eq!(
            rx.try_recv().unwrap(),
            ChatEvent::PhaseChanged {
                phase: RequestPhase::Idle
            }
        );
    }

    #[test]
    fn test_clear_cancels_and_notifies() {
        let handle = ChatHandle::new();
        let token = handle.cancel.lock().clone();
        handle.state.lock().append_turn(Turn::user("Q"));
        let mut rx = handle.subscribe();

        handle.clear();

        assert!(token.is_cancelled());
        assert!(handle.turns().is_empty());
        assert_eq!(rx.try_recv().unwrap(), ChatEvent::Cleared);
        assert_eq!(rx.try_recv().unwrap(), ChatEvent::Notice(Notice::cleared()));
    }

    #[test]
    fn test_reply_text() {
        let handle = ChatHandle::new();
        assert!(handle.reply_text(None).is_none());
        {
            let mut state = handle.state.lock();
            state.append_turn(Turn::user("Q1"));
            state.append_turn(Turn::assistant("A1"));
            state.append_turn(Turn::user("Q2"));
            state.append_turn(Turn::assistant("A2"));
        }
        assert_eq!(handle.reply_text(None).as_deref(), Some("A2"));
        assert_eq!(handle.reply_text(Some(1)).as_deref(), Some("A1"));
        assert!(handle.reply_text(Some(5)).is_none());
    }

    #[tokio::test]
    async fn test_wait_for_idle_when_idle() {
        let handle = ChatHandle::new();
        handle.wait_for_idle().await;
    }
}
