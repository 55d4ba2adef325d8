//! Request lifecycle: send a message, stream the reply into the conversation

use std::sync::Arc;

use fasal_stream::{StreamEnd, StreamEvent, delta_events};
use futures::StreamExt;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    accumulator::StreamAccumulator,
    conversation::RequestPhase,
    error::{Error, Result},
    events::ChatEvent,
    handle::{ChatHandle, InFlightGuard},
    notice::Notice,
    transport::ChatTransport,
    turn::Turn,
};

/// How a call to [`ChatSession::submit`] settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The input was blank; nothing happened
    Empty,
    /// Another request is in flight; nothing happened
    Busy,
    /// The reply streamed to completion
    Completed { reply: String, end: StreamEnd },
    /// The user aborted; `reply` is the text that was kept
    Aborted { reply: String },
    /// The conversation was cleared while the request was in flight
    Cleared,
}

/// A chat session: one conversation, one request at a time
pub struct ChatSession {
    transport: Arc<dyn ChatTransport>,
    handle: ChatHandle,
}

impl ChatSession {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            handle: ChatHandle::new(),
        }
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.handle.subscribe()
    }

    /// Get a cloneable handle for clear/abort/copy from UI code.
    pub fn handle(&self) -> ChatHandle {
        self.handle.clone()
    }

    /// Snapshot of the conversation
    pub fn turns(&self) -> Vec<Turn> {
        self.handle.turns()
    }

    pub fn is_loading(&self) -> bool {
        self.handle.is_loading()
    }

    pub fn phase(&self) -> RequestPhase {
        self.handle.phase()
    }

    /// Send `input` and stream the reply into the conversation.
    ///
    /// Blank input and input submitted while another request is in flight are
    /// ignored. On failure the empty assistant turn (if any) is removed and a
    /// notice is emitted before the error is returned.
    pub async fn submit(&self, input: &str) -> Result<SubmitOutcome> {
        let message = input.trim();
        if message.is_empty() {
            return Ok(SubmitOutcome::Empty);
        }
        let Some(_guard) = InFlightGuard::acquire(&self.handle) else {
            debug!("Request already in flight, ignoring submit");
            return Ok(SubmitOutcome::Busy);
        };

        let cancel = CancellationToken::new();
        *self.handle.cancel.lock() = cancel.clone();

        let generation = {
            let mut state = self.handle.state.lock();
            state.append_turn(Turn::user(message));
            state.set_loading(true);
            state.set_phase(RequestPhase::Sending);
            state.generation()
        };
        self.handle.emit(ChatEvent::RequestStart {
            message: message.to_string(),
        });
        self.handle.emit(ChatEvent::PhaseChanged {
            phase: RequestPhase::Sending,
        });

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.transport.open(message) => Some(result),
        };
        let chunks = match opened {
            None => return Ok(self.settle_cancelled(generation, StreamAccumulator::new())),
            Some(Err(e)) => return self.settle_error(generation, e.into()),
            Some(Ok(chunks)) => chunks,
        };

        {
            let mut state = self.handle.state.lock();
            if state.generation() != generation {
                return Ok(SubmitOutcome::Cleared);
            }
            state.append_turn(Turn::assistant_placeholder());
            state.set_phase(RequestPhase::Streaming);
        }
        self.handle.emit(ChatEvent::PhaseChanged {
            phase: RequestPhase::Streaming,
        });
        self.handle.emit(ChatEvent::AssistantStart);

        let mut events = delta_events(chunks);
        let mut accumulator = StreamAccumulator::new();
        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(self.settle_cancelled(generation, accumulator)),
                event = events.next() => event,
            };

            match event {
                Some(StreamEvent::Delta(fragment)) => {
                    let content = accumulator.push(&fragment).to_string();
                    {
                        let mut state = self.handle.state.lock();
                        if state.generation() != generation {
                            return Ok(SubmitOutcome::Cleared);
                        }
                        state.replace_last_turn(content.clone());
                    }
                    self.handle.emit(ChatEvent::AssistantUpdate { content });
                }
                Some(StreamEvent::End(summary)) => {
                    info!(
                        end = ?summary.end,
                        fragments = summary.fragments,
                        malformed = summary.malformed,
                        chars = accumulator.as_str().chars().count(),
                        "Reply complete"
                    );
                    return Ok(self.settle_complete(accumulator, summary.end));
                }
                Some(StreamEvent::Error(e)) => return self.settle_error(generation, e.into()),
                None => return Ok(self.settle_complete(accumulator, StreamEnd::Eof)),
            }
        }
    }

    fn settle_complete(&self, accumulator: StreamAccumulator, end: StreamEnd) -> SubmitOutcome {
        let reply = accumulator.into_string();
        self.handle.emit(ChatEvent::AssistantEnd {
            content: reply.clone(),
            end,
        });
        SubmitOutcome::Completed { reply, end }
    }

    fn settle_cancelled(&self, generation: u64, accumulator: StreamAccumulator) -> SubmitOutcome {
        {
            let mut state = self.handle.state.lock();
            if state.generation() != generation {
                debug!("Request cancelled by clear");
                return SubmitOutcome::Cleared;
            }
            state.prune_empty_placeholder();
        }

        let reply = accumulator.into_string();
        info!(chars = reply.chars().count(), "Request aborted");
        self.handle.emit(ChatEvent::Aborted {
            content: reply.clone(),
        });
        SubmitOutcome::Aborted { reply }
    }

    fn settle_error(&self, generation: u64, error: Error) -> Result<SubmitOutcome> {
        {
            let mut state = self.handle.state.lock();
            if state.generation() != generation {
                debug!("Dropping error for cleared conversation: {}", error);
                return Ok(SubmitOutcome::Cleared);
            }
            state.prune_empty_placeholder();
            state.set_phase(RequestPhase::Error);
        }

        warn!("Chat request failed: {}", error);
        self.handle.emit(ChatEvent::PhaseChanged {
            phase: RequestPhase::Error,
        });
        self.handle.emit(ChatEvent::Failed {
            kind: error.kind(),
            message: error.to_string(),
        });
        self.handle.emit(ChatEvent::Notice(Notice::for_error(&error)));
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_stream::stream;
    use async_trait::async_trait;
    use fasal_stream::{ByteChunkStream, ErrorKind};
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tokio::sync::mpsc;

    type Chunk = fasal_stream::Result<Vec<u8>>;

    enum MockResponse {
        /// A complete body delivered at once
        Chunks(Vec<Chunk>),
        /// A body fed by the test through a channel
        Live(mpsc::Receiver<Chunk>),
        /// A non-success status
        Status(u16),
    }

    /// A mock transport that returns canned responses in order.
    struct MockTransport {
        responses: Mutex<VecDeque<MockResponse>>,
        requests: Mutex<Vec<String>>,
    }

    impl MockTransport {
        fn new(responses: Vec<MockResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl ChatTransport for MockTransport {
        async fn open(&self, message: &str) -> fasal_stream::Result<ByteChunkStream> {
            // Let concurrent callers observe the in-flight request
            tokio::task::yield_now().await;
            self.requests.lock().push(message.to_string());
            let response = self.responses.lock().pop_front();
            match response {
                Some(MockResponse::Chunks(items)) => Ok(Box::pin(futures::stream::iter(items))),
                Some(MockResponse::Live(mut rx)) => Ok(Box::pin(stream! {
                    while let Some(item) = rx.recv().await {
                        yield item;
                    }
                })),
                Some(MockResponse::Status(status)) => Err(fasal_stream::Error::from_status(status, "")),
                None => Err(fasal_stream::Error::Transport("no canned response".into())),
            }
        }
    }

    fn data(content: &str) -> Vec<u8> {
        format!(
            "data: {}\n\n",
            serde_json::json!({"choices": [{"delta": {"content": content}}]})
        )
        .into_bytes()
    }

    fn body(fragments: &[&str]) -> MockResponse {
        let mut chunks: Vec<Chunk> = fragments.iter().map(|f| Ok(data(f))).collect();
        chunks.push(Ok(b"data: [DONE]\n\n".to_vec()));
        MockResponse::Chunks(chunks)
    }

    fn session_with(responses: Vec<MockResponse>) -> (ChatSession, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new(responses));
        (ChatSession::new(transport.clone()), transport)
    }

    /// Wait for the first event matching `pred`
    async fn wait_for(rx: &mut broadcast::Receiver<ChatEvent>, pred: impl Fn(&ChatEvent) -> bool) -> ChatEvent {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let event = rx.recv().await.unwrap();
                if pred(&event) {
                    return event;
                }
            }
        })
        .await
        .expect("timed out waiting for event")
    }

    fn drain(rx: &mut broadcast::Receiver<ChatEvent>) -> Vec<ChatEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_submit_streams_reply() {
        let (session, transport) = session_with(vec![body(&["Millet", " and sorghum."])]);

        let outcome = session
            .submit("  What crops are best suited for low rainfall regions?  ")
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SubmitOutcome::Completed {
                reply: "Millet and sorghum.".into(),
                end: StreamEnd::Sentinel
            }
        );
        assert_eq!(
            transport.requests(),
            vec!["What crops are best suited for low rainfall regions?"]
        );
        let turns = session.turns();
        assert_eq!(turns.len(), 2);
        assert!(turns[0].is_user());
        assert_eq!(turns[0].content, "What crops are best suited for low rainfall regions?");
        assert!(turns[1].is_assistant());
        assert_eq!(turns[1].content, "Millet and sorghum.");
        assert!(!session.is_loading());
        assert_eq!(session.phase(), RequestPhase::Idle);
        assert!(!session.handle().is_in_flight());
    }

    #[tokio::test]
    async fn test_event_sequence() {
        let (session, _) = session_with(vec![body(&["Rabi", " crops"])]);
        let mut rx = session.subscribe();

        session.submit("Q").await.unwrap();

        assert_eq!(
            drain(&mut rx),
            vec![
                ChatEvent::RequestStart { message: "Q".into() },
                ChatEvent::PhaseChanged { phase: RequestPhase::Sending },
                ChatEvent::PhaseChanged { phase: RequestPhase::Streaming },
                ChatEvent::AssistantStart,
                ChatEvent::AssistantUpdate { content: "Rabi".into() },
                ChatEvent::AssistantUpdate { content: "Rabi crops".into() },
                ChatEvent::AssistantEnd {
                    content: "Rabi crops".into(),
                    end: StreamEnd::Sentinel
                },
                ChatEvent::PhaseChanged { phase: RequestPhase::Idle },
            ]
        );
    }

    #[tokio::test]
    async fn test_burst_beyond_channel_capacity_keeps_full_reply() {
        // Every fragment arrives in one chunk, so the whole reply is
        // published before a subscriber gets to run
        let mut chunk = Vec::new();
        let mut expected = String::new();
        for i in 0..300 {
            let fragment = format!("{} ", i);
            chunk.extend(data(&fragment));
            expected.push_str(&fragment);
        }
        chunk.extend_from_slice(b"data: [DONE]\n\n");
        let (session, _) = session_with(vec![MockResponse::Chunks(vec![Ok(chunk)])]);
        let mut rx = session.subscribe();

        let outcome = session.submit("Q").await.unwrap();

        assert_eq!(
            outcome,
            SubmitOutcome::Completed {
                reply: expected.clone(),
                end: StreamEnd::Sentinel
            }
        );
        assert_eq!(session.turns()[1].content, expected);
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let (session, transport) = session_with(vec![]);
        assert_eq!(session.submit("   \n\t").await.unwrap(), SubmitOutcome::Empty);
        assert!(session.turns().is_empty());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_second_submit_while_in_flight_is_ignored() {
        let (session, transport) = session_with(vec![body(&["One reply"]), body(&["unused"])]);

        let (first, second) = tokio::join!(session.submit("First"), session.submit("Second"));

        assert!(matches!(first.unwrap(), SubmitOutcome::Completed { .. }));
        assert_eq!(second.unwrap(), SubmitOutcome::Busy);
        assert_eq!(transport.requests(), vec!["First"]);
        let turns = session.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "First");
        assert_eq!(turns[1].content, "One reply");
    }

    #[tokio::test]
    async fn test_rate_limit_leaves_only_user_turn() {
        let (session, _) = session_with(vec![MockResponse::Status(429)]);
        let mut rx = session.subscribe();

        let err = session.submit("Compare rainfall").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RateLimited);
        let turns = session.turns();
        assert_eq!(turns.len(), 1);
        assert!(turns[0].is_user());
        assert!(!session.is_loading());
        assert_eq!(session.phase(), RequestPhase::Idle);

        let events = drain(&mut rx);
        assert!(events.contains(&ChatEvent::PhaseChanged {
            phase: RequestPhase::Error
        }));
        assert!(events.contains(&ChatEvent::Notice(Notice::error(
            "Rate limit exceeded. Please try again in a moment."
        ))));
    }

    #[tokio::test]
    async fn test_payment_required_notice() {
        let (session, _) = session_with(vec![MockResponse::Status(402)]);
        let mut rx = session.subscribe();

        let err = session.submit("Q").await.unwrap_err();

        assert!(!err.is_retryable());
        let notice = wait_for(&mut rx, |e| matches!(e, ChatEvent::Notice(_))).await;
        assert_eq!(
            notice,
            ChatEvent::Notice(Notice::error(
                "AI service requires payment. Please contact administrator."
            ))
        );
    }

    #[tokio::test]
    async fn test_session_usable_after_error() {
        let (session, _) = session_with(vec![MockResponse::Status(500), body(&["Recovered"])]);

        assert!(session.submit("Q1").await.is_err());
        let outcome = session.submit("Q2").await.unwrap();

        assert!(matches!(outcome, SubmitOutcome::Completed { ref reply, .. } if reply == "Recovered"));
        let contents: Vec<_> = session.turns().into_iter().map(|t| t.content).collect();
        assert_eq!(contents, vec!["Q1", "Q2", "Recovered"]);
    }

    #[tokio::test]
    async fn test_read_error_before_text_prunes_placeholder() {
        let (session, _) = session_with(vec![MockResponse::Chunks(vec![
            Ok(b": keepalive\n".to_vec()),
            Err(fasal_stream::Error::Transport("connection reset".into())),
        ])]);

        let err = session.submit("Q").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(session.turns().len(), 1);
    }

    #[tokio::test]
    async fn test_read_error_after_text_keeps_partial_reply() {
        let (session, _) = session_with(vec![MockResponse::Chunks(vec![
            Ok(data("Punjab leads")),
            Err(fasal_stream::Error::Transport("connection reset".into())),
        ])]);

        assert!(session.submit("Q").await.is_err());

        let turns = session.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].content, "Punjab leads");
    }

    #[tokio::test]
    async fn test_malformed_and_keepalive_lines_do_not_change_reply() {
        let (session, _) = session_with(vec![MockResponse::Chunks(vec![
            Ok(data("Rice")),
            Ok(b": ping\n\ndata: {not json\n".to_vec()),
            Ok(data(" and jute")),
        ])]);

        let outcome = session.submit("Q").await.unwrap();

        assert_eq!(
            outcome,
            SubmitOutcome::Completed {
                reply: "Rice and jute".into(),
                end: StreamEnd::Eof
            }
        );
    }

    #[tokio::test]
    async fn test_abort_keeps_partial_text() {
        let (tx, rx_body) = mpsc::channel(8);
        let (session, _) = session_with(vec![MockResponse::Live(rx_body)]);
        let session = Arc::new(session);
        let handle = session.handle();
        let mut rx = session.subscribe();

        let task = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.submit("Q").await }
        });
        tx.send(Ok(data("Millet"))).await.unwrap();
        wait_for(&mut rx, |e| matches!(e, ChatEvent::AssistantUpdate { .. })).await;

        handle.abort();
        let outcome = task.await.unwrap().unwrap();

        assert_eq!(outcome, SubmitOutcome::Aborted { reply: "Millet".into() });
        let turns = session.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].content, "Millet");
        assert!(!handle.is_in_flight());
    }

    #[tokio::test]
    async fn test_abort_before_text_prunes_placeholder() {
        let (_tx, rx_body) = mpsc::channel(8);
        let (session, _) = session_with(vec![MockResponse::Live(rx_body)]);
        let session = Arc::new(session);
        let handle = session.handle();
        let mut rx = session.subscribe();

        let task = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.submit("Q").await }
        });
        wait_for(&mut rx, |e| *e == ChatEvent::AssistantStart).await;

        handle.abort();
        let outcome = task.await.unwrap().unwrap();

        assert_eq!(outcome, SubmitOutcome::Aborted { reply: String::new() });
        assert_eq!(session.turns().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_during_stream_drops_late_fragments() {
        let (tx, rx_body) = mpsc::channel(8);
        let (session, _) = session_with(vec![MockResponse::Live(rx_body), body(&["Fresh"])]);
        let session = Arc::new(session);
        let handle = session.handle();
        let mut rx = session.subscribe();

        let task = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.submit("Old question").await }
        });
        tx.send(Ok(data("Stale"))).await.unwrap();
        wait_for(&mut rx, |e| matches!(e, ChatEvent::AssistantUpdate { .. })).await;

        handle.clear();
        // The reader may already be gone
        let _ = tx.send(Ok(data(" late"))).await;

        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome, SubmitOutcome::Cleared);
        assert!(session.turns().is_empty());
        assert!(!handle.is_in_flight());

        let outcome = session.submit("New question").await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Completed { .. }));
        let contents: Vec<_> = session.turns().into_iter().map(|t| t.content).collect();
        assert_eq!(contents, vec!["New question", "Fresh"]);
    }

    #[tokio::test]
    async fn test_clear_while_idle_then_submit() {
        let (session, _) = session_with(vec![body(&["A1"]), body(&["A2"])]);
        session.submit("Q1").await.unwrap();

        session.handle().clear();
        assert!(session.turns().is_empty());

        session.submit("Q2").await.unwrap();
        assert_eq!(session.turns().len(), 2);
    }

    #[tokio::test]
    async fn test_wait_for_idle_after_stream() {
        let (tx, rx_body) = mpsc::channel(8);
        let (session, _) = session_with(vec![MockResponse::Live(rx_body)]);
        let session = Arc::new(session);
        let handle = session.handle();
        let mut rx = session.subscribe();

        let task = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.submit("Q").await }
        });
        wait_for(&mut rx, |e| *e == ChatEvent::AssistantStart).await;
        assert!(handle.is_in_flight());
        assert!(session.is_loading());

        tx.send(Ok(b"data: [DONE]\n".to_vec())).await.unwrap();
        drop(tx);
        tokio::time::timeout(Duration::from_secs(5), handle.wait_for_idle())
            .await
            .unwrap();
        assert!(matches!(task.await.unwrap().unwrap(), SubmitOutcome::Completed { .. }));
    }
}
