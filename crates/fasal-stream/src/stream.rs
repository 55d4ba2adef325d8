//! Response body to delta event pipeline

use std::pin::Pin;

use async_stream::stream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_stream::Stream;
use tracing::{debug, warn};

use crate::delta::{Delta, decode_delta};
use crate::error::{Error, Result};
use crate::framing::LineFramer;
use crate::sse::{SseLine, classify_line};

/// Raw body chunks as they arrive from the transport
pub type ByteChunkStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// Decoded events of one response
pub type DeltaEventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Why a response stopped producing text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamEnd {
    /// `data: [DONE]` was received
    Sentinel,
    /// The transport closed without a sentinel
    Eof,
}

/// Counters reported when a response completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSummary {
    pub end: StreamEnd,
    /// Complete lines framed before the sentinel
    pub lines: usize,
    /// Text fragments yielded
    pub fragments: usize,
    /// Data payloads that failed to decode
    pub malformed: usize,
    /// Whether an unterminated final line was dropped at EOF
    pub discarded_tail: bool,
}

/// Events produced while reading a response body
#[derive(Debug)]
pub enum StreamEvent {
    /// Next text fragment, in arrival order
    Delta(String),
    /// The response completed; always the last event on success
    End(StreamSummary),
    /// Reading the body failed; always the last event on failure
    Error(Error),
}

impl StreamEvent {
    /// Check if this is a terminal event (End or Error)
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::End(_) | StreamEvent::Error(_))
    }
}

/// Turn a body chunk stream into text fragments.
///
/// Lines are framed across chunk boundaries, non-data lines are skipped and
/// malformed payloads are dropped without failing the stream. After the
/// `[DONE]` sentinel the body is still drained so the connection completes,
/// but nothing more is decoded.
pub fn delta_events(chunks: ByteChunkStream) -> DeltaEventStream {
    Box::pin(stream! {
        let mut chunks = chunks;
        let mut framer = LineFramer::new();
        let mut lines = 0;
        let mut fragments = 0;
        let mut malformed = 0;
        let mut done = false;

        while let Some(chunk) = chunks.next().await {
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(e) if done => {
                    warn!("Read failed after end of stream: {}", e);
                    break;
                }
                Err(e) => {
                    yield StreamEvent::Error(e);
                    return;
                }
            };
            if done {
                continue;
            }

            for line in framer.push_bytes(&bytes) {
                lines += 1;
                match classify_line(&line) {
                    SseLine::Done => {
                        done = true;
                        break;
                    }
                    SseLine::Data(payload) => match decode_delta(payload) {
                        Delta::Fragment(text) => {
                            fragments += 1;
                            yield StreamEvent::Delta(text);
                        }
                        Delta::Empty => {}
                        Delta::Malformed(reason) => {
                            malformed += 1;
                            debug!(payload, reason = %reason, "Skipping malformed payload");
                        }
                    },
                    SseLine::Blank | SseLine::Comment | SseLine::Other => {}
                }
            }
        }

        let mut discarded_tail = false;
        if !done {
            if let Some(tail) = framer.finish() {
                debug!(tail = %tail, "Discarding unterminated final line");
                discarded_tail = true;
            }
        }

        yield StreamEvent::End(StreamSummary {
            end: if done { StreamEnd::Sentinel } else { StreamEnd::Eof },
            lines,
            fragments,
            malformed,
            discarded_tail,
        });
    })
}
