//! fasal-stream: Streaming chat transport
//!
//! This crate turns the raw body of a chat endpoint response into a stream of
//! text deltas. The pipeline is leaf-first: bytes are decoded and framed into
//! lines, lines are filtered as server-sent events, and `data:` payloads are
//! decoded into incremental text fragments.

pub mod client;
pub mod delta;
pub mod error;
pub mod framing;
pub mod sse;
pub mod stream;

pub use client::ChatClient;
pub use delta::{Delta, decode_delta};
pub use error::{Error, ErrorKind, Result};
pub use framing::LineFramer;
pub use sse::{SseLine, classify_line};
pub use stream::{ByteChunkStream, DeltaEventStream, StreamEnd, StreamEvent, StreamSummary, delta_events};
