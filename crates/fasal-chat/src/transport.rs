//! Transport abstraction for chat requests

use async_trait::async_trait;
use fasal_stream::{ByteChunkStream, ChatClient, Result};

/// Opens a streaming reply for a message
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send `message` and return the response body as raw chunks.
    ///
    /// Returns an error for non-success statuses before any body is read.
    async fn open(&self, message: &str) -> Result<ByteChunkStream>;
}

/// Transport that talks to the HTTP chat endpoint
pub struct HttpTransport {
    client: ChatClient,
}

impl HttpTransport {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn open(&self, message: &str) -> Result<ByteChunkStream> {
        self.client.send(message).await
    }
}
