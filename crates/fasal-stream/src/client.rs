//! HTTP client for the chat endpoint

use std::time::Duration;

use futures::StreamExt;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{StatusCode, Url};
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::stream::ByteChunkStream;

/// Request body sent to the endpoint
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Client for a single streaming chat endpoint
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    endpoint: Url,
    headers: HeaderMap,
}

impl ChatClient {
    /// Create a client without a request timeout
    pub fn new(endpoint: &str, api_key: &str) -> Result<Self> {
        Self::with_timeout(endpoint, api_key, None)
    }

    /// Create a client; `timeout` bounds the whole request including the body
    pub fn with_timeout(endpoint: &str, api_key: &str, timeout: Option<Duration>) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| Error::InvalidConfig(format!("endpoint {:?}: {}", endpoint, e)))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "endpoint must use http or https, got {}",
                endpoint.scheme()
            )));
        }
        if api_key.trim().is_empty() {
            return Err(Error::InvalidConfig("API key is empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| Error::InvalidConfig("API key is not a valid header value".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            endpoint,
            headers,
        })
    }

    /// The configured endpoint
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// POST a message and return the response body as raw chunks.
    ///
    /// Non-success statuses are mapped to errors before any body is read.
    pub async fn send(&self, message: &str) -> Result<ByteChunkStream> {
        debug!(endpoint = %self.endpoint, chars = message.chars().count(), "Sending chat request");

        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(self.headers.clone())
            .json(&ChatRequest { message })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), body = %body, "Chat request rejected");
            return Err(Error::from_status(status.as_u16(), body));
        }
        if status == StatusCode::NO_CONTENT {
            return Err(Error::MissingBody);
        }

        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(Error::from));
        Ok(Box::pin(chunks))
    }
}
