//! Chat endpoint client.
//!
//! Opens one streaming reply per request. Status and body checks happen
//! here so callers only ever see a live body or a [`TransportError`].

use std::sync::Arc;

use futures_util::StreamExt;

use crate::adapters::ReqwestHttpClient;
use crate::config::ChatConfig;
use crate::error::TransportError;
use crate::models::ChatRequest;
use crate::sse::{decode_stream, payloads, EventStream};
use crate::traits::{ByteStream, Headers, HttpClient};

/// Upper bound on how much of an error body is read.
const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

/// Client for the streaming chat endpoint.
#[derive(Clone)]
pub struct ChatClient {
    endpoint: String,
    api_key: Option<String>,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("endpoint", &self.endpoint)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl ChatClient {
    /// Create a client backed by reqwest.
    pub fn new(config: &ChatConfig) -> Result<Self, TransportError> {
        let http = ReqwestHttpClient::with_connect_timeout(config.connect_timeout())?;
        Ok(Self::with_http_client(config, Arc::new(http)))
    }

    /// Create a client over any [`HttpClient`], e.g. a mock.
    pub fn with_http_client(config: &ChatConfig, http: Arc<dyn HttpClient>) -> Self {
        Self {
            endpoint: config.endpoint(),
            api_key: config.api_key.clone(),
            http,
        }
    }

    /// Full URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Accept".to_string(), "text/event-stream".to_string());
        if let Some(key) = &self.api_key {
            headers.insert("Authorization".to_string(), format!("Bearer {}", key));
        }
        headers
    }

    /// Post the conversation and return the reply body.
    ///
    /// A non-2xx status fails with the server's `{"error": ...}` message
    /// when the body carries one, otherwise `Request failed (<status>)`.
    pub async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, TransportError> {
        let body = request
            .to_json()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        tracing::debug!(
            "Opening chat stream at {} with {} messages",
            self.endpoint,
            request.messages.len()
        );

        let response = self
            .http
            .post_stream(&self.endpoint, &body, &self.headers())
            .await?;

        if !response.is_success() {
            let status = response.status;
            let server_message = match response.body {
                Some(body) => payloads::error_message(&read_error_body(body).await),
                None => None,
            };
            let err = TransportError::from_status(status, server_message);
            tracing::warn!("Chat request rejected with status {}: {}", status, err);
            return Err(err);
        }

        response.body.ok_or(TransportError::MissingBody)
    }

    /// Post the conversation and decode the reply as it arrives.
    pub async fn stream_events(&self, request: &ChatRequest) -> Result<EventStream, TransportError> {
        let body = self.open_stream(request).await?;
        Ok(decode_stream(body))
    }
}

/// Read an error body, stopping at the size cap or the first read failure.
async fn read_error_body(mut body: ByteStream) -> Vec<u8> {
    let mut collected = Vec::new();
    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => {
                collected.extend_from_slice(&bytes);
                if collected.len() >= MAX_ERROR_BODY_BYTES {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!("Error body read failed: {}", e);
                break;
            }
        }
    }
    collected
}
