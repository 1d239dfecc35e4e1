//! Mock HTTP client for testing.
//!
//! Scripts the status line and body chunks of a streaming response, and
//! records every request so tests can inspect headers and payloads.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::traits::{ByteStream, Headers, HttpClient, HttpError, StreamingResponse};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// Request body
    pub body: String,
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Respond with `status` and deliver `chunks`, then end the body
    Stream { status: u16, chunks: Vec<Bytes> },
    /// Deliver `chunks`, then fail the body read with `error`
    StreamThenError { chunks: Vec<Bytes>, error: HttpError },
    /// Deliver `chunks`, then never produce another item
    Pending { chunks: Vec<Bytes> },
    /// Respond with `status` and no body at all
    NoBody { status: u16 },
    /// Fail before any response arrives
    Error(HttpError),
}

impl MockResponse {
    /// A 200 response whose body is delivered as the given chunks.
    pub fn sse<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MockResponse::Stream {
            status: 200,
            chunks: chunks
                .into_iter()
                .map(|chunk| Bytes::from(chunk.into()))
                .collect(),
        }
    }

    /// A non-2xx response with a single-chunk body.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        MockResponse::Stream {
            status,
            chunks: vec![Bytes::from(body.into())],
        }
    }
}

/// Mock HTTP client for testing.
///
/// # Example
///
/// ```ignore
/// use chatstream::adapters::mock::{MockHttpClient, MockResponse};
///
/// let client = MockHttpClient::new();
/// client.set_default_response(MockResponse::sse([
///     "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n",
///     "data: [DONE]\n\n",
/// ]));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    /// Configured responses by URL
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    /// Default response when no specific match
    default_response: Arc<Mutex<Option<MockResponse>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a response for a specific URL (exact or prefix match).
    pub fn set_response(&self, url: &str, response: MockResponse) {
        lock(&self.responses).insert(url.to_string(), response);
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        *lock(&self.default_response) = Some(response);
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        lock(&self.requests).clear();
    }

    fn record_request(&self, url: &str, headers: &Headers, body: &str) {
        lock(&self.requests).push(RecordedRequest {
            url: url.to_string(),
            headers: headers.clone(),
            body: body.to_string(),
        });
    }

    fn get_response(&self, url: &str) -> Option<MockResponse> {
        let responses = lock(&self.responses);

        if let Some(response) = responses.get(url) {
            return Some(response.clone());
        }

        for (pattern, response) in responses.iter() {
            if url.starts_with(pattern) {
                return Some(response.clone());
            }
        }

        lock(&self.default_response).clone()
    }
}

fn chunk_stream(chunks: Vec<Bytes>) -> impl futures::Stream<Item = Result<Bytes, HttpError>> {
    futures::stream::iter(chunks.into_iter().map(Ok))
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<StreamingResponse, HttpError> {
        self.record_request(url, headers, body);

        match self.get_response(url) {
            Some(MockResponse::Stream { status, chunks }) => {
                let stream: ByteStream = Box::pin(chunk_stream(chunks));
                Ok(StreamingResponse::new(status, Some(stream)))
            }
            Some(MockResponse::StreamThenError { chunks, error }) => {
                let tail = futures::stream::once(async move { Err(error) });
                let stream: ByteStream = Box::pin(chunk_stream(chunks).chain(tail));
                Ok(StreamingResponse::new(200, Some(stream)))
            }
            Some(MockResponse::Pending { chunks }) => {
                let stream: ByteStream =
                    Box::pin(chunk_stream(chunks).chain(futures::stream::pending()));
                Ok(StreamingResponse::new(200, Some(stream)))
            }
            Some(MockResponse::NoBody { status }) => Ok(StreamingResponse::new(status, None)),
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(HttpError::Other(format!("No mock response for URL: {}", url))),
        }
    }
}
