//! HTTP client trait abstraction.
//!
//! The chat client only ever needs one kind of request: a POST whose
//! response body is read incrementally. Keeping that behind a trait lets
//! tests script the byte stream chunk by chunk.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;

/// HTTP headers represented as a key-value map.
pub type Headers = HashMap<String, String>;

/// Incrementally delivered response body.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, HttpError>> + Send>>;

/// Status line plus the (possibly absent) streaming body.
pub struct StreamingResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body, `None` when the server sent none
    pub body: Option<ByteStream>,
}

impl StreamingResponse {
    pub fn new(status: u16, body: Option<ByteStream>) -> Self {
        Self { status, body }
    }

    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status", &self.status)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// HTTP client errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// Connection failed
    ConnectionFailed(String),
    /// Request timeout
    Timeout(String),
    /// Error while reading the body
    Io(String),
    /// Invalid URL
    InvalidUrl(String),
    /// Other error
    Other(String),
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            HttpError::Timeout(msg) => write!(f, "Request timeout: {}", msg),
            HttpError::Io(msg) => write!(f, "IO error: {}", msg),
            HttpError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            HttpError::Other(msg) => write!(f, "HTTP error: {}", msg),
        }
    }
}

impl std::error::Error for HttpError {}

/// Trait for HTTP client operations.
///
/// Implementations include the production reqwest-based client and a
/// scripted mock for tests.
///
/// # Example
///
/// ```ignore
/// use chatstream::traits::{Headers, HttpClient};
///
/// let response = client.post_stream(url, r#"{"messages":[]}"#, &Headers::new()).await?;
/// if response.is_success() { /* read response.body */ }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a POST request and return the status with a streaming body.
    ///
    /// Non-2xx responses are returned as `Ok` so the caller can read the
    /// error body. Only failures to obtain a response at all are `Err`.
    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<StreamingResponse, HttpError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streaming_response_is_success() {
        assert!(StreamingResponse::new(200, None).is_success());
        assert!(StreamingResponse::new(204, None).is_success());
        assert!(!StreamingResponse::new(301, None).is_success());
        assert!(!StreamingResponse::new(429, None).is_success());
        assert!(!StreamingResponse::new(500, None).is_success());
    }

    #[test]
    fn test_streaming_response_debug_hides_stream() {
        let body: ByteStream = Box::pin(futures::stream::empty());
        let debug = format!("{:?}", StreamingResponse::new(200, Some(body)));
        assert!(debug.contains("has_body: true"));
    }

    #[test]
    fn test_http_error_display() {
        assert_eq!(
            HttpError::ConnectionFailed("refused".to_string()).to_string(),
            "Connection failed: refused"
        );
        assert_eq!(
            HttpError::Timeout("10s".to_string()).to_string(),
            "Request timeout: 10s"
        );
        assert_eq!(
            HttpError::Io("reset".to_string()).to_string(),
            "IO error: reset"
        );
        assert_eq!(
            HttpError::InvalidUrl("bad url".to_string()).to_string(),
            "Invalid URL: bad url"
        );
        assert_eq!(
            HttpError::Other("unknown".to_string()).to_string(),
            "HTTP error: unknown"
        );
    }
}
