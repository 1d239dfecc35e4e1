//! Transport-level error types.
//!
//! These are the only failures that end a turn and reach the caller:
//! connection problems, non-2xx responses, a missing body, a body that
//! breaks off mid-stream, and error frames sent by the backend.

use thiserror::Error;

use crate::traits::HttpError;

/// A failure that ends the current turn.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The server answered with a non-2xx status.
    ///
    /// `message` is the server's `{"error": ...}` text when present,
    /// otherwise `Request failed (<status>)`.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The response carried no body to stream from.
    #[error("No response body")]
    MissingBody,

    /// The connection could not be established.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The request timed out before a response arrived.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The body stream broke off while reading.
    #[error("Stream interrupted: {0}")]
    Interrupted(String),

    /// The backend reported an error inside the stream.
    #[error("{0}")]
    Backend(String),

    /// The request could not be built (bad URL, unserializable body).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// Build a status failure, falling back to the generic message.
    pub fn from_status(status: u16, server_message: Option<String>) -> Self {
        let message = server_message.unwrap_or_else(|| format!("Request failed ({})", status));
        TransportError::Status { status, message }
    }

    /// HTTP status code, for status failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message suitable for a single error notification.
    pub fn user_message(&self) -> String {
        match self {
            TransportError::Status { message, .. } => message.clone(),
            TransportError::MissingBody => "No response body".to_string(),
            TransportError::Connection(_) => {
                "Unable to connect to the server. Please check your internet connection."
                    .to_string()
            }
            TransportError::Timeout(_) => {
                "The server took too long to respond. Please try again.".to_string()
            }
            TransportError::Interrupted(_) => {
                "The response was interrupted. Please try again.".to_string()
            }
            TransportError::Backend(message) => message.clone(),
            TransportError::InvalidRequest(_) => {
                "The request could not be sent. Please check your configuration.".to_string()
            }
        }
    }

    /// Short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            TransportError::Status { .. } => "E_STREAM_STATUS",
            TransportError::MissingBody => "E_STREAM_NO_BODY",
            TransportError::Connection(_) => "E_STREAM_CONN",
            TransportError::Timeout(_) => "E_STREAM_TIMEOUT",
            TransportError::Interrupted(_) => "E_STREAM_INTERRUPTED",
            TransportError::Backend(_) => "E_STREAM_BACKEND",
            TransportError::InvalidRequest(_) => "E_STREAM_REQUEST",
        }
    }
}

impl From<HttpError> for TransportError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::ConnectionFailed(msg) => TransportError::Connection(msg),
            HttpError::Timeout(msg) => TransportError::Timeout(msg),
            HttpError::Io(msg) => TransportError::Interrupted(msg),
            HttpError::InvalidUrl(msg) => TransportError::InvalidRequest(msg),
            HttpError::Other(msg) => TransportError::Connection(msg),
        }
    }
}
