//! Payload deserialization structs
//!
//! Internal structs for the `error` member carried by `data: ` lines and by
//! non-2xx response bodies.

use serde::Deserialize;

/// Error member: either a bare string or an object with a message.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ErrorField {
    Message(String),
    Detail { message: String },
}

impl ErrorField {
    pub fn message(&self) -> &str {
        match self {
            ErrorField::Message(message) => message,
            ErrorField::Detail { message } => message,
        }
    }
}

/// Body of a failed request: `{"error": "..."}`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: ErrorField,
}

/// Extract the server-provided error message from a response body.
///
/// Returns `None` if the body is not JSON, has no `error` member, or the
/// message is blank.
pub(crate) fn error_message(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    let message = parsed.error.message().trim();
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}
