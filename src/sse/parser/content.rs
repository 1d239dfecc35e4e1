//! Data payload decoding

use serde::Deserialize;
use serde_json::Value;

use crate::sse::events::PayloadOutcome;
use crate::sse::payloads::ErrorField;

/// JSON pointer to the streamed content delta.
const CONTENT_POINTER: &str = "/choices/0/delta/content";

/// Decode a data payload into a content fragment.
///
/// Only a JSON syntax error counts as [`PayloadOutcome::Malformed`]. JSON
/// that parses but does not have the expected shape is treated like a
/// heartbeat and yields [`PayloadOutcome::Empty`]. Unexpected sibling
/// fields never hide the content.
pub(super) fn decode_payload(payload: &str) -> PayloadOutcome {
    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(_) => return PayloadOutcome::Malformed,
    };

    let error = value
        .get("error")
        .and_then(|error| ErrorField::deserialize(error).ok());
    if let Some(error) = error {
        return PayloadOutcome::Error(error.message().to_string());
    }

    match value.pointer(CONTENT_POINTER).and_then(Value::as_str) {
        Some(content) if !content.is_empty() => PayloadOutcome::Fragment(content.to_string()),
        _ => PayloadOutcome::Empty,
    }
}

/// Decode a payload that was rebuilt from a restored line and its
/// continuation.
///
/// The terminator between the two pieces is either a real line break in
/// the JSON (whitespace between tokens) or an artifact of the split, so the
/// joined text is tried both with and without it.
pub(super) fn decode_joined_payload(joined: &str) -> PayloadOutcome {
    match decode_payload(joined) {
        PayloadOutcome::Malformed if joined.contains('\n') => {
            decode_payload(&joined.replace('\n', ""))
        }
        outcome => outcome,
    }
}
