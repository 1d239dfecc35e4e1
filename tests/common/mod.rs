//! Common test utilities for integration tests.
//!
//! Frame builders for the event-stream wire format, plus helpers to
//! build sessions over a scripted client or a wiremock server.
//!
//! # Example
//!
//! ```ignore
//! use common::{content_frame, DONE_FRAME};
//!
//! let body = format!("{}{}", content_frame("Hi"), DONE_FRAME);
//! ```

#![allow(dead_code)]

pub mod mocks;

pub use mocks::*;

use std::sync::Arc;

use chatstream::client::ChatClient;
use chatstream::config::ChatConfig;
use chatstream::session::ChatSession;
use chatstream::sse::{DecoderEvent, FrameDecoder};

/// Sentinel frame.
pub const DONE_FRAME: &str = "data: [DONE]\n";

/// A `data:` line carrying `content` as the first choice's delta.
pub fn content_frame(content: &str) -> String {
    format!(
        "data: {}\n",
        serde_json::json!({ "choices": [{ "delta": { "content": content } }] })
    )
}

/// A `data:` line carrying a top-level error member.
pub fn error_frame(message: &str) -> String {
    format!("data: {}\n", serde_json::json!({ "error": message }))
}

/// Config with no greeting so transcripts start empty.
pub fn test_config() -> ChatConfig {
    ChatConfig::new().with_greeting(None)
}

/// Session whose client talks to `server_uri`.
pub fn session_for_server(server_uri: &str, config: ChatConfig) -> ChatSession {
    let config = config.with_base_url(server_uri);
    ChatSession::new(&config).expect("reqwest client builds")
}

/// Session whose client is the given mock.
pub fn session_for_mock(mock: &MockHttpClient, config: ChatConfig) -> ChatSession {
    let client = ChatClient::with_http_client(&config, Arc::new(mock.clone()));
    ChatSession::with_client(&config, client)
}

/// Feed `chunks` into a fresh decoder, flush, and concatenate fragments.
pub fn decode_all<I, B>(chunks: I) -> (String, Vec<DecoderEvent>)
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let mut decoder = FrameDecoder::new();
    let mut events = Vec::new();
    for chunk in chunks {
        events.extend(decoder.feed(chunk.as_ref()));
    }
    events.extend(decoder.flush());

    let text = events
        .iter()
        .filter_map(DecoderEvent::as_fragment)
        .collect::<String>();
    (text, events)
}
