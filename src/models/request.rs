use serde::{Deserialize, Serialize};

use super::message::Message;

/// Request body for the streaming chat endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    /// Full conversation so far, oldest first, ending with the new user message
    pub messages: Vec<Message>,
}

impl ChatRequest {
    /// Create a request from the conversation to send
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Serialize to the JSON request body
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
