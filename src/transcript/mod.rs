//! Conversation transcript
//!
//! Holds the ordered message sequence of one chat session. The sequence
//! lives inside a `tokio::sync::watch` channel: writers mutate it in place
//! and readers either take a snapshot or subscribe for change
//! notifications. A reader's borrow holds the channel's read lock, so it
//! sees a message either before or after a mutation, never halfway.

mod reconciliation;

pub use reconciliation::{Turn, TurnOutcome};

use std::sync::Arc;

use tokio::sync::watch;

use crate::models::Message;

/// Shared handle to a session's message sequence.
///
/// Clones refer to the same transcript. Separate sessions must each create
/// their own.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Arc<watch::Sender<Vec<Message>>>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    /// Create an empty transcript
    pub fn new() -> Self {
        Self::with_messages(Vec::new())
    }

    /// Create a transcript seeded with earlier messages
    pub fn with_messages(messages: Vec<Message>) -> Self {
        let (tx, _rx) = watch::channel(messages);
        Self {
            messages: Arc::new(tx),
        }
    }

    /// Create a transcript that opens with an assistant greeting
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        Self::with_messages(vec![Message::assistant(greeting)])
    }

    /// Copy of the full message sequence
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.borrow().clone()
    }

    /// Receiver that is notified after every change
    pub fn subscribe(&self) -> watch::Receiver<Vec<Message>> {
        self.messages.subscribe()
    }

    pub fn len(&self) -> usize {
        self.messages.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.borrow().is_empty()
    }

    /// Copy of the trailing message
    pub fn last(&self) -> Option<Message> {
        self.messages.borrow().last().cloned()
    }

    /// Apply a mutation and notify subscribers if it changed anything.
    pub(crate) fn modify<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut Vec<Message>) -> bool,
    {
        self.messages.send_if_modified(f)
    }
}
