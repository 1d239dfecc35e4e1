//! Turn reconciliation for Transcript
//!
//! Folds streamed fragments into the message sequence so that each user
//! turn grows exactly one assistant reply.

use crate::models::{Message, MessageRole};

use super::Transcript;

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Sentinel or clean end of stream
    Completed,
    /// Transport error or error frame
    Failed,
    /// Cancelled by the caller
    Aborted,
}

/// Running state of one user turn.
///
/// Created by [`Transcript::start_turn`]; owns the accumulated reply text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    /// Position of this turn's user message in the sequence
    user_index: usize,
    /// Everything streamed so far
    accumulated: String,
    /// Number of fragments applied
    fragments: usize,
}

impl Turn {
    /// Reply text accumulated so far.
    pub fn content(&self) -> &str {
        &self.accumulated
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments
    }

    /// Index of the user message that started this turn.
    pub fn user_index(&self) -> usize {
        self.user_index
    }

    /// Index the assistant reply occupies (once it exists).
    fn reply_index(&self) -> usize {
        self.user_index + 1
    }
}

impl Transcript {
    /// Append the user's message and begin a new reply accumulator.
    pub fn start_turn(&self, user_content: impl Into<String>) -> Turn {
        let content = user_content.into();
        let mut user_index = 0;
        self.modify(|messages| {
            user_index = messages.len();
            messages.push(Message::user(content));
            true
        });

        Turn {
            user_index,
            accumulated: String::new(),
            fragments: 0,
        }
    }

    /// Fold one fragment into the turn's reply.
    ///
    /// The first fragment appends an assistant message; every later one
    /// replaces that message's content with the full accumulated text.
    /// Empty deltas are ignored.
    pub fn apply_fragment(&self, turn: &mut Turn, delta: &str) {
        if delta.is_empty() {
            return;
        }

        turn.accumulated.push_str(delta);
        turn.fragments += 1;

        let reply_index = turn.reply_index();
        let content = &turn.accumulated;
        self.modify(|messages| {
            if owns_trailing_reply(messages, turn.user_index) {
                if let Some(reply) = messages.get_mut(reply_index) {
                    reply.content.clone_from(content);
                }
            } else {
                messages.push(Message::assistant(content.clone()));
            }
            true
        });
    }

    /// Close the turn.
    ///
    /// Successful and aborted turns keep whatever was streamed. For every
    /// outcome a trailing empty assistant placeholder is removed.
    pub fn end_turn(&self, turn: &Turn, outcome: TurnOutcome) {
        let removed = self.modify(|messages| {
            let trailing_empty = messages
                .last()
                .is_some_and(|last| last.is_assistant() && last.content.is_empty());
            if trailing_empty {
                messages.pop();
            }
            trailing_empty
        });

        if removed {
            tracing::debug!(
                ?outcome,
                user_index = turn.user_index,
                "Removed empty assistant placeholder"
            );
        }
    }

    /// Drop the turn's assistant reply, keeping the user message.
    ///
    /// Only acts while that reply is still the trailing message.
    pub fn discard_turn(&self, turn: &Turn) -> bool {
        self.modify(|messages| {
            if owns_trailing_reply(messages, turn.user_index) {
                messages.truncate(turn.reply_index());
                true
            } else {
                false
            }
        })
    }
}

/// True if the trailing message is the assistant reply paired with the
/// user message at `user_index`.
fn owns_trailing_reply(messages: &[Message], user_index: usize) -> bool {
    messages.len() == user_index + 2
        && messages[user_index].role == MessageRole::User
        && messages[user_index + 1].role == MessageRole::Assistant
}
