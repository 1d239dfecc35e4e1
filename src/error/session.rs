//! Errors returned by `ChatSession::send_message`.

use thiserror::Error;

use super::TransportError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The message was empty after trimming; nothing was recorded.
    #[error("Message is empty")]
    EmptyMessage,

    /// A reply is still streaming for this session.
    #[error("Please wait for the current response to complete before sending another message.")]
    TurnInProgress,

    /// The turn failed; the transcript has already been cleaned up.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl SessionError {
    /// The transport failure behind this error, if any.
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            SessionError::Transport(err) => Some(err),
            _ => None,
        }
    }
}
