//! Turn lifecycle state.

use crate::transcript::TurnOutcome;

/// Where the current (or most recent) turn is in its lifecycle.
///
/// ```text
/// Idle -> Requesting -> Streaming -> Completed
///              |            |-----> Failed
///              |            '-----> Aborted
///              '-> Failed | Aborted
/// ```
///
/// A terminal state persists until the next turn starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    /// No turn has run yet
    #[default]
    Idle,
    /// Request sent, waiting for the response
    Requesting,
    /// Response body is being read
    Streaming,
    /// Sentinel or clean end of stream
    Completed,
    /// Transport failure or error frame
    Failed,
    /// Cancelled by the caller
    Aborted,
}

impl StreamState {
    /// True while a turn is in flight.
    pub fn is_active(&self) -> bool {
        matches!(self, StreamState::Requesting | StreamState::Streaming)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamState::Completed | StreamState::Failed | StreamState::Aborted
        )
    }
}

impl From<TurnOutcome> for StreamState {
    fn from(outcome: TurnOutcome) -> Self {
        match outcome {
            TurnOutcome::Completed => StreamState::Completed,
            TurnOutcome::Failed => StreamState::Failed,
            TurnOutcome::Aborted => StreamState::Aborted,
        }
    }
}

impl std::fmt::Display for StreamState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StreamState::Idle => "idle",
            StreamState::Requesting => "requesting",
            StreamState::Streaming => "streaming",
            StreamState::Completed => "completed",
            StreamState::Failed => "failed",
            StreamState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Summary of a turn that ended without a transport failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    /// `Completed` or `Aborted`
    pub outcome: TurnOutcome,
    /// Reply text as streamed (kept in the transcript unless discarded)
    pub reply: String,
    /// Number of fragments applied
    pub fragments: usize,
}

impl TurnReport {
    pub fn is_completed(&self) -> bool {
        self.outcome == TurnOutcome::Completed
    }

    pub fn is_aborted(&self) -> bool {
        self.outcome == TurnOutcome::Aborted
    }
}
