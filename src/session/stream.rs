//! Turn driver without I/O.
//!
//! [`StreamSession`] owns the decoder and the running turn. The caller
//! pushes body chunks into it and it keeps the transcript and the
//! published [`StreamState`] in step. `ChatSession` wraps it with the
//! network pull loop; tests drive it directly.

use std::sync::Arc;

use tokio::sync::watch;
use uuid::Uuid;

use crate::error::{SessionError, TransportError};
use crate::sse::{DecoderEvent, FrameDecoder};
use crate::transcript::{Transcript, Turn, TurnOutcome};

use super::state::{StreamState, TurnReport};

/// Result of feeding one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// The turn is still open; keep reading
    Streaming,
    /// The turn ended (sentinel or cancellation)
    Ended(TurnReport),
    /// No turn is in flight; the chunk was ignored
    Idle,
}

/// Drives one turn at a time over a shared transcript.
#[derive(Debug)]
pub struct StreamSession {
    session_id: Uuid,
    transcript: Transcript,
    decoder: FrameDecoder,
    turn: Option<Turn>,
    state: Arc<watch::Sender<StreamState>>,
    discard_partial_on_abort: bool,
}

impl StreamSession {
    /// Create a driver with its own state channel.
    pub fn new(transcript: Transcript) -> Self {
        let (tx, _rx) = watch::channel(StreamState::Idle);
        Self::with_state(Uuid::new_v4(), transcript, Arc::new(tx))
    }

    pub(crate) fn with_state(
        session_id: Uuid,
        transcript: Transcript,
        state: Arc<watch::Sender<StreamState>>,
    ) -> Self {
        Self {
            session_id,
            transcript,
            decoder: FrameDecoder::new(),
            turn: None,
            state,
            discard_partial_on_abort: false,
        }
    }

    /// Drop the partial reply when a turn is aborted.
    pub fn with_discard_partial_on_abort(mut self, discard: bool) -> Self {
        self.discard_partial_on_abort = discard;
        self
    }

    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<StreamState> {
        self.state.subscribe()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// The turn in flight, if any.
    pub fn turn(&self) -> Option<&Turn> {
        self.turn.as_ref()
    }

    fn set_state(&self, next: StreamState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                tracing::trace!(session_id = %self.session_id, "{} -> {}", current, next);
                *current = next;
                true
            }
        });
    }

    /// Record the user's message and enter `Requesting`.
    ///
    /// Content is trimmed first; blank input is rejected without touching
    /// the transcript, as is a new turn while one is in flight.
    pub fn begin(&mut self, content: &str) -> Result<(), SessionError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        if self.state().is_active() {
            return Err(SessionError::TurnInProgress);
        }

        self.decoder.reset();
        self.turn = Some(self.transcript.start_turn(content));
        self.set_state(StreamState::Requesting);
        tracing::info!(
            session_id = %self.session_id,
            "Turn started ({} chars)",
            content.chars().count()
        );
        Ok(())
    }

    /// The response arrived and its body is about to be read.
    pub fn mark_streaming(&mut self) {
        if self.state() == StreamState::Requesting {
            self.set_state(StreamState::Streaming);
        }
    }

    /// Feed one body chunk.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Progress, TransportError> {
        self.feed_checked(chunk, || false)
    }

    /// Feed one body chunk, consulting `cancelled` before every fragment.
    ///
    /// Fragments applied before cancellation was observed stay applied.
    /// An error frame fails the turn and is returned as `Err`.
    pub fn feed_checked<F>(&mut self, chunk: &[u8], cancelled: F) -> Result<Progress, TransportError>
    where
        F: Fn() -> bool,
    {
        if !self.state().is_active() {
            tracing::trace!(
                session_id = %self.session_id,
                "Ignoring {} bytes with no turn in flight",
                chunk.len()
            );
            return Ok(Progress::Idle);
        }
        self.mark_streaming();

        let events = self.decoder.feed(chunk);
        self.apply_events(events, &cancelled)
    }

    /// The body ended: recover buffered frames and complete the turn.
    pub fn finish_stream(&mut self) -> Result<TurnReport, TransportError> {
        if !self.state().is_active() {
            return Ok(self.idle_report());
        }

        let events = self.decoder.flush();
        match self.apply_events(events, &|| false)? {
            Progress::Ended(report) => Ok(report),
            Progress::Streaming | Progress::Idle => Ok(self.end(TurnOutcome::Completed)),
        }
    }

    /// End the turn with a transport failure.
    pub fn fail(&mut self, err: &TransportError) {
        if !self.state().is_active() {
            return;
        }
        tracing::warn!(
            session_id = %self.session_id,
            error_code = err.error_code(),
            "Turn failed: {}",
            err
        );
        self.end(TurnOutcome::Failed);
    }

    /// End the turn because the caller cancelled it.
    pub fn abort(&mut self) -> TurnReport {
        if !self.state().is_active() {
            return self.idle_report();
        }
        if self.discard_partial_on_abort {
            if let Some(turn) = &self.turn {
                if self.transcript.discard_turn(turn) {
                    tracing::debug!(session_id = %self.session_id, "Discarded partial reply");
                }
            }
        }
        self.end(TurnOutcome::Aborted)
    }

    fn apply_events<F>(
        &mut self,
        events: Vec<DecoderEvent>,
        cancelled: &F,
    ) -> Result<Progress, TransportError>
    where
        F: Fn() -> bool,
    {
        for event in events {
            match event {
                DecoderEvent::Fragment(delta) => {
                    if cancelled() {
                        return Ok(Progress::Ended(self.abort()));
                    }
                    if let Some(turn) = self.turn.as_mut() {
                        self.transcript.apply_fragment(turn, &delta);
                    }
                }
                DecoderEvent::Error(message) => {
                    let err = TransportError::Backend(message);
                    self.fail(&err);
                    return Err(err);
                }
                DecoderEvent::Done => {
                    return Ok(Progress::Ended(self.end(TurnOutcome::Completed)));
                }
            }
        }
        Ok(Progress::Streaming)
    }

    fn end(&mut self, outcome: TurnOutcome) -> TurnReport {
        let report = match self.turn.take() {
            Some(turn) => {
                self.transcript.end_turn(&turn, outcome);
                TurnReport {
                    outcome,
                    reply: turn.content().to_string(),
                    fragments: turn.fragment_count(),
                }
            }
            None => TurnReport {
                outcome,
                reply: String::new(),
                fragments: 0,
            },
        };
        self.decoder.reset();
        self.set_state(outcome.into());

        tracing::info!(
            session_id = %self.session_id,
            ?outcome,
            fragments = report.fragments,
            "Turn ended"
        );
        report
    }

    /// Report for calls made after the turn already ended.
    fn idle_report(&self) -> TurnReport {
        let outcome = match self.state() {
            StreamState::Failed => TurnOutcome::Failed,
            StreamState::Aborted => TurnOutcome::Aborted,
            _ => TurnOutcome::Completed,
        };
        TurnReport {
            outcome,
            reply: String::new(),
            fragments: 0,
        }
    }
}
