//! Line classification and the stateful frame decoder
//!
//! Contains [`FrameDecoder`], which turns raw body chunks into
//! [`DecoderEvent`]s, and [`classify_line`], the per-line frame rules.

mod content;

use crate::sse::events::{DecoderEvent, Frame, PayloadOutcome};
use crate::sse::utf8::Utf8Decoder;

use content::{decode_joined_payload, decode_payload};

/// Prefix of a data line. The space is part of the prefix.
pub const DATA_PREFIX: &str = "data: ";

/// Payload that marks the end of the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Classify a single line (terminator already removed).
pub fn classify_line(line: &str) -> Frame {
    if let Some(comment) = line.strip_prefix(':') {
        return Frame::Comment(comment.trim().to_string());
    }

    if line.trim().is_empty() {
        return Frame::Blank;
    }

    if let Some(rest) = line.strip_prefix(DATA_PREFIX) {
        let payload = rest.trim();
        if payload == DONE_SENTINEL {
            return Frame::Sentinel;
        }
        return Frame::Data(payload.to_string());
    }

    Frame::Unrecognized(line.to_string())
}

/// Strip the `\n` terminator and one preceding `\r`.
fn strip_terminator(raw: &str) -> &str {
    let line = raw.strip_suffix('\n').unwrap_or(raw);
    line.strip_suffix('\r').unwrap_or(line)
}

/// What line extraction should do after a line was processed.
enum LineStep {
    /// Keep extracting
    Continue,
    /// A data line was restored; stop for this feed call
    Stop,
    /// Sentinel or error frame seen; decoding is over
    Finished,
}

/// Stateful decoder for one response stream.
///
/// Bytes go in through [`feed`](Self::feed); complete lines are classified
/// and turned into events immediately. Whatever is left when the body ends
/// is recovered by [`flush`](Self::flush).
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Holds back split multi-byte characters
    utf8: Utf8Decoder,
    /// Decoded text without a line terminator yet
    pending: String,
    /// Payload of a data line whose JSON did not parse. Logically sits
    /// ahead of `pending` and is retried before any later line.
    restored: Option<String>,
    /// Set once the sentinel (or an error frame) has been seen
    finished: bool,
}

impl FrameDecoder {
    /// Create a decoder for a new stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of the response body.
    ///
    /// Returns the events decoded from every line the chunk completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<DecoderEvent> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }

        let text = self.utf8.decode(chunk);
        self.pending.push_str(&text);

        while let Some(end) = self.pending.find('\n') {
            let raw: String = self.pending.drain(..=end).collect();
            match self.process_line(strip_terminator(&raw), &mut events, false) {
                LineStep::Continue => {}
                LineStep::Stop | LineStep::Finished => break,
            }
        }

        events
    }

    /// Recover whatever is still buffered once the body has ended.
    ///
    /// The residue may hold several unterminated lines; each is classified
    /// exactly as in [`feed`](Self::feed) but nothing is buffered again.
    /// Calling this on an empty buffer does nothing.
    pub fn flush(&mut self) -> Vec<DecoderEvent> {
        let mut events = Vec::new();
        let tail = self.utf8.finish();

        if self.finished {
            self.pending.clear();
            self.restored = None;
            return events;
        }

        self.pending.push_str(&tail);
        let residue = std::mem::take(&mut self.pending);
        for raw in residue.split_inclusive('\n') {
            if let LineStep::Finished =
                self.process_line(strip_terminator(raw), &mut events, true)
            {
                break;
            }
        }

        if let Some(held) = self.restored.take() {
            tracing::debug!(
                payload_len = held.len(),
                "Dropping malformed data frame at end of stream"
            );
        }

        events
    }

    /// True once the sentinel or an error frame has ended decoding.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Text received but not yet resolved into a complete line.
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// True while a data line is waiting to be completed.
    pub fn has_restored_line(&self) -> bool {
        self.restored.is_some()
    }

    /// Reset all buffered state for a new stream.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn process_line(
        &mut self,
        line: &str,
        events: &mut Vec<DecoderEvent>,
        final_pass: bool,
    ) -> LineStep {
        let frame = classify_line(line);

        if let Some(held) = self.restored.take() {
            let joined = format!("{}\n{}", held, line);
            match decode_joined_payload(&joined) {
                PayloadOutcome::Malformed if !frame.starts_frame() => {
                    self.restored = Some(joined);
                    return LineStep::Continue;
                }
                // A new frame started, so the restored line can never complete
                PayloadOutcome::Malformed => {
                    tracing::debug!(payload_len = held.len(), "Dropping malformed data frame");
                }
                outcome => return self.emit(outcome, events),
            }
        }

        match frame {
            Frame::Sentinel => {
                tracing::debug!("Stream sentinel received");
                self.finished = true;
                events.push(DecoderEvent::Done);
                LineStep::Finished
            }
            Frame::Data(payload) => match decode_payload(&payload) {
                PayloadOutcome::Malformed => {
                    self.restored = Some(payload);
                    if final_pass {
                        LineStep::Continue
                    } else {
                        LineStep::Stop
                    }
                }
                outcome => self.emit(outcome, events),
            },
            other => {
                tracing::trace!(kind = other.kind_name(), "Skipping frame");
                LineStep::Continue
            }
        }
    }

    fn emit(&mut self, outcome: PayloadOutcome, events: &mut Vec<DecoderEvent>) -> LineStep {
        match outcome {
            PayloadOutcome::Fragment(text) => {
                events.push(DecoderEvent::Fragment(text));
                LineStep::Continue
            }
            PayloadOutcome::Error(message) => {
                self.finished = true;
                events.push(DecoderEvent::Error(message));
                LineStep::Finished
            }
            PayloadOutcome::Empty | PayloadOutcome::Malformed => LineStep::Continue,
        }
    }
}
