//! Adapts a response body into a stream of decoder events.

use std::collections::VecDeque;
use std::pin::Pin;

use futures::stream::{self, Stream};
use futures_util::StreamExt;

use crate::error::TransportError;
use crate::traits::ByteStream;

use super::{DecoderEvent, FrameDecoder};

/// Lazily decoded events of one response body.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<DecoderEvent, TransportError>> + Send>>;

struct DecodeState {
    body: ByteStream,
    decoder: FrameDecoder,
    queued: VecDeque<DecoderEvent>,
    done: bool,
}

/// Decode `body` as it arrives.
///
/// The stream ends after the sentinel, an error frame, a body read
/// failure (yielded once as `Err`), or end of body followed by a flush.
pub fn decode_stream(body: ByteStream) -> EventStream {
    let state = DecodeState {
        body,
        decoder: FrameDecoder::new(),
        queued: VecDeque::new(),
        done: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.queued.pop_front() {
                if event.is_terminal() {
                    state.queued.clear();
                    state.done = true;
                }
                return Some((Ok(event), state));
            }

            if state.done {
                return None;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => {
                    state.queued.extend(state.decoder.feed(&chunk));
                }
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(TransportError::from(e)), state));
                }
                None => {
                    state.done = true;
                    state.queued.extend(state.decoder.flush());
                }
            }
        }
    }))
}
