//! Streaming response decoder
//!
//! Decodes the newline-delimited event stream of a chat completion
//! endpoint. The format consists of:
//! - `data: <json>` - a completion chunk; the delta text is read from
//!   `choices[0].delta.content`
//! - `data: [DONE]` - end of stream
//! - Lines starting with `:` - comments / keep-alives (ignored)
//! - Blank lines and any other line (ignored)
//!
//! # Module structure
//! - `events` - Frame and decoder event types
//! - `payloads` - Internal payload deserialization structs
//! - `parser` - Line classification and the stateful `FrameDecoder`
//! - `utf8` - Incremental UTF-8 decoding across chunk boundaries
//! - `stream` - Adapter from a response body to a stream of events

mod events;
mod parser;
pub(crate) mod payloads;
mod stream;
mod utf8;

pub use events::{DecoderEvent, Frame, PayloadOutcome};
pub use parser::{classify_line, FrameDecoder, DATA_PREFIX, DONE_SENTINEL};
pub use stream::{decode_stream, EventStream};
pub use utf8::Utf8Decoder;
