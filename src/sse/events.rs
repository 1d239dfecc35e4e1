//! Frame and decoder event type definitions.

/// One classified line of the event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Comment or keep-alive line (starts with ':')
    Comment(String),
    /// Empty (or whitespace-only) line
    Blank,
    /// `data: ` line, with the prefix removed and the payload trimmed
    Data(String),
    /// `data: [DONE]` - end of stream
    Sentinel,
    /// Anything else (including `data:` without the trailing space)
    Unrecognized(String),
}

impl Frame {
    /// Short name used in trace output.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Frame::Comment(_) => "comment",
            Frame::Blank => "blank",
            Frame::Data(_) => "data",
            Frame::Sentinel => "sentinel",
            Frame::Unrecognized(_) => "unrecognized",
        }
    }

    /// True for lines that begin a new frame: data, sentinel and blank.
    ///
    /// Comments and unrecognized lines may still be the tail of a data
    /// payload that was cut by a terminator.
    pub fn starts_frame(&self) -> bool {
        matches!(self, Frame::Data(_) | Frame::Sentinel | Frame::Blank)
    }
}

/// What the decoder hands to the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoderEvent {
    /// A non-empty content delta from `choices[0].delta.content`
    Fragment(String),
    /// The backend reported an error inside the stream
    Error(String),
    /// The sentinel was observed; no further events follow
    Done,
}

impl DecoderEvent {
    /// Convenience accessor for fragment text.
    pub fn as_fragment(&self) -> Option<&str> {
        match self {
            DecoderEvent::Fragment(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// True for events after which the stream is over.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DecoderEvent::Done | DecoderEvent::Error(_))
    }
}

/// Outcome of decoding a single data payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadOutcome {
    /// Valid JSON carrying a non-empty content delta
    Fragment(String),
    /// Valid JSON carrying a top-level error member
    Error(String),
    /// Valid JSON without content (heartbeat, role-only delta, finish marker)
    Empty,
    /// Not valid JSON (yet)
    Malformed,
}
