//! Incremental UTF-8 decoding for chunked byte streams.
//!
//! Network chunks can end in the middle of a multi-byte character. The
//! trailing partial sequence is held back and prepended to the next chunk.

/// Streaming UTF-8 decoder.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    /// Bytes of a character that has not been completed yet (at most 3)
    incomplete: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `chunk` as forms complete characters.
    ///
    /// Invalid sequences become U+FFFD. An incomplete sequence at the end
    /// of the chunk is kept for the next call.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.incomplete);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&rest[..valid_up_to]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &rest[valid_up_to + len..];
                        }
                        None => {
                            self.incomplete = rest[valid_up_to..].to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Decode whatever is still held back. Called once at end of stream.
    pub fn finish(&mut self) -> String {
        let tail = std::mem::take(&mut self.incomplete);
        String::from_utf8_lossy(&tail).into_owned()
    }

    /// Number of bytes currently held back.
    pub fn pending_len(&self) -> usize {
        self.incomplete.len()
    }
}
