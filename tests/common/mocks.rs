//! Mock configurations for integration tests.
//!
//! Re-exports the mocks from `chatstream::adapters::mock` and adds a
//! builder for the response scripts the tests use most.

pub use chatstream::adapters::mock::{MockHttpClient, MockResponse};
pub use chatstream::traits::{Headers, HttpClient, HttpError};

use bytes::Bytes;

/// Builder for a [`MockHttpClient`] with a scripted default response.
pub struct MockHttpConfig {
    client: MockHttpClient,
}

impl MockHttpConfig {
    pub fn new() -> Self {
        Self {
            client: MockHttpClient::new(),
        }
    }

    /// Respond 200 and deliver the body as exactly these chunks.
    pub fn with_chunks<I, S>(self, chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.client.set_default_response(MockResponse::sse(chunks));
        self
    }

    /// Respond 200 and deliver raw byte chunks (for split code points).
    pub fn with_byte_chunks(self, chunks: Vec<Vec<u8>>) -> Self {
        self.client.set_default_response(MockResponse::Stream {
            status: 200,
            chunks: chunks.into_iter().map(Bytes::from).collect(),
        });
        self
    }

    /// Deliver these chunks, then keep the body open forever.
    pub fn with_held_open<I, S>(self, chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.client.set_default_response(MockResponse::Pending {
            chunks: chunks
                .into_iter()
                .map(|chunk| Bytes::from(chunk.into()))
                .collect(),
        });
        self
    }

    /// Respond with a non-2xx status and body.
    pub fn with_status(self, status: u16, body: &str) -> Self {
        self.client
            .set_default_response(MockResponse::status(status, body));
        self
    }

    /// Fail before any response arrives.
    pub fn with_error(self, error: HttpError) -> Self {
        self.client.set_default_response(MockResponse::Error(error));
        self
    }

    pub fn build(self) -> MockHttpClient {
        self.client
    }
}

impl Default for MockHttpConfig {
    fn default() -> Self {
        Self::new()
    }
}
