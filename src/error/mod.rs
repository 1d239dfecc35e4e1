//! Error types for chatstream.
//!
//! Only transport failures cross the library boundary. Framing noise
//! (unparseable or content-less data lines) is absorbed by the decoder and
//! never shows up here, and cancellation is a normal outcome rather than an
//! error.
//!
//! | Type | Raised when |
//! |------|-------------|
//! | [`TransportError`] | connection failure, non-2xx status, missing body, broken stream, backend error frame |
//! | [`SessionError`] | a turn could not start, or its transport failed |

mod session;
mod transport;

pub use session::SessionError;
pub use transport::TransportError;
