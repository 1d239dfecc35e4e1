//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - streaming POST used to open a chat reply

pub mod http;

pub use http::{ByteStream, Headers, HttpClient, HttpError, StreamingResponse};
