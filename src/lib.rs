//! chatstream - streaming chat completion client
//!
//! Decodes a chat endpoint's event stream incrementally and folds the
//! reply into a shared, observable transcript.

pub mod adapters;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod sse;
pub mod traits;
pub mod transcript;
