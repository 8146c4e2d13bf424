//! HTTP adapter for OpenAI-compatible chat-completion backends.
//!
//! [`ChatCompletionsClient`] implements the
//! [`BackendClient`](crosscheck_application::BackendClient) port. It sends one
//! request per call and converts every reqwest failure into a
//! [`TransportError`](crosscheck_application::TransportError); retrying and
//! key rotation happen above this layer.

mod client;
mod protocol;

pub use client::{ChatCompletionsClient, parse_retry_after};
pub use protocol::{ChatMessage, ChatRequest, ChatResponse};
