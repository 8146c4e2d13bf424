//! Backend client port
//!
//! Defines the interface for sending one chat-completion request to one
//! backend with one credential. Retrying, rotation and fallback live above
//! this port; adapters perform exactly one request per call.

use async_trait::async_trait;
use crosscheck_domain::{ErrorKind, TokenUsage, mentions_rate_limit, is_rate_limit_signal};
use std::time::Duration;
use thiserror::Error;

/// Errors from a single outbound request.
///
/// This is the only place transport failures are translated into the
/// [`ErrorKind`] taxonomy (see [`TransportError::kind`]).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Rate limited (HTTP {status}): {message}")]
    RateLimited {
        status: u16,
        message: String,
        /// Pause requested by the provider (`Retry-After`)
        retry_after: Option<Duration>,
    },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    Unreachable(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl TransportError {
    /// Whether this failure is a rate-limit signal: an explicit 429, or an
    /// error body mentioning a rate-limit phrase.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            TransportError::RateLimited { .. } => true,
            TransportError::Http { status, body } => is_rate_limit_signal(*status, body),
            TransportError::Other(message) => mentions_rate_limit(message),
            _ => false,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            TransportError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        if self.is_rate_limit() {
            return ErrorKind::RateLimited;
        }
        match self {
            TransportError::Timeout(_) => ErrorKind::Timeout,
            TransportError::Unreachable(_) => ErrorKind::Unreachable,
            TransportError::Http { status, .. } if *status >= 500 => ErrorKind::Unreachable,
            TransportError::InvalidResponse(_) => ErrorKind::InvalidResponse,
            _ => ErrorKind::Unknown,
        }
    }
}

/// One chat-completion request.
///
/// Rendered on the wire as
/// `{model, messages:[{role:"user", content}], max_tokens, temperature}`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Backend name, used by adapters to pick the endpoint
    pub backend: String,
    /// Wire model id
    pub model: String,
    /// User message content
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// A successful completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub usage: TokenUsage,
}

impl Completion {
    pub fn new(content: impl Into<String>, total_tokens: u64) -> Self {
        Self {
            content: content.into(),
            usage: TokenUsage::total(total_tokens),
        }
    }
}

/// Client for chat-completion backends
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Send one request with one credential.
    async fn complete(
        &self,
        request: &CompletionRequest,
        api_key: &str,
    ) -> Result<Completion, TransportError>;
}
