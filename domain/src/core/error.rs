//! Domain error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failed dispatch.
///
/// Every outbound call ends either in success or in exactly one of these
/// kinds. The kind travels inside result values; it is never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A single attempt was rejected with a rate-limit signal.
    RateLimited,
    /// The attempt (or the request deadline) timed out.
    Timeout,
    /// Connection could not be established.
    Unreachable,
    /// The backend answered, but not with a usable completion.
    InvalidResponse,
    /// The backend selector could not produce a choice.
    SelectorUnavailable,
    /// Every credential in the backend's pool is rate-limited.
    AllKeysExhausted,
    /// Anything else.
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Unreachable => "unreachable",
            ErrorKind::InvalidResponse => "invalid_response",
            ErrorKind::SelectorUnavailable => "selector_unavailable",
            ErrorKind::AllKeysExhausted => "all_keys_exhausted",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("No backends configured")]
    NoBackends,

    #[error("Unknown backend: {0}")]
    UnknownBackend(String),

    #[error("Duplicate backend: {0}")]
    DuplicateBackend(String),

    #[error("Invalid prompt: {0}")]
    InvalidPrompt(String),
}
