//! Backend selector port
//!
//! The strategy that picks the "best" backend for a prompt (rule table,
//! classifier, router model) sits behind this single-method interface.

use async_trait::async_trait;
use crosscheck_domain::BackendSelection;
use thiserror::Error;

/// Errors a selector may report. The engine treats every variant as
/// "use the configured default".
#[derive(Error, Debug)]
pub enum SelectorError {
    #[error("Selector unavailable: {0}")]
    Unavailable(String),

    #[error("Selector timed out")]
    Timeout,
}

/// Chooses the primary backend for a prompt.
///
/// Implementations must not fail on malformed input; they should return a
/// low-confidence choice instead.
#[async_trait]
pub trait BackendSelector: Send + Sync {
    async fn select_backend(&self, prompt: &str) -> Result<BackendSelection, SelectorError>;
}
