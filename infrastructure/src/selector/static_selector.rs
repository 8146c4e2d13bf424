//! Selector that always picks the same backend

use async_trait::async_trait;
use crosscheck_application::{BackendSelector, SelectorError};
use crosscheck_domain::BackendSelection;

/// Always selects one fixed backend with a fixed confidence.
#[derive(Debug, Clone)]
pub struct StaticSelector {
    backend: String,
    confidence: f64,
}

impl StaticSelector {
    pub fn new(backend: impl Into<String>, confidence: f64) -> Self {
        Self {
            backend: backend.into(),
            confidence,
        }
    }
}

#[async_trait]
impl BackendSelector for StaticSelector {
    async fn select_backend(&self, _prompt: &str) -> Result<BackendSelection, SelectorError> {
        Ok(BackendSelection::only(self.backend.as_str(), self.confidence))
    }
}
