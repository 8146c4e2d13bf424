//! Orchestration parameters: primary fallback and critique fan-out control.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parameters for [`RunOrchestrationUseCase`](crate::use_cases::run_orchestration::RunOrchestrationUseCase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationParams {
    /// Backend used when the selector is unavailable. `None` means the
    /// first configured backend.
    pub default_backend: Option<String>,
    /// Confidence recorded for the default backend on selector failure.
    pub default_confidence: f64,
    /// Primary fallback order. Empty means configuration order.
    pub fallback_order: Vec<String>,
    /// Maximum critique calls in flight per request.
    pub critique_concurrency: usize,
    /// Deadline for the whole request; cancels in-flight critiques.
    pub request_deadline: Option<Duration>,
    /// Time allowed for the selector before falling back to the default.
    pub selector_timeout: Duration,
}

impl Default for OrchestrationParams {
    fn default() -> Self {
        Self {
            default_backend: None,
            default_confidence: 0.1,
            fallback_order: Vec::new(),
            critique_concurrency: 6,
            request_deadline: None,
            selector_timeout: Duration::from_secs(10),
        }
    }
}

impl OrchestrationParams {
    // ==================== Builder Methods ====================

    pub fn with_default_backend(mut self, backend: impl Into<String>) -> Self {
        self.default_backend = Some(backend.into());
        self
    }

    pub fn with_fallback_order(mut self, order: Vec<String>) -> Self {
        self.fallback_order = order;
        self
    }

    pub fn with_critique_concurrency(mut self, width: usize) -> Self {
        self.critique_concurrency = width;
        self
    }

    pub fn with_request_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.request_deadline = deadline;
        self
    }

    pub fn with_default_confidence(mut self, confidence: f64) -> Self {
        self.default_confidence = confidence;
        self
    }

    pub fn with_selector_timeout(mut self, timeout: Duration) -> Self {
        self.selector_timeout = timeout;
        self
    }
}
