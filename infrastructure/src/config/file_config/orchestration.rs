//! Orchestration configuration from TOML (`[orchestration]` section)

use crosscheck_application::OrchestrationParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOrchestrationConfig {
    /// Used when the selector fails
    pub default_backend: Option<String>,
    pub default_confidence: f64,
    pub critique_concurrency: usize,
    pub fallback_order: Vec<String>,
    pub request_deadline_ms: Option<u64>,
    pub selector_timeout_ms: u64,
    pub temperature: f32,
}

impl Default for FileOrchestrationConfig {
    fn default() -> Self {
        Self {
            default_backend: None,
            default_confidence: 0.1,
            critique_concurrency: 6,
            fallback_order: Vec::new(),
            request_deadline_ms: None,
            selector_timeout_ms: 10_000,
            temperature: 0.7,
        }
    }
}

impl FileOrchestrationConfig {
    pub fn to_params(&self) -> OrchestrationParams {
        let mut params = OrchestrationParams::default()
            .with_default_confidence(self.default_confidence)
            .with_fallback_order(self.fallback_order.clone())
            .with_critique_concurrency(self.critique_concurrency)
            .with_request_deadline(self.request_deadline_ms.map(Duration::from_millis))
            .with_selector_timeout(Duration::from_millis(self.selector_timeout_ms));
        if let Some(backend) = &self.default_backend {
            params = params.with_default_backend(backend.as_str());
        }
        params
    }
}
