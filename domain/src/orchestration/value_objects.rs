//! Orchestration value objects - immutable result types for dispatch requests.
//!
//! - [`CallAttemptResult`] - outcome of one resilient call
//! - [`BackendResponse`] - a call result tagged with backend and role
//! - [`BackendSelection`] - what the selector chose, with confidences
//! - [`OrchestrationResult`] - complete result of one request
//! - [`RefinementResult`] - outcome of an explicit refinement

use super::entities::Phase;
use crate::core::error::ErrorKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Token counts reported by a backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn total(total_tokens: u64) -> Self {
        Self {
            total_tokens,
            ..Default::default()
        }
    }
}

/// Outcome of one resilient call, including all of its retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallAttemptResult {
    pub success: bool,
    /// Completion text (empty on failure)
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Last error text seen
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub usage: TokenUsage,
    pub cost: f64,
    pub latency_ms: u64,
    /// Number of outbound attempts made
    pub attempts: u32,
    /// Index of the credential used by the final attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_index: Option<usize>,
}

impl CallAttemptResult {
    pub fn success(content: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            success: true,
            content: content.into(),
            error_kind: None,
            error: None,
            usage,
            cost: 0.0,
            latency_ms: 0,
            attempts: 1,
            key_index: None,
        }
    }

    pub fn failure(kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            success: false,
            content: String::new(),
            error_kind: Some(kind),
            error: Some(error.into()),
            usage: TokenUsage::default(),
            cost: 0.0,
            latency_ms: 0,
            attempts: 0,
            key_index: None,
        }
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn with_key_index(mut self, index: Option<usize>) -> Self {
        self.key_index = index;
        self
    }
}

/// Why a backend was called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseRole {
    Primary,
    Critique,
    Refinement,
}

/// A [`CallAttemptResult`] tagged with its backend and role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendResponse {
    pub backend: String,
    pub role: ResponseRole,
    pub result: CallAttemptResult,
}

impl BackendResponse {
    pub fn new(backend: impl Into<String>, role: ResponseRole, result: CallAttemptResult) -> Self {
        Self {
            backend: backend.into(),
            role,
            result,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.success
    }

    pub fn content(&self) -> &str {
        &self.result.content
    }
}

/// Backend chosen for the primary call, with per-backend confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSelection {
    pub backend: String,
    pub confidence: BTreeMap<String, f64>,
}

impl BackendSelection {
    pub fn new(backend: impl Into<String>, confidence: BTreeMap<String, f64>) -> Self {
        Self {
            backend: backend.into(),
            confidence,
        }
    }

    /// Selection with a single confidence entry for `backend`.
    pub fn only(backend: impl Into<String>, confidence: f64) -> Self {
        let backend = backend.into();
        let mut map = BTreeMap::new();
        map.insert(backend.clone(), confidence);
        Self {
            backend,
            confidence: map,
        }
    }
}

/// Complete result of one orchestration request.
///
/// Always produced once dispatch begins; partial failure is expressed through
/// `success` and `error_summary`, never by an error return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationResult {
    pub prompt: String,
    /// Backend that produced the primary response (the selector's choice
    /// when every fallback failed)
    pub selected_backend: String,
    pub confidence: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector_error: Option<String>,
    /// Backends tried for the primary call, in order
    pub tried_backends: Vec<String>,
    pub primary: BackendResponse,
    /// Critiques in dispatch order
    pub critiques: Vec<BackendResponse>,
    pub total_cost: f64,
    pub total_latency_ms: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_summary: Option<String>,
    #[serde(default)]
    pub phases: Vec<Phase>,
}

impl OrchestrationResult {
    /// Assemble the final result: sums cost and latency, and derives overall
    /// success (primary succeeded and at least one critique succeeded).
    pub fn aggregate(
        prompt: impl Into<String>,
        selection: BackendSelection,
        selector_error: Option<String>,
        tried_backends: Vec<String>,
        primary: BackendResponse,
        critiques: Vec<BackendResponse>,
    ) -> Self {
        let total_cost =
            primary.result.cost + critiques.iter().map(|c| c.result.cost).sum::<f64>();
        let total_latency_ms = primary.result.latency_ms
            + critiques.iter().map(|c| c.result.latency_ms).sum::<u64>();

        let succeeded = critiques.iter().filter(|c| c.is_success()).count();
        let success = primary.is_success() && succeeded > 0;

        let error_summary = if success {
            None
        } else {
            let mut parts = Vec::new();
            if !primary.is_success() {
                parts.push(format!(
                    "primary failed on {}: {}",
                    tried_backends.join(", "),
                    primary.result.error.as_deref().unwrap_or("unknown error")
                ));
            }
            if critiques.is_empty() {
                parts.push("no critique backends available".to_string());
            } else if succeeded == 0 {
                parts.push(format!(
                    "{} of {} critiques succeeded",
                    succeeded,
                    critiques.len()
                ));
            }
            Some(parts.join("; "))
        };

        let selected_backend = if primary.is_success() {
            primary.backend.clone()
        } else {
            selection.backend.clone()
        };

        Self {
            prompt: prompt.into(),
            selected_backend,
            confidence: selection.confidence,
            selector_error,
            tried_backends,
            primary,
            critiques,
            total_cost,
            total_latency_ms,
            success,
            error_summary,
            phases: Vec::new(),
        }
    }

    pub fn with_phases(mut self, phases: Vec<Phase>) -> Self {
        self.phases = phases;
        self
    }

    pub fn successful_critiques(&self) -> usize {
        self.critiques.iter().filter(|c| c.is_success()).count()
    }

    pub fn critique_from(&self, backend: &str) -> Option<&BackendResponse> {
        self.critiques.iter().find(|c| c.backend == backend)
    }

    /// e.g. "3 of 5 critiques succeeded"
    pub fn critique_summary(&self) -> String {
        format!(
            "{} of {} critiques succeeded",
            self.successful_critiques(),
            self.critiques.len()
        )
    }
}

/// Outcome of refining a primary answer with a chosen critique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementResult {
    pub prompt: String,
    /// Backend whose critique was applied
    pub critique_source: String,
    pub response: BackendResponse,
}

impl RefinementResult {
    pub fn success(&self) -> bool {
        self.response.is_success()
    }
}
