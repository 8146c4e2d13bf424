//! Backend value object and the ordered catalog of configured backends.

use super::error::DomainError;
use serde::{Deserialize, Serialize};

/// One text-generation backend (Value Object)
///
/// Static description of a provider: the name used throughout the engine,
/// the model id sent on the wire, and its pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backend {
    /// Name used for routing, credential pools and results (e.g. "Alpha")
    pub name: String,
    /// Model identifier sent in the chat-completion request
    pub model_id: String,
    /// Price in currency units per 1,000 tokens
    pub cost_per_1k_tokens: f64,
    /// Upper bound for `max_tokens` in requests
    pub max_output_tokens: u32,
}

impl Backend {
    pub fn new(name: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model_id: model_id.into(),
            cost_per_1k_tokens: 0.0,
            max_output_tokens: 1024,
        }
    }

    pub fn with_cost_per_1k(mut self, cost: f64) -> Self {
        self.cost_per_1k_tokens = cost;
        self
    }

    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = max;
        self
    }

    /// Cost of a call that consumed `total_tokens`.
    pub fn cost_for(&self, total_tokens: u64) -> f64 {
        total_tokens as f64 / 1000.0 * self.cost_per_1k_tokens
    }
}

/// Ordered, name-unique set of backends.
///
/// Order is configuration order; it is the default fallback order and the
/// dispatch order for critiques.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendCatalog {
    backends: Vec<Backend>,
}

impl BackendCatalog {
    pub fn new(backends: Vec<Backend>) -> Result<Self, DomainError> {
        for (i, backend) in backends.iter().enumerate() {
            if backends[..i].iter().any(|b| b.name == backend.name) {
                return Err(DomainError::DuplicateBackend(backend.name.clone()));
            }
        }
        Ok(Self { backends })
    }

    pub fn get(&self, name: &str) -> Option<&Backend> {
        self.backends.iter().find(|b| b.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Backend> {
        self.backends.iter()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
