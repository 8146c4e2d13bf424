//! Keyword rule-table selector
//!
//! Each rule names a backend and the keywords that favour it. A prompt is
//! scored against every rule by counting keyword hits; the backend with the
//! most hits wins and confidence is its share of all hits.

use async_trait::async_trait;
use crosscheck_application::{BackendSelector, SelectorError};
use crosscheck_domain::BackendSelection;
use std::collections::BTreeMap;
use tracing::debug;

/// One row of the rule table.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordRule {
    pub backend: String,
    /// Matched case-insensitively as substrings
    pub keywords: Vec<String>,
}

impl KeywordRule {
    pub fn new<I, S>(backend: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            backend: backend.into(),
            keywords: keywords
                .into_iter()
                .map(|k| k.into().to_lowercase())
                .collect(),
        }
    }

    fn hits(&self, prompt: &str) -> usize {
        self.keywords
            .iter()
            .filter(|k| !k.is_empty() && prompt.contains(k.as_str()))
            .count()
    }
}

/// Rule-table selector.
///
/// Prompts that match no rule go to the default backend with the default
/// confidence. The selector never fails unless it has neither rules nor a
/// default.
#[derive(Debug, Clone)]
pub struct KeywordSelector {
    rules: Vec<KeywordRule>,
    default_backend: Option<String>,
    default_confidence: f64,
}

impl KeywordSelector {
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        Self {
            rules,
            default_backend: None,
            default_confidence: 0.1,
        }
    }

    pub fn with_default(mut self, backend: impl Into<String>, confidence: f64) -> Self {
        self.default_backend = Some(backend.into());
        self.default_confidence = confidence;
        self
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    fn fallback(&self) -> Result<BackendSelection, SelectorError> {
        self.default_backend
            .as_deref()
            .or_else(|| self.rules.first().map(|r| r.backend.as_str()))
            .map(|backend| BackendSelection::only(backend, self.default_confidence))
            .ok_or_else(|| SelectorError::Unavailable("no rules and no default backend".to_string()))
    }
}

#[async_trait]
impl BackendSelector for KeywordSelector {
    async fn select_backend(&self, prompt: &str) -> Result<BackendSelection, SelectorError> {
        let prompt = prompt.to_lowercase();

        let mut scores: BTreeMap<String, usize> = BTreeMap::new();
        for rule in &self.rules {
            *scores.entry(rule.backend.clone()).or_default() += rule.hits(&prompt);
        }

        let total: usize = scores.values().sum();
        if total == 0 {
            debug!("No keyword matched, using default backend");
            return self.fallback();
        }

        // First rule wins ties, so walk rules in table order.
        let mut best: Option<(&str, usize)> = None;
        for rule in &self.rules {
            let score = scores.get(&rule.backend).copied().unwrap_or(0);
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((rule.backend.as_str(), score));
            }
        }
        let Some((backend, score)) = best else {
            return self.fallback();
        };

        let confidence = scores
            .iter()
            .map(|(name, hits)| (name.clone(), *hits as f64 / total as f64))
            .collect();
        debug!(backend = backend, hits = score, "Keyword selector chose backend");
        Ok(BackendSelection::new(backend, confidence))
    }
}
