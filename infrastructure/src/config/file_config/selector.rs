//! Selector configuration from TOML (`[selector]` section)

use crate::selector::{KeywordRule, KeywordSelector};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSelectorConfig {
    pub rules: Vec<FileSelectorRule>,
}

/// One `[[selector.rules]]` row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSelectorRule {
    pub backend: String,
    pub keywords: Vec<String>,
}

impl FileSelectorConfig {
    pub fn to_selector(&self, default_backend: Option<&str>, confidence: f64) -> KeywordSelector {
        let rules = self
            .rules
            .iter()
            .map(|r| KeywordRule::new(r.backend.as_str(), r.keywords.iter().map(String::as_str)))
            .collect();
        let selector = KeywordSelector::new(rules);
        match default_backend {
            Some(backend) => selector.with_default(backend, confidence),
            None => selector,
        }
    }
}
