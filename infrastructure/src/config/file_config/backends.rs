//! Backend configuration from TOML (`[[backends]]` array)

use crosscheck_domain::{Backend, CredentialPool};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One `[[backends]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    pub name: String,
    /// Wire model id sent in the request body
    pub model: String,
    /// Base URL; `/chat/completions` is appended
    pub base_url: String,
    pub cost_per_1k_tokens: f64,
    pub max_output_tokens: u32,
    /// Literal keys, in rotation order
    pub api_keys: Vec<String>,
    /// Environment variables holding further keys, resolved at load time
    pub api_key_envs: Vec<String>,
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            model: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            cost_per_1k_tokens: 0.0,
            max_output_tokens: 1024,
            api_keys: Vec::new(),
            api_key_envs: Vec::new(),
        }
    }
}

impl FileBackendConfig {
    pub fn to_backend(&self) -> Backend {
        let model = if self.model.is_empty() {
            self.name.as_str()
        } else {
            self.model.as_str()
        };
        Backend::new(self.name.as_str(), model)
            .with_cost_per_1k(self.cost_per_1k_tokens)
            .with_max_output_tokens(self.max_output_tokens)
    }

    /// Whether any key source is declared.
    pub fn has_credentials(&self) -> bool {
        !self.api_keys.is_empty() || !self.api_key_envs.is_empty()
    }

    /// Literal keys followed by keys read through `lookup`. Unset or empty
    /// variables are skipped with a warning.
    pub fn resolve_keys(&self, lookup: impl Fn(&str) -> Option<String>) -> Vec<String> {
        let mut keys: Vec<String> = self
            .api_keys
            .iter()
            .filter(|k| !k.trim().is_empty())
            .cloned()
            .collect();
        for var in &self.api_key_envs {
            match lookup(var).filter(|v| !v.trim().is_empty()) {
                Some(value) => keys.push(value),
                None => warn!(backend = %self.name, var = %var, "API key variable not set, skipping"),
            }
        }
        keys
    }

    pub fn to_pool(&self, lookup: impl Fn(&str) -> Option<String>) -> CredentialPool {
        CredentialPool::new(self.name.as_str(), self.resolve_keys(lookup))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_keys_from_env_lookup() {
        let backend = FileBackendConfig {
            name: "alpha".to_string(),
            api_keys: vec!["sk-literal".to_string(), " ".to_string()],
            api_key_envs: vec!["ALPHA_KEY_1".to_string(), "ALPHA_KEY_2".to_string()],
            ..Default::default()
        };
        let keys = backend.resolve_keys(|var| match var {
            "ALPHA_KEY_1" => Some("sk-from-env".to_string()),
            _ => None,
        });
        assert_eq!(keys, vec!["sk-literal", "sk-from-env"]);
    }

    #[test]
    fn test_model_defaults_to_name() {
        let backend = FileBackendConfig {
            name: "gpt-4o-mini".to_string(),
            cost_per_1k_tokens: 0.6,
            ..Default::default()
        };
        let converted = backend.to_backend();
        assert_eq!(converted.model_id, "gpt-4o-mini");
        assert_eq!(converted.max_output_tokens, 1024);
    }
}
