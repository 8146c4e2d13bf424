//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application types.

mod backends;
mod orchestration;
mod output;
mod retry;
mod rotation;
mod selector;

pub use backends::FileBackendConfig;
pub use orchestration::FileOrchestrationConfig;
pub use output::{FileOutputConfig, FileOutputFormat};
pub use retry::FileRetryConfig;
pub use rotation::FileRotationConfig;
pub use selector::{FileSelectorConfig, FileSelectorRule};

use crosscheck_domain::{
    BackendCatalog, ConfigIssue, ConfigIssueCode, CredentialPool, DomainError,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Backends in configuration order (critique dispatch order)
    pub backends: Vec<FileBackendConfig>,
    /// Per-call retry budget
    pub retry: FileRetryConfig,
    /// Key recovery settings
    pub rotation: FileRotationConfig,
    /// Fallback order, critique width, deadlines
    pub orchestration: FileOrchestrationConfig,
    /// Keyword rule table
    pub selector: FileSelectorConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Errors make the configuration unusable; warnings describe settings
    /// that will be ignored or that make some calls fail.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        // 1. Backend table
        if self.backends.is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::NoBackends,
                "no [[backends]] configured",
            ));
        }
        let mut seen = HashSet::new();
        for backend in &self.backends {
            if backend.name.trim().is_empty() {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::EmptyBackendName,
                    "backend name cannot be empty",
                ));
                continue;
            }
            if !seen.insert(backend.name.as_str()) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::DuplicateBackend {
                        name: backend.name.clone(),
                    },
                    format!("backend '{}' is defined more than once", backend.name),
                ));
            }
            if !backend.has_credentials() {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::NoCredentials {
                        backend: backend.name.clone(),
                    },
                    format!(
                        "backend '{}' has no api_keys or api_key_envs; every call to it will fail",
                        backend.name
                    ),
                ));
            }
        }

        // 2. Cross references
        let mut check_ref = |field: &str, name: &str| {
            if !seen.contains(name) {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::UnknownBackend {
                        field: field.to_string(),
                        name: name.to_string(),
                    },
                    format!("{}: unknown backend '{}', ignored", field, name),
                ));
            }
        };
        for name in &self.orchestration.fallback_order {
            check_ref("orchestration.fallback_order", name);
        }
        if let Some(name) = &self.orchestration.default_backend {
            check_ref("orchestration.default_backend", name);
        }
        for rule in &self.selector.rules {
            check_ref("selector.rules.backend", &rule.backend);
        }

        // 3. Numeric ranges
        if self.orchestration.critique_concurrency == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidValue {
                    field: "orchestration.critique_concurrency".to_string(),
                    value: "0".to_string(),
                },
                "orchestration.critique_concurrency must be at least 1",
            ));
        }
        if self.retry.max_attempts == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidValue {
                    field: "retry.max_attempts".to_string(),
                    value: "0".to_string(),
                },
                "retry.max_attempts must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.orchestration.default_confidence) {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::InvalidValue {
                    field: "orchestration.default_confidence".to_string(),
                    value: self.orchestration.default_confidence.to_string(),
                },
                "orchestration.default_confidence should be between 0 and 1",
            ));
        }

        issues
    }

    pub fn to_catalog(&self) -> Result<BackendCatalog, DomainError> {
        BackendCatalog::new(
            self.backends
                .iter()
                .map(FileBackendConfig::to_backend)
                .collect(),
        )
    }

    /// Credential pools with `api_key_envs` read from the process environment.
    pub fn credential_pools(&self) -> Vec<CredentialPool> {
        self.credential_pools_with(|var| std::env::var(var).ok())
    }

    pub fn credential_pools_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Vec<CredentialPool> {
        self.backends.iter().map(|b| b.to_pool(&lookup)).collect()
    }

    /// Backend name to base URL
    pub fn endpoints(&self) -> HashMap<String, String> {
        self.backends
            .iter()
            .map(|b| (b.name.clone(), b.base_url.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosscheck_domain::{OutputFormat, Severity};

    const FULL: &str = r#"
[[backends]]
name = "alpha"
model = "alpha-large"
base_url = "https://alpha.example.com/v1"
cost_per_1k_tokens = 0.5
api_keys = ["sk-alpha-0000000000", "sk-alpha-1111111111"]

[[backends]]
name = "beta"
model = "beta-chat"
api_key_envs = ["BETA_KEY"]

[retry]
max_attempts = 3

[rotation]
recovery_window_secs = 60

[orchestration]
default_backend = "alpha"
fallback_order = ["beta"]

[[selector.rules]]
backend = "beta"
keywords = ["poem"]

[output]
format = "json"
color = false
"#;

    #[test]
    fn test_deserialize_full_config() {
        let config: FileConfig = toml::from_str(FULL).unwrap();
        assert_eq!(config.backends.len(), 2);
        assert_eq!(config.backends[0].api_keys.len(), 2);
        assert_eq!(config.backends[1].max_output_tokens, 1024);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.rotation.recovery_window_secs, 60);
        assert_eq!(config.orchestration.critique_concurrency, 6);
        assert_eq!(config.selector.rules[0].backend, "beta");
        assert_eq!(config.output.format, Some(OutputFormat::Json));
        assert!(!config.output.color);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_catalog_pools_and_endpoints() {
        let config: FileConfig = toml::from_str(FULL).unwrap();

        let catalog = config.to_catalog().unwrap();
        assert_eq!(catalog.names(), vec!["alpha", "beta"]);
        assert_eq!(catalog.get("alpha").unwrap().model_id, "alpha-large");

        let pools = config.credential_pools_with(|var| {
            (var == "BETA_KEY").then(|| "sk-beta-from-env".to_string())
        });
        assert_eq!(pools[0].len(), 2);
        assert_eq!(pools[1].len(), 1);

        let endpoints = config.endpoints();
        assert_eq!(endpoints["alpha"], "https://alpha.example.com/v1");
        assert_eq!(endpoints["beta"], "https://api.openai.com/v1");
    }

    #[test]
    fn test_default_config_has_no_backends() {
        let issues = FileConfig::default().validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, ConfigIssueCode::NoBackends);
        assert!(issues[0].is_error());
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let config: FileConfig = toml::from_str(
            r#"
[[backends]]
name = "alpha"
api_keys = ["k"]

[[backends]]
name = "alpha"
api_keys = ["k"]

[[backends]]
name = "bare"

[[backends]]
name = ""

[retry]
max_attempts = 0

[orchestration]
critique_concurrency = 0
default_backend = "ghost"
fallback_order = ["alpha", "phantom"]
"#,
        )
        .unwrap();

        let issues = config.validate();
        let codes: Vec<&ConfigIssueCode> = issues.iter().map(|i| &i.code).collect();

        assert!(codes.contains(&&ConfigIssueCode::DuplicateBackend {
            name: "alpha".to_string()
        }));
        assert!(codes.contains(&&ConfigIssueCode::EmptyBackendName));
        assert!(codes.contains(&&ConfigIssueCode::NoCredentials {
            backend: "bare".to_string()
        }));
        assert!(codes.contains(&&ConfigIssueCode::UnknownBackend {
            field: "orchestration.fallback_order".to_string(),
            name: "phantom".to_string()
        }));
        assert!(codes.contains(&&ConfigIssueCode::UnknownBackend {
            field: "orchestration.default_backend".to_string(),
            name: "ghost".to_string()
        }));
        assert_eq!(
            issues
                .iter()
                .filter(|i| matches!(i.code, ConfigIssueCode::InvalidValue { .. }))
                .count(),
            2
        );
        assert!(
            issues
                .iter()
                .any(|i| i.severity == Severity::Warning && i.message.contains("bare"))
        );
        assert!(config.to_catalog().is_err());
    }
}
