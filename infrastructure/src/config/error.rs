//! Configuration errors

use crosscheck_domain::{ConfigIssue, DomainError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid configuration: {}", summarize(.0))]
    Invalid(Vec<ConfigIssue>),

    #[error(transparent)]
    Catalog(#[from] DomainError),
}

fn summarize(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .filter(|i| i.is_error())
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
