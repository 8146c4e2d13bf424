//! Retry configuration from TOML (`[retry]` section)

use crosscheck_application::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw retry configuration from TOML (milliseconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRetryConfig {
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub max_total_time_ms: u64,
    pub attempt_timeout_ms: u64,
}

impl Default for FileRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_backoff_ms: 500,
            max_backoff_ms: 10_000,
            max_total_time_ms: 60_000,
            attempt_timeout_ms: 30_000,
        }
    }
}

impl FileRetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(self.max_attempts)
            .with_base_backoff(Duration::from_millis(self.base_backoff_ms))
            .with_max_backoff(Duration::from_millis(self.max_backoff_ms))
            .with_max_total_time(Duration::from_millis(self.max_total_time_ms))
            .with_attempt_timeout(Duration::from_millis(self.attempt_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_policy_defaults() {
        assert_eq!(FileRetryConfig::default().to_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_partial_section() {
        let config: super::super::FileConfig = toml::from_str(
            r#"
[retry]
max_attempts = 2
attempt_timeout_ms = 5000
"#,
        )
        .unwrap();
        let policy = config.retry.to_policy();
        assert_eq!(policy.max_attempts, 2);
        assert_eq!(policy.attempt_timeout, Duration::from_secs(5));
        assert_eq!(policy.base_backoff, Duration::from_millis(500));
    }
}
