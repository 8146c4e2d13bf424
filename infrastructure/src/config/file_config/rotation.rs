//! Rotation configuration from TOML (`[rotation]` section)

use crosscheck_application::RotationSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRotationConfig {
    /// Seconds before a rate-limited key is tried again
    pub recovery_window_secs: u64,
    /// Rotation events kept in memory
    pub history_capacity: usize,
}

impl Default for FileRotationConfig {
    fn default() -> Self {
        Self {
            recovery_window_secs: 15 * 60,
            history_capacity: 256,
        }
    }
}

impl FileRotationConfig {
    pub fn to_settings(&self) -> RotationSettings {
        RotationSettings::default()
            .with_recovery_window(Duration::from_secs(self.recovery_window_secs))
            .with_history_capacity(self.history_capacity)
    }
}
