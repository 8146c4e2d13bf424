//! Credential rotation settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for [`KeyRotationManager`](crate::rotation::KeyRotationManager).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationSettings {
    /// Time after which a rate-limited key is usable again.
    pub recovery_window: Duration,
    /// Capacity of the rotation history ring buffer.
    pub history_capacity: usize,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            recovery_window: Duration::from_secs(15 * 60),
            history_capacity: 256,
        }
    }
}

impl RotationSettings {
    pub fn with_recovery_window(mut self, window: Duration) -> Self {
        self.recovery_window = window;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Recovery window as a chrono duration (saturating).
    pub fn recovery_window_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.recovery_window).unwrap_or(chrono::Duration::MAX)
    }
}
