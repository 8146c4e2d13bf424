//! Retry policy: attempt budget and bounded exponential backoff.
//!
//! [`RetryPolicy`] is consumed by
//! [`ResilientCaller`](crate::use_cases::resilient_call::ResilientCaller) for
//! primary, critique and refinement calls alike.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry budget for one resilient call.
///
/// A call stops at whichever comes first: `max_attempts` outbound attempts,
/// or a next backoff that would cross `max_total_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum outbound attempts (at least 1 is always made).
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on every further retry.
    pub base_backoff: Duration,
    /// Upper bound for a single backoff delay.
    pub max_backoff: Duration,
    /// Wall-clock budget across all attempts and delays.
    pub max_total_time: Duration,
    /// Timeout for a single outbound attempt.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            max_total_time: Duration::from_secs(60),
            attempt_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    // ==================== Builder Methods ====================

    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    pub fn with_base_backoff(mut self, delay: Duration) -> Self {
        self.base_backoff = delay;
        self
    }

    pub fn with_max_backoff(mut self, delay: Duration) -> Self {
        self.max_backoff = delay;
        self
    }

    pub fn with_max_total_time(mut self, budget: Duration) -> Self {
        self.max_total_time = budget;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Delay before retry number `retry` (0-based).
    ///
    /// `base_backoff * 2^retry`, raised to `retry_after` when the provider
    /// asked for a longer pause, and capped at `max_backoff`.
    pub fn backoff_delay(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        let factor = 1u32.checked_shl(retry.min(31)).unwrap_or(u32::MAX);
        let computed = self.base_backoff.saturating_mul(factor);
        let delay = match retry_after {
            Some(hint) => computed.max(hint),
            None => computed,
        };
        delay.min(self.max_backoff)
    }
}
