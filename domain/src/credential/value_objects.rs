//! Credential value objects: leases, rotation outcomes and status snapshots.

use crate::core::string::mask_secret;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A credential handed out for one outbound call.
///
/// Carries a copy of the secret so the pool lock can be released before any
/// network I/O happens.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyLease {
    provider: String,
    index: usize,
    secret: String,
}

impl KeyLease {
    pub fn new(provider: impl Into<String>, index: usize, secret: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            index,
            secret: secret.into(),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl std::fmt::Debug for KeyLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyLease")
            .field("provider", &self.provider)
            .field("index", &self.index)
            .field("secret", &mask_secret(&self.secret))
            .finish()
    }
}

/// Result of marking the current key as rate-limited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationOutcome {
    pub from_index: usize,
    pub to_index: usize,
    /// `false` when every key is limited and none has recovered
    pub rotated: bool,
}

/// One entry in the rotation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationEvent {
    pub provider: String,
    pub from_index: usize,
    pub to_index: usize,
    pub rotated: bool,
    /// Caller-supplied reason, usually the provider's error text
    pub context: String,
    pub at: DateTime<Utc>,
}

/// Per-key diagnostic row. Never contains the raw secret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyStatus {
    pub index: usize,
    pub masked_key: String,
    pub is_current: bool,
    pub rate_limited: bool,
    pub usable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovers_in_secs: Option<i64>,
    pub request_count: u64,
}

/// Diagnostic snapshot of one pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolStatus {
    pub provider: String,
    pub current_index: usize,
    pub request_count: u64,
    pub keys: Vec<KeyStatus>,
}

impl PoolStatus {
    pub fn usable_keys(&self) -> usize {
        self.keys.iter().filter(|k| k.usable).count()
    }
}
