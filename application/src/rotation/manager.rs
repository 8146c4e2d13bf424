//! Key rotation manager
//!
//! Serializes every pool mutation (and every current-key read, since reads
//! may rotate) behind a per-provider mutex so concurrent callers never race
//! past the same limited key.

use crate::config::RotationSettings;
use crate::ports::clock::{Clock, SystemClock};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crosscheck_domain::{CredentialPool, KeyLease, PoolStatus, RotationEvent, RotationLog};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from rotation manager lookups
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RotationError {
    /// Unknown provider, or a provider with zero credentials
    #[error("No credentials available for provider '{0}'")]
    NotFound(String),
}

/// Owns all credential pools for the life of the process.
pub struct KeyRotationManager {
    pools: HashMap<String, Mutex<CredentialPool>>,
    history: Mutex<RotationLog>,
    settings: RotationSettings,
    clock: Arc<dyn Clock>,
    logger: Arc<dyn ConversationLogger>,
}

impl KeyRotationManager {
    pub fn new(
        pools: impl IntoIterator<Item = CredentialPool>,
        settings: RotationSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let pools = pools
            .into_iter()
            .map(|pool| (pool.provider().to_string(), Mutex::new(pool)))
            .collect();
        Self {
            pools,
            history: Mutex::new(RotationLog::new(settings.history_capacity)),
            settings,
            clock,
            logger: Arc::new(NoConversationLogger),
        }
    }

    /// Manager on the wall clock with default settings.
    pub fn with_system_clock(pools: impl IntoIterator<Item = CredentialPool>) -> Self {
        Self::new(pools, RotationSettings::default(), Arc::new(SystemClock))
    }

    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn settings(&self) -> &RotationSettings {
        &self.settings
    }

    /// Return the credential to use for `provider` now.
    ///
    /// A limited current key whose recovery window has elapsed is cleared
    /// and returned; otherwise rotation to a usable key is attempted first.
    pub fn current_key(&self, provider: &str) -> Result<KeyLease, RotationError> {
        let mut pool = self.lock_pool(provider)?;
        let before = pool.current_index();
        let lease = pool
            .acquire(self.clock.now(), self.settings.recovery_window_chrono())
            .ok_or_else(|| RotationError::NotFound(provider.to_string()))?;
        if lease.index() != before {
            debug!(
                provider = provider,
                from = before,
                to = lease.index(),
                "Rotated away from limited key on acquire"
            );
        }
        Ok(lease)
    }

    /// Mark the key at `key_index` of `provider` rate limited and rotate.
    ///
    /// `key_index` is the index of the lease the rejected request used. A
    /// report for a key the pool has already rotated away from marks that
    /// key only, so concurrent callers never rotate past a fresh key.
    ///
    /// Returns `false` only when every key is limited and none has
    /// recovered. The event is appended to the bounded rotation history.
    pub fn report_rate_limited(
        &self,
        provider: &str,
        key_index: usize,
        context: &str,
    ) -> Result<bool, RotationError> {
        let now = self.clock.now();
        let outcome = {
            let mut pool = self.lock_pool(provider)?;
            if pool.is_empty() {
                return Err(RotationError::NotFound(provider.to_string()));
            }
            pool.mark_rate_limited(key_index, now, self.settings.recovery_window_chrono())
        };

        if outcome.rotated {
            debug!(
                provider = provider,
                from = outcome.from_index,
                to = outcome.to_index,
                "Rotated to next usable key"
            );
        } else {
            warn!(provider = provider, "All keys exhausted");
        }

        let event = RotationEvent {
            provider: provider.to_string(),
            from_index: outcome.from_index,
            to_index: outcome.to_index,
            rotated: outcome.rotated,
            context: context.to_string(),
            at: now,
        };
        self.logger.log(ConversationEvent::new(
            "key_rotated",
            serde_json::json!({
                "provider": provider,
                "from_index": outcome.from_index,
                "to_index": outcome.to_index,
                "rotated": outcome.rotated,
                "context": context,
            }),
        ));
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);

        Ok(outcome.rotated)
    }

    /// Count one outbound request. Unknown providers are ignored.
    pub fn report_usage(&self, provider: &str) {
        if let Ok(mut pool) = self.lock_pool(provider) {
            pool.record_usage();
        }
    }

    /// Masked status for one provider, or for all providers sorted by name.
    pub fn status(&self, provider: Option<&str>) -> Vec<PoolStatus> {
        let now = self.clock.now();
        let window = self.settings.recovery_window_chrono();
        let mut names: Vec<&String> = match provider {
            Some(name) => self.pools.keys().filter(|k| k.as_str() == name).collect(),
            None => self.pools.keys().collect(),
        };
        names.sort();
        names
            .into_iter()
            .filter_map(|name| self.pools.get(name))
            .map(|pool| {
                pool.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .status(now, window)
            })
            .collect()
    }

    /// Rotation history, oldest first.
    pub fn history(&self) -> Vec<RotationEvent> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    /// Provider names, sorted.
    pub fn providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.pools.keys().cloned().collect();
        names.sort();
        names
    }

    fn lock_pool(&self, provider: &str) -> Result<MutexGuard<'_, CredentialPool>, RotationError> {
        self.pools
            .get(provider)
            .map(|pool| pool.lock().unwrap_or_else(PoisonError::into_inner))
            .ok_or_else(|| RotationError::NotFound(provider.to_string()))
    }
}
