//! Credential entities

use super::value_objects::{KeyLease, KeyStatus, PoolStatus, RotationOutcome};
use crate::core::string::mask_secret;
use chrono::{DateTime, Duration, Utc};

/// One API key for one backend (Entity)
///
/// Owned by its [`CredentialPool`]. The secret never leaves the pool except
/// inside a [`KeyLease`].
#[derive(Clone)]
pub struct Credential {
    secret: String,
    rate_limited: bool,
    last_limited_at: Option<DateTime<Utc>>,
    request_count: u64,
}

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            rate_limited: false,
            last_limited_at: None,
            request_count: 0,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.rate_limited
    }

    pub fn last_limited_at(&self) -> Option<DateTime<Utc>> {
        self.last_limited_at
    }

    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    pub fn masked(&self) -> String {
        mask_secret(&self.secret)
    }

    /// Limited, but the recovery window has elapsed since the last limit.
    fn has_recovered(&self, now: DateTime<Utc>, window: Duration) -> bool {
        match self.last_limited_at {
            Some(at) => now - at >= window,
            None => true,
        }
    }

    fn is_usable(&self, now: DateTime<Utc>, window: Duration) -> bool {
        !self.rate_limited || self.has_recovered(now, window)
    }

    fn clear_limit(&mut self) {
        self.rate_limited = false;
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("secret", &self.masked())
            .field("rate_limited", &self.rate_limited)
            .field("last_limited_at", &self.last_limited_at)
            .field("request_count", &self.request_count)
            .finish()
    }
}

/// Ordered credentials for one backend (Entity)
///
/// Invariant: when non-empty, `current` is a valid index, so exactly one
/// credential is current.
#[derive(Debug, Clone)]
pub struct CredentialPool {
    provider: String,
    credentials: Vec<Credential>,
    current: usize,
    request_count: u64,
}

impl CredentialPool {
    pub fn new<I, S>(provider: impl Into<String>, secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            provider: provider.into(),
            credentials: secrets.into_iter().map(Credential::new).collect(),
            current: 0,
            request_count: 0,
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    pub fn credentials(&self) -> &[Credential] {
        &self.credentials
    }

    /// Return the credential to use now.
    ///
    /// A limited current key whose window has elapsed is cleared and kept.
    /// Otherwise the pool rotates to the next usable key if one exists. When
    /// none is usable the limited current key is still returned, so callers
    /// can keep probing until their own budget runs out.
    pub fn acquire(&mut self, now: DateTime<Utc>, window: Duration) -> Option<KeyLease> {
        if self.credentials.is_empty() {
            return None;
        }

        if !self.credentials[self.current].is_usable(now, window)
            && let Some(next) = self.find_usable_after(self.current, now, window)
        {
            self.current = next;
        }

        let current = &mut self.credentials[self.current];
        if current.rate_limited && current.has_recovered(now, window) {
            current.clear_limit();
        }

        Some(KeyLease::new(
            self.provider.clone(),
            self.current,
            current.secret.clone(),
        ))
    }

    /// Mark the credential at `index` limited and rotate.
    ///
    /// `index` is the key the rejected request was sent with. If it is still
    /// current, the pool scans cyclically from just past it for a usable key.
    /// When every key is limited and none has recovered, the index still
    /// advances by one (landing on the least recently limited key) and the
    /// outcome reports `rotated == false`.
    ///
    /// If another report already moved the pool away from `index`, only that
    /// key is marked and the current index is left alone.
    pub fn mark_rate_limited(
        &mut self,
        index: usize,
        now: DateTime<Utc>,
        window: Duration,
    ) -> RotationOutcome {
        if self.credentials.is_empty() {
            return RotationOutcome {
                from_index: 0,
                to_index: 0,
                rotated: false,
            };
        }

        if index != self.current && index < self.credentials.len() {
            let stale = &mut self.credentials[index];
            if stale.is_usable(now, window) {
                stale.rate_limited = true;
                stale.last_limited_at = Some(now);
            }
            let rotated = self.credentials[self.current].is_usable(now, window)
                || self.find_usable_after(self.current, now, window).is_some();
            return RotationOutcome {
                from_index: index,
                to_index: self.current,
                rotated,
            };
        }

        let from = self.current;
        {
            let limited = &mut self.credentials[from];
            limited.rate_limited = true;
            limited.last_limited_at = Some(now);
        }

        match self.find_usable_after(from, now, window) {
            Some(next) => {
                if self.credentials[next].rate_limited {
                    self.credentials[next].clear_limit();
                }
                self.current = next;
                RotationOutcome {
                    from_index: from,
                    to_index: next,
                    rotated: true,
                }
            }
            None => {
                self.current = (from + 1) % self.credentials.len();
                RotationOutcome {
                    from_index: from,
                    to_index: self.current,
                    rotated: false,
                }
            }
        }
    }

    /// Count one outbound request against the current key.
    pub fn record_usage(&mut self) {
        self.request_count += 1;
        if let Some(current) = self.credentials.get_mut(self.current) {
            current.request_count += 1;
        }
    }

    /// Masked diagnostic snapshot.
    pub fn status(&self, now: DateTime<Utc>, window: Duration) -> PoolStatus {
        let keys = self
            .credentials
            .iter()
            .enumerate()
            .map(|(index, credential)| {
                let recovers_in_secs = match (credential.rate_limited, credential.last_limited_at) {
                    (true, Some(at)) => Some(
                        window
                            .checked_sub(&(now - at))
                            .unwrap_or(Duration::MAX)
                            .num_seconds()
                            .max(0),
                    ),
                    _ => None,
                };
                KeyStatus {
                    index,
                    masked_key: credential.masked(),
                    is_current: index == self.current,
                    rate_limited: credential.rate_limited,
                    usable: credential.is_usable(now, window),
                    recovers_in_secs,
                    request_count: credential.request_count,
                }
            })
            .collect();

        PoolStatus {
            provider: self.provider.clone(),
            current_index: self.current,
            request_count: self.request_count,
            keys,
        }
    }

    fn find_usable_after(&self, start: usize, now: DateTime<Utc>, window: Duration) -> Option<usize> {
        let len = self.credentials.len();
        (1..len)
            .map(|offset| (start + offset) % len)
            .find(|&i| self.credentials[i].is_usable(now, window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
    }

    fn window() -> Duration {
        Duration::minutes(15)
    }

    fn pool(k: usize) -> CredentialPool {
        CredentialPool::new("Alpha", (0..k).map(|i| format!("sk-alpha-key-{:04}", i)))
    }

    #[test]
    fn acquire_on_empty_pool_is_none() {
        let mut pool = CredentialPool::new("Empty", Vec::<String>::new());
        assert!(pool.acquire(t0(), window()).is_none());
    }

    #[test]
    fn rate_limit_rotates_to_next_key() {
        let mut pool = pool(2);
        let outcome = pool.mark_rate_limited(pool.current_index(), t0(), window());
        assert!(outcome.rotated);
        assert_eq!(outcome.from_index, 0);
        assert_eq!(outcome.to_index, 1);
        assert!(pool.credentials()[0].is_rate_limited());
        assert_eq!(pool.acquire(t0(), window()).unwrap().index(), 1);
    }

    #[test]
    fn k_reports_exhaust_pool_and_cycle_back() {
        let mut pool = pool(3);
        assert!(pool.mark_rate_limited(pool.current_index(), t0(), window()).rotated);
        assert!(pool.mark_rate_limited(pool.current_index(), t0(), window()).rotated);
        let third = pool.mark_rate_limited(pool.current_index(), t0(), window());
        assert!(!third.rotated);
        assert_eq!(pool.current_index(), 0);
        assert!(!pool.mark_rate_limited(pool.current_index(), t0(), window()).rotated);
    }

    #[test]
    fn recovered_key_is_cleared_on_acquire() {
        let mut pool = pool(2);
        pool.mark_rate_limited(pool.current_index(), t0(), window());
        pool.mark_rate_limited(pool.current_index(), t0() + Duration::seconds(1), window());
        assert_eq!(pool.current_index(), 0);

        let still_limited = pool.acquire(t0() + Duration::minutes(5), window()).unwrap();
        assert_eq!(still_limited.index(), 0);
        assert!(pool.credentials()[0].is_rate_limited());

        let recovered = pool.acquire(t0() + Duration::minutes(15), window()).unwrap();
        assert_eq!(recovered.index(), 0);
        assert!(!pool.credentials()[0].is_rate_limited());
    }

    #[test]
    fn rotation_reuses_key_once_recovered() {
        let mut pool = pool(3);
        pool.mark_rate_limited(pool.current_index(), t0(), window());
        pool.mark_rate_limited(pool.current_index(), t0(), window());
        // 0 and 1 are limited; by the time 2 is limited, 0 has recovered
        pool.mark_rate_limited(pool.current_index(), t0() + Duration::minutes(15), window());
        assert_eq!(pool.current_index(), 0);
        assert!(!pool.credentials()[0].is_rate_limited());
    }

    #[test]
    fn usage_counts_per_key_and_pool() {
        let mut pool = pool(2);
        pool.record_usage();
        pool.mark_rate_limited(pool.current_index(), t0(), window());
        pool.record_usage();
        pool.record_usage();
        assert_eq!(pool.request_count(), 3);
        assert_eq!(pool.credentials()[0].request_count(), 1);
        assert_eq!(pool.credentials()[1].request_count(), 2);
    }

    #[test]
    fn status_is_masked_and_reports_recovery() {
        let mut pool = pool(2);
        pool.mark_rate_limited(pool.current_index(), t0(), window());
        let status = pool.status(t0() + Duration::minutes(5), window());
        assert_eq!(status.current_index, 1);
        assert_eq!(status.keys[0].recovers_in_secs, Some(600));
        assert!(!status.keys[0].usable);
        assert!(status.keys[1].is_current);
        assert!(!status.keys[0].masked_key.contains("alpha-key"));
    }

    #[test]
    fn debug_output_does_not_leak_secret() {
        let pool = pool(1);
        let rendered = format!("{:?}", pool);
        assert!(!rendered.contains("sk-alpha-key-0000"));
    }

    #[test]
    fn stale_report_marks_only_the_reported_key() {
        let mut pool = pool(3);
        let first = pool.mark_rate_limited(0, t0(), window());
        assert_eq!(first.to_index, 1);

        // A second request that was also sent with key 0 reports late.
        let late = pool.mark_rate_limited(0, t0() + Duration::seconds(1), window());
        assert!(late.rotated);
        assert_eq!(late.from_index, 0);
        assert_eq!(late.to_index, 1);
        assert_eq!(pool.current_index(), 1);
        assert!(!pool.credentials()[1].is_rate_limited());
        assert_eq!(pool.credentials()[0].last_limited_at(), Some(t0()));
    }

    #[test]
    fn stale_report_on_unmarked_key_limits_it() {
        let mut pool = pool(3);
        pool.mark_rate_limited(0, t0(), window());
        let outcome = pool.mark_rate_limited(2, t0(), window());
        assert!(outcome.rotated);
        assert_eq!(pool.current_index(), 1);
        assert!(pool.credentials()[2].is_rate_limited());
        assert_eq!(pool.acquire(t0(), window()).unwrap().index(), 1);
    }

    #[test]
    fn status_with_unbounded_window_does_not_overflow() {
        let mut pool = pool(2);
        pool.mark_rate_limited(0, t0(), Duration::MAX);
        let status = pool.status(t0() + Duration::minutes(1), Duration::MAX);
        assert!(status.keys[0].rate_limited);
        assert!(!status.keys[0].usable);
        assert!(status.keys[0].recovers_in_secs.unwrap() > 0);
    }
}
