//! Resilient call primitive
//!
//! Wraps one logical call to one backend: obtains a key from the
//! [`KeyRotationManager`], rotates on rate limits, retries transient failures
//! with bounded exponential backoff, and always returns a typed
//! [`CallAttemptResult`]. The primitive has no notion of role; primary,
//! critique and refinement calls all go through it.

use crate::config::RetryPolicy;
use crate::ports::backend_client::{BackendClient, CompletionRequest, TransportError};
use crate::rotation::manager::KeyRotationManager;
use crosscheck_domain::{BackendCatalog, CallAttemptResult, ErrorKind};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Retrying, key-rotating caller shared by every use case.
pub struct ResilientCaller<C: BackendClient + ?Sized + 'static> {
    client: Arc<C>,
    rotation: Arc<KeyRotationManager>,
    catalog: Arc<BackendCatalog>,
    policy: RetryPolicy,
    temperature: f32,
}

impl<C: BackendClient + ?Sized + 'static> Clone for ResilientCaller<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            rotation: Arc::clone(&self.rotation),
            catalog: Arc::clone(&self.catalog),
            policy: self.policy.clone(),
            temperature: self.temperature,
        }
    }
}

impl<C: BackendClient + ?Sized + 'static> ResilientCaller<C> {
    pub fn new(
        client: Arc<C>,
        rotation: Arc<KeyRotationManager>,
        catalog: Arc<BackendCatalog>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            client,
            rotation,
            catalog,
            policy,
            temperature: 0.7,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn catalog(&self) -> &BackendCatalog {
        &self.catalog
    }

    pub fn rotation(&self) -> &KeyRotationManager {
        &self.rotation
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Call `backend` with the configured retry policy.
    pub async fn call(&self, backend: &str, prompt: &str) -> CallAttemptResult {
        self.call_with_policy(backend, prompt, &self.policy).await
    }

    /// Call `backend` with an explicit retry policy.
    pub async fn call_with_policy(
        &self,
        backend: &str,
        prompt: &str,
        policy: &RetryPolicy,
    ) -> CallAttemptResult {
        let started = Instant::now();

        let Some(descriptor) = self.catalog.get(backend) else {
            return CallAttemptResult::failure(
                ErrorKind::Unknown,
                format!("Unknown backend '{}'", backend),
            );
        };

        let request = CompletionRequest {
            backend: descriptor.name.clone(),
            model: descriptor.model_id.clone(),
            prompt: prompt.to_string(),
            max_tokens: descriptor.max_output_tokens,
            temperature: self.temperature,
        };

        let max_attempts = policy.max_attempts.max(1);
        let mut attempts: u32 = 0;
        let mut last_key = None;
        let mut last_kind: ErrorKind;
        let mut last_error: String;

        loop {
            let lease = match self.rotation.current_key(backend) {
                Ok(lease) => lease,
                Err(e) => {
                    warn!(backend = backend, "No usable key: {}", e);
                    return CallAttemptResult::failure(ErrorKind::AllKeysExhausted, e.to_string())
                        .with_attempts(attempts)
                        .with_latency_ms(elapsed_ms(started))
                        .with_key_index(last_key);
                }
            };

            attempts += 1;
            last_key = Some(lease.index());
            self.rotation.report_usage(backend);
            debug!(
                backend = backend,
                attempt = attempts,
                key_index = lease.index(),
                "Sending request"
            );

            let outcome = tokio::time::timeout(
                policy.attempt_timeout,
                self.client.complete(&request, lease.secret()),
            )
            .await;

            let error = match outcome {
                Ok(Ok(completion)) => {
                    let latency_ms = elapsed_ms(started);
                    info!(
                        backend = backend,
                        attempts = attempts,
                        tokens = completion.usage.total_tokens,
                        latency_ms = latency_ms,
                        "Backend responded"
                    );
                    let cost = descriptor.cost_for(completion.usage.total_tokens);
                    return CallAttemptResult::success(completion.content, completion.usage)
                        .with_cost(cost)
                        .with_latency_ms(latency_ms)
                        .with_attempts(attempts)
                        .with_key_index(last_key);
                }
                Ok(Err(e)) => e,
                Err(_) => TransportError::Timeout(format!(
                    "attempt exceeded {}ms",
                    policy.attempt_timeout.as_millis()
                )),
            };

            let mut retry_after = None;
            last_kind = if error.is_rate_limit() {
                retry_after = error.retry_after();
                let rotated = self
                    .rotation
                    .report_rate_limited(backend, lease.index(), &error.to_string())
                    .unwrap_or(false);
                if rotated {
                    ErrorKind::RateLimited
                } else {
                    ErrorKind::AllKeysExhausted
                }
            } else {
                error.kind()
            };
            last_error = error.to_string();

            warn!(
                backend = backend,
                attempt = attempts,
                kind = last_kind.as_str(),
                "Attempt failed: {}",
                last_error
            );

            if attempts >= max_attempts {
                break;
            }

            let delay = policy.backoff_delay(attempts - 1, retry_after);
            if started.elapsed() + delay >= policy.max_total_time {
                debug!(backend = backend, "Total time budget exhausted");
                break;
            }
            tokio::time::sleep(delay).await;
        }

        CallAttemptResult::failure(last_kind, last_error)
            .with_attempts(attempts)
            .with_latency_ms(elapsed_ms(started))
            .with_key_index(last_key)
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{Reply, ScriptedClient, catalog, rotation};
    use std::time::Duration;

    fn caller(client: Arc<ScriptedClient>, keys: &[(&str, usize)]) -> ResilientCaller<ScriptedClient> {
        ResilientCaller::new(
            client,
            Arc::new(rotation(keys)),
            Arc::new(catalog(&keys.iter().map(|(n, _)| *n).collect::<Vec<_>>())),
            RetryPolicy::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_rotates_and_succeeds() {
        let client = Arc::new(ScriptedClient::new());
        client.script("Alpha", vec![Reply::status(429), Reply::ok("hello", 10)]);
        let caller = caller(Arc::clone(&client), &[("Alpha", 2)]);

        let result = caller.call("Alpha", "hi").await;

        assert!(result.success);
        assert_eq!(result.attempts, 2);
        assert_eq!(result.content, "hello");
        assert_eq!(result.usage.total_tokens, 10);
        assert_eq!(result.key_index, Some(1));

        let status = &caller.rotation().status(Some("Alpha"))[0];
        assert!(status.keys[0].rate_limited);
        assert_eq!(status.current_index, 1);
        assert_eq!(client.keys_used("Alpha"), vec![0, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_rate_limits_on_one_key_rotate_once() {
        let client = Arc::new(ScriptedClient::new());
        client.script("Alpha", vec![Reply::status(429), Reply::status(429)]);
        client.set_latency("Alpha", Duration::from_millis(100));
        let caller = caller(Arc::clone(&client), &[("Alpha", 3)]);

        let (first, second) = tokio::join!(caller.call("Alpha", "a"), caller.call("Alpha", "b"));

        assert!(first.success);
        assert!(second.success);
        assert_eq!(client.keys_used("Alpha"), vec![0, 0, 1, 1]);
        let status = &caller.rotation().status(Some("Alpha"))[0];
        assert_eq!(status.current_index, 1);
        assert!(status.keys[0].rate_limited);
        assert!(!status.keys[1].rate_limited);
        assert!(!status.keys[2].rate_limited);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_keys_exhausted() {
        let client = Arc::new(ScriptedClient::new());
        client.script("Beta", vec![Reply::status(429); 4]);
        let caller = caller(Arc::clone(&client), &[("Beta", 3)]);

        let result = caller.call("Beta", "hi").await;

        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::AllKeysExhausted));
        assert_eq!(result.attempts, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_phrase_in_body() {
        let client = Arc::new(ScriptedClient::new());
        client.script(
            "Alpha",
            vec![
                Reply::http(400, "You exceeded your current quota"),
                Reply::ok("fine", 3),
            ],
        );
        let caller = caller(Arc::clone(&client), &[("Alpha", 2)]);

        let result = caller.call("Alpha", "hi").await;

        assert!(result.success);
        assert_eq!(caller.rotation().history().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_error_retries_without_rotation() {
        let client = Arc::new(ScriptedClient::new());
        client.script(
            "Alpha",
            vec![Reply::http(503, "overloaded"), Reply::ok("back", 5)],
        );
        let caller = caller(Arc::clone(&client), &[("Alpha", 2)]);

        let result = caller.call("Alpha", "hi").await;

        assert!(result.success);
        assert_eq!(result.attempts, 2);
        assert_eq!(client.keys_used("Alpha"), vec![0, 0]);
        assert!(caller.rotation().history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_transient_errors_keep_last_kind() {
        let client = Arc::new(ScriptedClient::new());
        client.script("Alpha", vec![Reply::unreachable("connection refused"); 4]);
        let caller = caller(Arc::clone(&client), &[("Alpha", 1)]);

        let result = caller.call("Alpha", "hi").await;

        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::Unreachable));
        assert!(result.error.unwrap().contains("connection refused"));
        assert_eq!(result.attempts, 4);
        // 500 + 1000 + 2000 ms of backoff
        assert_eq!(result.latency_ms, 3500);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout() {
        let client = Arc::new(ScriptedClient::new());
        client.set_latency("Alpha", Duration::from_secs(60));
        let caller = caller(Arc::clone(&client), &[("Alpha", 1)]);
        let policy = RetryPolicy::default()
            .with_max_attempts(1)
            .with_attempt_timeout(Duration::from_secs(2));

        let result = caller.call_with_policy("Alpha", "hi", &policy).await;

        assert_eq!(result.error_kind, Some(ErrorKind::Timeout));
        assert_eq!(result.latency_ms, 2000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_total_time_budget_stops_retries() {
        let client = Arc::new(ScriptedClient::new());
        client.script("Alpha", vec![Reply::http(500, "boom"); 10]);
        let caller = caller(Arc::clone(&client), &[("Alpha", 1)]);
        let policy = RetryPolicy::default()
            .with_max_attempts(10)
            .with_base_backoff(Duration::from_secs(1))
            .with_max_total_time(Duration::from_secs(4));

        let result = caller.call_with_policy("Alpha", "hi", &policy).await;

        // Delays 1s and 2s fit; the next 4s delay would cross the budget.
        assert_eq!(result.attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_is_honored() {
        let client = Arc::new(ScriptedClient::new());
        client.script(
            "Alpha",
            vec![
                Reply::retry_after(Duration::from_secs(3)),
                Reply::ok("ok", 1),
            ],
        );
        let caller = caller(Arc::clone(&client), &[("Alpha", 2)]);

        let result = caller.call("Alpha", "hi").await;

        assert!(result.success);
        assert_eq!(result.latency_ms, 3000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_credentials_fails_immediately() {
        let client = Arc::new(ScriptedClient::new());
        let caller = caller(Arc::clone(&client), &[("Empty", 0)]);

        let result = caller.call("Empty", "hi").await;

        assert_eq!(result.error_kind, Some(ErrorKind::AllKeysExhausted));
        assert_eq!(result.attempts, 0);
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_backend() {
        let client = Arc::new(ScriptedClient::new());
        let caller = caller(Arc::clone(&client), &[("Alpha", 1)]);

        let result = caller.call("Nope", "hi").await;

        assert_eq!(result.error_kind, Some(ErrorKind::Unknown));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cost_from_catalog_pricing() {
        let client = Arc::new(ScriptedClient::new());
        client.script("Alpha", vec![Reply::ok("priced", 2000)]);
        let caller = caller(Arc::clone(&client), &[("Alpha", 1)]);

        let result = caller.call("Alpha", "hi").await;

        // test catalog prices every backend at 0.5 per 1K tokens
        assert_eq!(result.cost, 1.0);
    }
}
