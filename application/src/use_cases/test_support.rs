//! Scripted doubles shared by the use case tests.

use crate::ports::backend_client::{BackendClient, Completion, CompletionRequest, TransportError};
use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use crate::ports::selector::{BackendSelector, SelectorError};
use crate::rotation::manager::KeyRotationManager;
use async_trait::async_trait;
use crosscheck_domain::{Backend, BackendCatalog, BackendSelection, CredentialPool};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// One scripted outcome for one call.
#[derive(Debug, Clone)]
pub enum Reply {
    Ok { content: String, tokens: u64 },
    Err(TransportError),
}

impl Reply {
    pub fn ok(content: &str, tokens: u64) -> Self {
        Reply::Ok {
            content: content.to_string(),
            tokens,
        }
    }

    pub fn status(status: u16) -> Self {
        if status == 429 {
            Reply::Err(TransportError::RateLimited {
                status,
                message: "Too Many Requests".to_string(),
                retry_after: None,
            })
        } else {
            Reply::http(status, "")
        }
    }

    pub fn http(status: u16, body: &str) -> Self {
        Reply::Err(TransportError::Http {
            status,
            body: body.to_string(),
        })
    }

    pub fn unreachable(message: &str) -> Self {
        Reply::Err(TransportError::Unreachable(message.to_string()))
    }

    pub fn retry_after(delay: Duration) -> Self {
        Reply::Err(TransportError::RateLimited {
            status: 429,
            message: "slow down".to_string(),
            retry_after: Some(delay),
        })
    }
}

/// Backend client that replays per-backend scripts.
///
/// Once a backend's script is drained every further call succeeds with
/// `"<backend> answer"` and 10 tokens.
#[derive(Default)]
pub struct ScriptedClient {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    latencies: Mutex<HashMap<String, Duration>>,
    calls: Mutex<Vec<(String, String, String)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, backend: &str, replies: Vec<Reply>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(backend.to_string(), replies.into());
    }

    pub fn set_latency(&self, backend: &str, latency: Duration) {
        self.latencies
            .lock()
            .unwrap()
            .insert(backend.to_string(), latency);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Prompts sent to `backend`, in call order.
    pub fn prompts(&self, backend: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(b, _, _)| b == backend)
            .map(|(_, _, prompt)| prompt.clone())
            .collect()
    }

    /// Key indexes used for `backend`, parsed from the secrets made by [`rotation`].
    pub fn keys_used(&self, backend: &str) -> Vec<usize> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(b, _, _)| b == backend)
            .filter_map(|(_, key, _)| key.rsplit('-').next()?.parse().ok())
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendClient for ScriptedClient {
    async fn complete(
        &self,
        request: &CompletionRequest,
        api_key: &str,
    ) -> Result<Completion, TransportError> {
        self.calls.lock().unwrap().push((
            request.backend.clone(),
            api_key.to_string(),
            request.prompt.clone(),
        ));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let latency = self
            .latencies
            .lock()
            .unwrap()
            .get(&request.backend)
            .copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let reply = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&request.backend)
            .and_then(|queue| queue.pop_front());
        match reply {
            Some(Reply::Ok { content, tokens }) => Ok(Completion::new(content, tokens)),
            Some(Reply::Err(e)) => Err(e),
            None => Ok(Completion::new(format!("{} answer", request.backend), 10)),
        }
    }
}

/// Selector that always returns the same selection.
pub struct FixedSelector(pub BackendSelection);

#[async_trait]
impl BackendSelector for FixedSelector {
    async fn select_backend(&self, _prompt: &str) -> Result<BackendSelection, SelectorError> {
        Ok(self.0.clone())
    }
}

/// Selector that is always down.
pub struct FailingSelector;

#[async_trait]
impl BackendSelector for FailingSelector {
    async fn select_backend(&self, _prompt: &str) -> Result<BackendSelection, SelectorError> {
        Err(SelectorError::Unavailable("router offline".to_string()))
    }
}

/// Logger that keeps every event type in memory.
#[derive(Default)]
pub struct RecordingLogger {
    events: Mutex<Vec<ConversationEvent>>,
}

impl RecordingLogger {
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.event_type)
            .collect()
    }
}

impl ConversationLogger for RecordingLogger {
    fn log(&self, event: ConversationEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Catalog with the given backend names, each priced at 0.5 per 1K tokens.
pub fn catalog(names: &[&str]) -> BackendCatalog {
    BackendCatalog::new(
        names
            .iter()
            .map(|name| {
                Backend::new(*name, format!("{}-model", name.to_lowercase()))
                    .with_cost_per_1k(0.5)
                    .with_max_output_tokens(512)
            })
            .collect(),
    )
    .unwrap()
}

/// Rotation manager with `keys` credentials per backend, named `<backend>-key-<i>`.
pub fn rotation(pools: &[(&str, usize)]) -> KeyRotationManager {
    KeyRotationManager::with_system_clock(pools.iter().map(|(name, keys)| {
        CredentialPool::new(*name, (0..*keys).map(|i| format!("{}-key-{}", name, i)))
    }))
}
