//! Run Orchestration use case
//!
//! Drives one request through the dispatch state machine:
//! backend selection, primary call with fallback chain, bounded-concurrency
//! critique fan-out, and aggregation into an [`OrchestrationResult`].

use crate::config::OrchestrationParams;
use crate::ports::backend_client::BackendClient;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::selector::{BackendSelector, SelectorError};
use crate::use_cases::refine_response::{RefineInput, RefineResponseUseCase};
use crate::use_cases::resilient_call::ResilientCaller;
use crosscheck_domain::{
    BackendResponse, BackendSelection, CallAttemptResult, ErrorKind, OrchestrationResult,
    OrchestrationRun, Phase, Prompt, PromptTemplate, RefinementResult, ResponseRole,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that prevent a request from being dispatched at all.
///
/// Once dispatch begins every failure is carried inside the result.
#[derive(Error, Debug)]
pub enum RunOrchestrationError {
    #[error("No backends configured")]
    NoBackends,

    #[error("Prompt is empty")]
    EmptyPrompt,
}

/// Input for the RunOrchestration use case
#[derive(Debug, Clone)]
pub struct RunOrchestrationInput {
    pub prompt: Prompt,
    /// Overrides the configured request deadline
    pub deadline: Option<Duration>,
}

impl RunOrchestrationInput {
    pub fn new(prompt: Prompt) -> Self {
        Self {
            prompt,
            deadline: None,
        }
    }

    /// Validate raw prompt text.
    pub fn from_text(text: impl Into<String>) -> Result<Self, RunOrchestrationError> {
        Prompt::try_new(text)
            .map(Self::new)
            .ok_or(RunOrchestrationError::EmptyPrompt)
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Use case for running one orchestration request
pub struct RunOrchestrationUseCase<C: BackendClient + ?Sized + 'static> {
    caller: ResilientCaller<C>,
    selector: Arc<dyn BackendSelector>,
    params: OrchestrationParams,
    logger: Arc<dyn ConversationLogger>,
    cancellation: Option<CancellationToken>,
}

impl<C: BackendClient + ?Sized + 'static> RunOrchestrationUseCase<C> {
    pub fn new(
        caller: ResilientCaller<C>,
        selector: Arc<dyn BackendSelector>,
        params: OrchestrationParams,
    ) -> Self {
        Self {
            caller,
            selector,
            params,
            logger: Arc::new(NoConversationLogger),
            cancellation: None,
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn params(&self) -> &OrchestrationParams {
        &self.params
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(
        &self,
        input: RunOrchestrationInput,
    ) -> Result<OrchestrationResult, RunOrchestrationError> {
        self.execute_with_progress(input, &NoProgress).await
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &self,
        input: RunOrchestrationInput,
        progress: &dyn ProgressNotifier,
    ) -> Result<OrchestrationResult, RunOrchestrationError> {
        if self.caller.catalog().is_empty() {
            return Err(RunOrchestrationError::NoBackends);
        }

        let prompt = input.prompt.content().to_string();
        let deadline = input
            .deadline
            .or(self.params.request_deadline)
            .map(|d| Instant::now() + d);
        let token = self
            .cancellation
            .as_ref()
            .map(CancellationToken::child_token)
            .unwrap_or_default();
        let mut run = OrchestrationRun::new();

        info!(
            "Starting orchestration across {} backends",
            self.caller.catalog().len()
        );

        // Phase 1: Backend selection
        progress.on_phase_start(&Phase::SelectingBackend, 1);
        let (selection, selector_error) = self.select(&prompt).await;
        progress.on_phase_complete(&Phase::SelectingBackend);

        // Phase 2: Primary call with fallback
        run.advance(Phase::CallingPrimary);
        let (primary, tried) = self
            .phase_primary(&prompt, &selection.backend, &token, &mut run, progress)
            .await;

        // Phase 3: Critiques
        run.advance(Phase::CollectingCritiques);
        let excluded = if primary.is_success() {
            primary.backend.clone()
        } else {
            selection.backend.clone()
        };
        let critiques = self
            .phase_critiques(&prompt, &primary, &excluded, deadline, &token, progress)
            .await;

        // Phase 4: Aggregation
        run.advance(Phase::Aggregating);
        progress.on_phase_start(&Phase::Aggregating, 1);
        run.advance(Phase::Done);
        let result = OrchestrationResult::aggregate(
            prompt,
            selection,
            selector_error,
            tried,
            primary,
            critiques,
        )
        .with_phases(run.into_trace());
        progress.on_phase_complete(&Phase::Aggregating);

        info!(
            selected = %result.selected_backend,
            success = result.success,
            total_cost = result.total_cost,
            total_latency_ms = result.total_latency_ms,
            "Orchestration complete: {}",
            result.critique_summary()
        );
        self.logger.log(ConversationEvent::new(
            "orchestration_complete",
            serde_json::json!({
                "selected_backend": result.selected_backend,
                "tried_backends": result.tried_backends,
                "success": result.success,
                "successful_critiques": result.successful_critiques(),
                "critiques": result.critiques.len(),
                "total_cost": result.total_cost,
                "total_latency_ms": result.total_latency_ms,
                "error_summary": result.error_summary,
            }),
        ));

        Ok(result)
    }

    /// Refine a primary answer with a chosen critique (single shot, no fallback).
    pub async fn refine(&self, input: RefineInput) -> RefinementResult {
        RefineResponseUseCase::new(self.caller.clone())
            .with_logger(Arc::clone(&self.logger))
            .execute(input)
            .await
    }

    /// Ask the selector; any failure falls back to the default backend.
    async fn select(&self, prompt: &str) -> (BackendSelection, Option<String>) {
        let outcome =
            tokio::time::timeout(self.params.selector_timeout, self.selector.select_backend(prompt))
                .await;

        let error = match outcome {
            Ok(Ok(selection)) if self.caller.catalog().contains(&selection.backend) => {
                debug!(backend = %selection.backend, "Selector chose backend");
                return (selection, None);
            }
            Ok(Ok(selection)) => format!("selector chose unknown backend '{}'", selection.backend),
            Ok(Err(e)) => e.to_string(),
            Err(_) => SelectorError::Timeout.to_string(),
        };

        let fallback = self.default_backend();
        warn!(
            kind = ErrorKind::SelectorUnavailable.as_str(),
            default = %fallback,
            "Selector failed, using default backend: {}",
            error
        );
        (
            BackendSelection::only(fallback, self.params.default_confidence),
            Some(error),
        )
    }

    fn default_backend(&self) -> String {
        let catalog = self.caller.catalog();
        self.params
            .default_backend
            .as_ref()
            .filter(|name| catalog.contains(name))
            .cloned()
            .or_else(|| catalog.names().into_iter().next())
            .unwrap_or_default()
    }

    /// Selected backend first, then the fallback order, skipping duplicates
    /// and names missing from the catalog.
    fn primary_chain(&self, selected: &str) -> Vec<String> {
        let catalog = self.caller.catalog();
        let order = if self.params.fallback_order.is_empty() {
            catalog.names()
        } else {
            self.params.fallback_order.clone()
        };

        let mut chain: Vec<String> = Vec::new();
        for name in std::iter::once(selected.to_string()).chain(order) {
            if catalog.contains(&name) && !chain.contains(&name) {
                chain.push(name);
            }
        }
        chain
    }

    /// Phase 2: walk the primary chain until one backend succeeds
    async fn phase_primary(
        &self,
        prompt: &str,
        selected: &str,
        token: &CancellationToken,
        run: &mut OrchestrationRun,
        progress: &dyn ProgressNotifier,
    ) -> (BackendResponse, Vec<String>) {
        let chain = self.primary_chain(selected);
        info!("Primary call: {} candidate(s)", chain.len());
        progress.on_phase_start(&Phase::CallingPrimary, chain.len());

        let mut tried: Vec<String> = Vec::new();
        let mut last = BackendResponse::new(
            selected,
            ResponseRole::Primary,
            CallAttemptResult::failure(ErrorKind::Unknown, "no primary candidates"),
        );

        for backend in &chain {
            if token.is_cancelled() {
                last = BackendResponse::new(
                    backend.as_str(),
                    ResponseRole::Primary,
                    CallAttemptResult::failure(ErrorKind::Unknown, "request cancelled"),
                );
                break;
            }
            if let Some(previous) = tried.last() {
                run.advance(Phase::FallbackPrimary);
                info!("Falling back from {} to {}", previous, backend);
                progress.on_fallback(previous, backend);
            }
            tried.push(backend.clone());

            let result = self.caller.call(backend, prompt).await;
            let response = BackendResponse::new(backend.as_str(), ResponseRole::Primary, result);
            self.log_response("primary_response", None, &response);
            progress.on_task_complete(&run.current(), backend, response.is_success());

            if response.is_success() {
                progress.on_phase_complete(&Phase::CallingPrimary);
                return (response, tried);
            }
            warn!(
                "Primary backend {} failed: {}",
                backend,
                response.result.error.as_deref().unwrap_or("unknown error")
            );
            last = response;
        }

        progress.on_phase_complete(&Phase::CallingPrimary);
        (last, tried)
    }

    /// Phase 3: one critique per remaining backend, at most
    /// `critique_concurrency` in flight, results kept in dispatch order
    async fn phase_critiques(
        &self,
        prompt: &str,
        primary: &BackendResponse,
        excluded: &str,
        deadline: Option<Instant>,
        token: &CancellationToken,
        progress: &dyn ProgressNotifier,
    ) -> Vec<BackendResponse> {
        let candidates: Vec<String> = self
            .caller
            .catalog()
            .names()
            .into_iter()
            .filter(|name| name != excluded)
            .collect();

        info!("Collecting {} critique(s)", candidates.len());
        progress.on_phase_start(&Phase::CollectingCritiques, candidates.len());

        let critique_prompt = if primary.is_success() {
            PromptTemplate::critique_prompt(prompt, &primary.backend, primary.content())
        } else {
            PromptTemplate::independent_prompt(prompt)
        };

        let semaphore = Arc::new(Semaphore::new(self.params.critique_concurrency.max(1)));
        let mut join_set = JoinSet::new();

        for (index, backend) in candidates.iter().enumerate() {
            let caller = self.caller.clone();
            let semaphore = Arc::clone(&semaphore);
            let token = token.clone();
            let backend = backend.clone();
            let critique_prompt = critique_prompt.clone();

            join_set.spawn(async move {
                let dispatched = Instant::now();
                let expired = async move {
                    match deadline {
                        Some(at) => tokio::time::sleep_until(at).await,
                        None => std::future::pending::<()>().await,
                    }
                };
                let call = async {
                    match semaphore.acquire_owned().await {
                        Ok(_permit) => caller.call(&backend, &critique_prompt).await,
                        Err(_) => CallAttemptResult::failure(ErrorKind::Unknown, "semaphore closed"),
                    }
                };

                let result = tokio::select! {
                    biased;
                    _ = token.cancelled() => CallAttemptResult::failure(
                        ErrorKind::Unknown,
                        "request cancelled",
                    )
                    .with_latency_ms(elapsed_ms(dispatched)),
                    _ = expired => CallAttemptResult::failure(
                        ErrorKind::Timeout,
                        "request deadline exceeded",
                    )
                    .with_latency_ms(elapsed_ms(dispatched)),
                    result = call => result,
                };
                (
                    index,
                    BackendResponse::new(backend, ResponseRole::Critique, result),
                )
            });
        }

        let mut slots: Vec<Option<BackendResponse>> = vec![None; candidates.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, response)) => {
                    if response.is_success() {
                        debug!("Critique from {} received", response.backend);
                    } else {
                        warn!(
                            "Critique from {} failed: {}",
                            response.backend,
                            response.result.error.as_deref().unwrap_or("unknown error")
                        );
                    }
                    progress.on_task_complete(
                        &Phase::CollectingCritiques,
                        &response.backend,
                        response.is_success(),
                    );
                    self.log_response("critique_response", Some(index), &response);
                    slots[index] = Some(response);
                }
                Err(e) => {
                    warn!("Critique task join error: {}", e);
                }
            }
        }

        progress.on_phase_complete(&Phase::CollectingCritiques);

        slots
            .into_iter()
            .zip(candidates)
            .map(|(slot, backend)| {
                slot.unwrap_or_else(|| {
                    BackendResponse::new(
                        backend,
                        ResponseRole::Critique,
                        CallAttemptResult::failure(ErrorKind::Unknown, "critique task aborted"),
                    )
                })
            })
            .collect()
    }

    fn log_response(&self, event_type: &'static str, index: Option<usize>, response: &BackendResponse) {
        self.logger.log(ConversationEvent::new(
            event_type,
            serde_json::json!({
                "backend": response.backend,
                "index": index,
                "success": response.is_success(),
                "attempts": response.result.attempts,
                "latency_ms": response.result.latency_ms,
                "error_kind": response.result.error_kind,
                "error": response.result.error,
                "content": response.result.content,
            }),
        ));
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
