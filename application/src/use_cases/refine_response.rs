//! Refine Response use case
//!
//! Re-invokes the primary backend with its own earlier answer and one
//! caller-chosen critique. A single resilient call; failures are returned
//! as-is with no fallback to other backends.

use crate::ports::backend_client::BackendClient;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::use_cases::resilient_call::ResilientCaller;
use crosscheck_domain::{
    BackendResponse, OrchestrationResult, PromptTemplate, RefinementResult, ResponseRole,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Input for the RefineResponse use case
#[derive(Debug, Clone, PartialEq)]
pub struct RefineInput {
    pub prompt: String,
    pub primary_backend: String,
    pub primary_text: String,
    pub critique_text: String,
    pub critique_source: String,
}

impl RefineInput {
    pub fn new(
        prompt: impl Into<String>,
        primary_backend: impl Into<String>,
        primary_text: impl Into<String>,
        critique_text: impl Into<String>,
        critique_source: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            primary_backend: primary_backend.into(),
            primary_text: primary_text.into(),
            critique_text: critique_text.into(),
            critique_source: critique_source.into(),
        }
    }

    /// Build from a finished orchestration, using the critique from
    /// `critique_source`. `None` if the primary failed or that critique is
    /// missing or failed.
    pub fn from_result(result: &OrchestrationResult, critique_source: &str) -> Option<Self> {
        if !result.primary.is_success() {
            return None;
        }
        let critique = result
            .critique_from(critique_source)
            .filter(|c| c.is_success())?;
        Some(Self::new(
            result.prompt.as_str(),
            result.primary.backend.as_str(),
            result.primary.content(),
            critique.content(),
            critique_source,
        ))
    }
}

/// Use case for refining a primary answer with one critique
pub struct RefineResponseUseCase<C: BackendClient + ?Sized + 'static> {
    caller: ResilientCaller<C>,
    logger: Arc<dyn ConversationLogger>,
}

impl<C: BackendClient + ?Sized + 'static> RefineResponseUseCase<C> {
    pub fn new(caller: ResilientCaller<C>) -> Self {
        Self {
            caller,
            logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub async fn execute(&self, input: RefineInput) -> RefinementResult {
        info!(
            "Refining {} answer with critique from {}",
            input.primary_backend, input.critique_source
        );

        let refinement_prompt = PromptTemplate::refinement_prompt(
            &input.prompt,
            &input.primary_text,
            &input.critique_text,
            &input.critique_source,
        );
        let result = self
            .caller
            .call(&input.primary_backend, &refinement_prompt)
            .await;

        if !result.success {
            warn!(
                "Refinement on {} failed: {}",
                input.primary_backend,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }

        let response = BackendResponse::new(
            input.primary_backend.as_str(),
            ResponseRole::Refinement,
            result,
        );
        self.logger.log(ConversationEvent::new(
            "refinement",
            serde_json::json!({
                "backend": response.backend,
                "critique_source": input.critique_source,
                "success": response.is_success(),
                "attempts": response.result.attempts,
                "error_kind": response.result.error_kind,
                "content": response.result.content,
            }),
        ));

        RefinementResult {
            prompt: input.prompt,
            critique_source: input.critique_source,
            response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryPolicy;
    use crate::use_cases::test_support::{Reply, ScriptedClient, catalog, rotation};
    use crosscheck_domain::{BackendSelection, CallAttemptResult, ErrorKind};

    fn use_case(client: &Arc<ScriptedClient>) -> RefineResponseUseCase<ScriptedClient> {
        let caller = ResilientCaller::new(
            Arc::clone(client),
            Arc::new(rotation(&[("Alpha", 1), ("Beta", 1)])),
            Arc::new(catalog(&["Alpha", "Beta"])),
            RetryPolicy::default().with_max_attempts(2),
        );
        RefineResponseUseCase::new(caller)
    }

    fn input() -> RefineInput {
        RefineInput::new("Explain ownership", "Alpha", "draft", "too vague", "Beta")
    }

    #[tokio::test(start_paused = true)]
    async fn test_refinement_calls_primary_backend() {
        let client = Arc::new(ScriptedClient::new());
        client.script("Alpha", vec![Reply::ok("better answer", 42)]);

        let result = use_case(&client).execute(input()).await;

        assert!(result.success());
        assert_eq!(result.response.role, ResponseRole::Refinement);
        assert_eq!(result.response.content(), "better answer");
        assert_eq!(result.critique_source, "Beta");
        assert_eq!(
            client.prompts("Alpha"),
            vec![PromptTemplate::refinement_prompt(
                "Explain ownership",
                "draft",
                "too vague",
                "Beta"
            )]
        );
        assert!(client.prompts("Beta").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refinement_failure_is_returned_without_fallback() {
        let client = Arc::new(ScriptedClient::new());
        client.script("Alpha", vec![Reply::unreachable("reset"); 2]);

        let result = use_case(&client).execute(input()).await;

        assert!(!result.success());
        assert_eq!(result.response.result.error_kind, Some(ErrorKind::Unreachable));
        assert_eq!(result.response.result.attempts, 2);
        assert!(client.prompts("Beta").is_empty());
    }

    #[test]
    fn test_from_result() {
        let ok = |backend: &str, role, text: &str| {
            BackendResponse::new(
                backend,
                role,
                CallAttemptResult::success(text, Default::default()),
            )
        };
        let result = OrchestrationResult::aggregate(
            "Explain ownership",
            BackendSelection::only("Alpha", 0.9),
            None,
            vec!["Alpha".to_string()],
            ok("Alpha", ResponseRole::Primary, "draft"),
            vec![
                ok("Beta", ResponseRole::Critique, "too vague"),
                BackendResponse::new(
                    "Gamma",
                    ResponseRole::Critique,
                    CallAttemptResult::failure(ErrorKind::Timeout, "slow"),
                ),
            ],
        );

        assert_eq!(RefineInput::from_result(&result, "Beta"), Some(input()));
        assert_eq!(RefineInput::from_result(&result, "Gamma"), None);
        assert_eq!(RefineInput::from_result(&result, "Delta"), None);
    }
}
