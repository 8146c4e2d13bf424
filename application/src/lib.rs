//! Application layer for crosscheck
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod rotation;
pub mod use_cases;

// Re-export commonly used types
pub use config::{OrchestrationParams, RetryPolicy, RotationSettings};
pub use ports::{
    backend_client::{BackendClient, Completion, CompletionRequest, TransportError},
    clock::{Clock, ManualClock, SystemClock},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    progress::{NoProgress, ProgressNotifier},
    selector::{BackendSelector, SelectorError},
};
pub use rotation::manager::{KeyRotationManager, RotationError};
pub use use_cases::refine_response::{RefineInput, RefineResponseUseCase};
pub use use_cases::resilient_call::ResilientCaller;
pub use use_cases::run_orchestration::{
    RunOrchestrationError, RunOrchestrationInput, RunOrchestrationUseCase,
};
