//! Domain layer for crosscheck
//!
//! This crate contains the core types, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Backends and credential pools
//!
//! - **Backend**: one text-generation service with a wire model id and pricing
//! - **Credential pool**: the ordered API keys for one backend, with per-key
//!   rate-limit state and cyclic rotation
//!
//! ## Dispatch results
//!
//! - **Primary response**: the answer from the backend chosen for a prompt
//! - **Critique**: a short evaluation of the primary answer by another backend
//! - **Refinement**: the primary backend improving its answer with a critique

pub mod config;
pub mod core;
pub mod credential;
pub mod orchestration;
pub mod prompt;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use core::{
    backend::{Backend, BackendCatalog},
    error::{DomainError, ErrorKind},
    prompt::Prompt,
    rate_limit::{is_rate_limit_signal, mentions_rate_limit},
    string::{mask_secret, truncate},
};
pub use credential::{
    entities::{Credential, CredentialPool},
    rotation_log::RotationLog,
    value_objects::{KeyLease, KeyStatus, PoolStatus, RotationEvent, RotationOutcome},
};
pub use orchestration::{
    entities::{OrchestrationRun, Phase},
    value_objects::{
        BackendResponse, BackendSelection, CallAttemptResult, OrchestrationResult,
        RefinementResult, ResponseRole, TokenUsage,
    },
};
pub use prompt::PromptTemplate;
