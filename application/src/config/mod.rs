//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`RetryPolicy`]: attempt budget and backoff for one resilient call
//! - [`RotationSettings`]: credential recovery window and history size
//! - [`OrchestrationParams`]: fallback order, critique width, deadlines

pub mod orchestration_params;
pub mod retry_policy;
pub mod rotation_settings;

pub use orchestration_params::OrchestrationParams;
pub use retry_policy::RetryPolicy;
pub use rotation_settings::RotationSettings;
