//! Core domain concepts shared across all subdomains.
//!
//! - [`backend::Backend`]: one text-generation service and its static pricing
//! - [`prompt::Prompt`]: a validated prompt to dispatch
//! - [`error::ErrorKind`]: the failure taxonomy every call is reported in
//! - [`rate_limit`]: rate-limit signal detection in provider error bodies

pub mod backend;
pub mod error;
pub mod prompt;
pub mod rate_limit;
pub mod string;
