//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod refine_response;
pub mod resilient_call;
pub mod run_orchestration;

#[cfg(test)]
pub(crate) mod test_support;
