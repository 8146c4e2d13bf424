//! Concrete [`BackendSelector`](crosscheck_application::BackendSelector) strategies.
//!
//! The orchestration engine depends only on the trait; these are the
//! strategies the binary can be configured with.

mod keyword;
mod static_selector;

pub use keyword::{KeywordRule, KeywordSelector};
pub use static_selector::StaticSelector;
