//! Infrastructure layer for crosscheck
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod http;
pub mod logging;
pub mod selector;

// Re-export commonly used types
pub use config::{ConfigError, ConfigLoader, FileConfig};
pub use http::ChatCompletionsClient;
pub use logging::JsonlConversationLogger;
pub use selector::{KeywordRule, KeywordSelector, StaticSelector};
