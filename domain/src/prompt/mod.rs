//! Prompt templates for primary, critique and refinement requests.

pub mod template;

pub use template::PromptTemplate;
