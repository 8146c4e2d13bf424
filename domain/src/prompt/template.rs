//! Prompt templates for the dispatch flow
//!
//! Every request is a single user message, so each template renders the
//! full instruction text.

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// Critique of another backend's answer.
    pub fn critique_prompt(prompt: &str, primary_backend: &str, primary_answer: &str) -> String {
        format!(
            r#"You are reviewing an answer written by another AI assistant ({}).

Original question:
{}

Answer under review:
{}

Write a short critique of this answer:
1. Factual errors or unsupported claims
2. Missing points that matter for the question
3. Concrete suggestions for improvement

Keep the critique under 200 words."#,
            primary_backend, prompt, primary_answer
        )
    }

    /// Used for critiques when no primary answer exists: each backend answers
    /// the question independently so the caller still gets usable output.
    pub fn independent_prompt(prompt: &str) -> String {
        format!(
            r#"No primary answer is available for the following question.
Please answer it directly and concisely.

Question:
{}"#,
            prompt
        )
    }

    /// Refinement of the primary backend's own answer using a chosen critique.
    pub fn refinement_prompt(
        prompt: &str,
        previous_answer: &str,
        critique: &str,
        critique_source: &str,
    ) -> String {
        format!(
            r#"Earlier you answered the question below. Another assistant ({}) reviewed your answer.

Question:
{}

Your previous answer:
{}

Critique:
{}

Rewrite your answer, addressing the valid points of the critique and keeping what was already correct. Reply with the improved answer only."#,
            critique_source, prompt, previous_answer, critique
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critique_prompt_embeds_answer() {
        let prompt = PromptTemplate::critique_prompt("What is Rust?", "Alpha", "A language.");
        assert!(prompt.contains("What is Rust?"));
        assert!(prompt.contains("A language."));
        assert!(prompt.contains("(Alpha)"));
    }

    #[test]
    fn test_independent_prompt() {
        let prompt = PromptTemplate::independent_prompt("What is Rust?");
        assert!(prompt.contains("No primary answer"));
        assert!(prompt.contains("What is Rust?"));
    }

    #[test]
    fn test_refinement_prompt_format() {
        let prompt = PromptTemplate::refinement_prompt(
            "What is Rust?",
            "A language.",
            "Mention memory safety.",
            "Beta",
        );
        assert!(prompt.contains("Your previous answer:\nA language."));
        assert!(prompt.contains("Mention memory safety."));
        assert!(prompt.contains("(Beta)"));
    }
}
