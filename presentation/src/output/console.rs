//! Console output formatter for orchestration results

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use crosscheck_domain::{
    BackendResponse, OrchestrationResult, PoolStatus, RefinementResult,
};

/// Formats orchestration results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete result
    pub fn format(result: &OrchestrationResult) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("crosscheck"));
        output.push('\n');

        output.push_str(&format!("{} {}\n", "Prompt:".cyan().bold(), result.prompt));
        output.push_str(&format!(
            "{} {}{}\n",
            "Backend:".cyan().bold(),
            result.selected_backend,
            Self::confidence_note(result)
        ));
        if result.tried_backends.len() > 1 {
            output.push_str(&format!(
                "{} {}\n",
                "Tried:".cyan().bold(),
                result.tried_backends.join(" -> ")
            ));
        }
        if let Some(error) = &result.selector_error {
            output.push_str(&format!("{} {}\n", "Selector:".yellow().bold(), error));
        }

        output.push_str(&Self::section_header("Primary Response"));
        output.push_str(&Self::response_block(&result.primary));

        output.push_str(&Self::section_header(&format!(
            "Critiques ({})",
            result.critique_summary()
        )));
        if result.critiques.is_empty() {
            output.push_str(&format!("\n{}\n", "No other backends configured.".dimmed()));
        }
        for critique in &result.critiques {
            output.push_str(&Self::response_block(critique));
        }

        output.push_str(&Self::section_header("Summary"));
        let status = if result.success {
            "success".green().bold()
        } else {
            "partial failure".red().bold()
        };
        output.push_str(&format!("\n{} {}\n", "Status:".bold(), status));
        if let Some(summary) = &result.error_summary {
            output.push_str(&format!("{} {}\n", "Errors:".bold(), summary));
        }
        output.push_str(&format!(
            "{} ${:.4}   {} {} ms\n",
            "Cost:".bold(),
            result.total_cost,
            "Latency:".bold(),
            result.total_latency_ms
        ));

        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json(result: &OrchestrationResult) -> String {
        serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
    }

    /// Primary answer only
    pub fn format_primary_only(result: &OrchestrationResult) -> String {
        if result.primary.is_success() {
            format!("{}\n", result.primary.content())
        } else {
            format!(
                "{} {}\n",
                "Error:".red().bold(),
                result
                    .error_summary
                    .as_deref()
                    .unwrap_or("primary response failed")
            )
        }
    }

    pub fn format_refinement(result: &RefinementResult) -> String {
        let mut output = Self::section_header(&format!(
            "Refinement ({} using critique from {})",
            result.response.backend, result.critique_source
        ));
        output.push_str(&Self::response_block(&result.response));
        output
    }

    pub fn format_refinement_json(result: &RefinementResult) -> String {
        serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
    }

    /// Masked key table, one block per provider
    pub fn format_key_status(pools: &[PoolStatus]) -> String {
        let mut output = String::new();
        if pools.is_empty() {
            output.push_str("No credential pools configured.\n");
            return output;
        }
        for pool in pools {
            output.push_str(&format!(
                "{} {} ({} of {} keys usable, {} requests)\n",
                "Provider".cyan().bold(),
                pool.provider.bold(),
                pool.usable_keys(),
                pool.keys.len(),
                pool.request_count
            ));
            for key in &pool.keys {
                let marker = if key.is_current { "*" } else { " " };
                let state = match (key.rate_limited, key.recovers_in_secs) {
                    (true, Some(secs)) if secs > 0 => format!("limited, {}s left", secs).red(),
                    (true, _) => "limited, recovered".yellow(),
                    (false, _) => "ok".green(),
                };
                output.push_str(&format!(
                    "  {} #{} {}  {}  {} req\n",
                    marker, key.index, key.masked_key, state, key.request_count
                ));
            }
        }
        output
    }

    fn response_block(response: &BackendResponse) -> String {
        let attempts = format!("attempts: {}", response.result.attempts).dimmed();
        if response.is_success() {
            format!(
                "\n{} {}\n{}\n",
                format!("── {} ──", response.backend).yellow().bold(),
                attempts,
                response.content()
            )
        } else {
            let kind = response
                .result
                .error_kind
                .map(|k| k.as_str())
                .unwrap_or("unknown");
            format!(
                "\n{} {}\nError ({}): {}\n",
                format!("── {} ──", response.backend).red().bold(),
                attempts,
                kind,
                response.result.error.as_deref().unwrap_or("Unknown")
            )
        }
    }

    fn confidence_note(result: &OrchestrationResult) -> String {
        result
            .confidence
            .get(&result.selected_backend)
            .map(|c| format!(" (confidence {:.2})", c))
            .unwrap_or_default()
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, result: &OrchestrationResult) -> String {
        Self::format(result)
    }

    fn format_json(&self, result: &OrchestrationResult) -> String {
        Self::format_json(result)
    }

    fn format_primary_only(&self, result: &OrchestrationResult) -> String {
        Self::format_primary_only(result)
    }

    fn format_refinement(&self, result: &RefinementResult) -> String {
        Self::format_refinement(result)
    }

    fn format_key_status(&self, pools: &[PoolStatus]) -> String {
        Self::format_key_status(pools)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosscheck_domain::{
        BackendSelection, CallAttemptResult, ErrorKind, KeyStatus, OutputFormat, ResponseRole,
        TokenUsage,
    };

    fn result() -> OrchestrationResult {
        colored::control::set_override(false);
        OrchestrationResult::aggregate(
            "What is Rust?",
            BackendSelection::only("alpha", 0.9),
            None,
            vec!["alpha".to_string()],
            BackendResponse::new(
                "alpha",
                ResponseRole::Primary,
                CallAttemptResult::success("A systems language.", TokenUsage::total(10)),
            ),
            vec![
                BackendResponse::new(
                    "beta",
                    ResponseRole::Critique,
                    CallAttemptResult::success("Accurate but brief.", TokenUsage::total(5)),
                ),
                BackendResponse::new(
                    "gamma",
                    ResponseRole::Critique,
                    CallAttemptResult::failure(ErrorKind::Timeout, "deadline"),
                ),
            ],
        )
    }

    #[test]
    fn test_full_output_lists_every_backend() {
        let text = ConsoleFormatter::format(&result());
        assert!(text.contains("A systems language."));
        assert!(text.contains("── beta ──"));
        assert!(text.contains("Error (timeout): deadline"));
        assert!(text.contains("1 of 2 critiques succeeded"));
        assert!(text.contains("(confidence 0.90)"));
    }

    #[test]
    fn test_primary_only() {
        assert_eq!(
            ConsoleFormatter.render(&result(), OutputFormat::Primary),
            "A systems language.\n"
        );
    }

    #[test]
    fn test_json_parses_back() {
        let json = ConsoleFormatter::format_json(&result());
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["selected_backend"], "alpha");
        assert_eq!(value["critiques"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_key_status_shows_only_masked_keys() {
        colored::control::set_override(false);
        let pools = vec![PoolStatus {
            provider: "alpha".to_string(),
            current_index: 1,
            request_count: 3,
            keys: vec![
                KeyStatus {
                    index: 0,
                    masked_key: "sk-a…wxyz".to_string(),
                    is_current: false,
                    rate_limited: true,
                    usable: false,
                    recovers_in_secs: Some(120),
                    request_count: 2,
                },
                KeyStatus {
                    index: 1,
                    masked_key: "sk-b…abcd".to_string(),
                    is_current: true,
                    rate_limited: false,
                    usable: true,
                    recovers_in_secs: None,
                    request_count: 1,
                },
            ],
        }];
        let text = ConsoleFormatter::format_key_status(&pools);
        assert!(text.contains("1 of 2 keys usable"));
        assert!(text.contains("limited, 120s left"));
        assert!(text.contains("* #1 sk-b…abcd"));
    }
}
