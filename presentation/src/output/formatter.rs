//! Output formatter trait

use crosscheck_domain::{OrchestrationResult, OutputFormat, PoolStatus, RefinementResult};

/// Trait for formatting orchestration results
pub trait OutputFormatter {
    /// Primary answer, critiques and totals
    fn format(&self, result: &OrchestrationResult) -> String;

    /// Format as JSON
    fn format_json(&self, result: &OrchestrationResult) -> String;

    /// Primary answer only (concise output)
    fn format_primary_only(&self, result: &OrchestrationResult) -> String;

    fn format_refinement(&self, result: &RefinementResult) -> String;

    fn format_key_status(&self, pools: &[PoolStatus]) -> String;

    /// Dispatch on the configured format
    fn render(&self, result: &OrchestrationResult, format: OutputFormat) -> String {
        match format {
            OutputFormat::Full => self.format(result),
            OutputFormat::Primary => self.format_primary_only(result),
            OutputFormat::Json => self.format_json(result),
        }
    }
}
