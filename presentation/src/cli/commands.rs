//! CLI command definitions

use clap::{Parser, ValueEnum};
use crosscheck_domain::OutputFormat as DomainOutputFormat;
use std::path::PathBuf;

/// Output format for orchestration results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Primary answer, every critique and the totals
    Full,
    /// Only the primary answer
    Primary,
    /// JSON output
    Json,
}

impl From<OutputFormat> for DomainOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Full => DomainOutputFormat::Full,
            OutputFormat::Primary => DomainOutputFormat::Primary,
            OutputFormat::Json => DomainOutputFormat::Json,
        }
    }
}

/// CLI arguments for crosscheck
#[derive(Parser, Debug)]
#[command(name = "crosscheck")]
#[command(author, version, about = "Ask one backend, have the others critique the answer")]
#[command(long_about = r#"
crosscheck sends a prompt to the backend best suited for it, then asks every
other configured backend to critique the answer.

Each backend may have several API keys. When a key is rate limited the next
one is used; transient failures are retried with exponential backoff. If the
chosen backend fails entirely, the fallback order is tried.

Configuration files are loaded from (in priority order):
1. CROSSCHECK_* environment variables
2. --config <path>          Explicit config file
3. ./crosscheck.toml        Project-level config
4. ~/.config/crosscheck/config.toml   Global config

Example:
  crosscheck "What's the best way to handle errors in Rust?"
  crosscheck --output json "Explain lifetimes"
  crosscheck --refine-with beta "Summarize the CAP theorem"
  crosscheck --key-status
"#)]
pub struct Cli {
    /// The prompt to dispatch
    pub prompt: Option<String>,

    /// Refine the primary answer using the critique from this backend
    #[arg(long, value_name = "BACKEND")]
    pub refine_with: Option<String>,

    /// Output format (overrides [output].format)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Request deadline in milliseconds; unfinished critiques are cancelled
    #[arg(long, value_name = "MS")]
    pub deadline_ms: Option<u64>,

    /// Print the masked credential pool status and exit
    #[arg(long)]
    pub key_status: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Directory for daily rolling diagnostic log files
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Append a JSONL transcript of every call to this file
    #[arg(long, value_name = "PATH")]
    pub transcript: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "crosscheck",
            "--refine-with",
            "beta",
            "-o",
            "json",
            "--deadline-ms",
            "1500",
            "-vv",
            "Explain ownership",
        ])
        .unwrap();
        assert_eq!(cli.prompt.as_deref(), Some("Explain ownership"));
        assert_eq!(cli.refine_with.as_deref(), Some("beta"));
        assert_eq!(cli.output, Some(OutputFormat::Json));
        assert_eq!(cli.deadline_ms, Some(1500));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_output_format_conversion() {
        assert_eq!(
            DomainOutputFormat::from(OutputFormat::Primary),
            DomainOutputFormat::Primary
        );
    }
}
