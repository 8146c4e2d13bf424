//! CLI entrypoint for crosscheck
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use crosscheck_application::{
    KeyRotationManager, NoProgress, ProgressNotifier, RefineInput, ResilientCaller,
    RunOrchestrationInput, RunOrchestrationUseCase, SystemClock,
};
use crosscheck_application::ports::conversation_logger::{
    ConversationLogger, NoConversationLogger,
};
use crosscheck_domain::OutputFormat;
use crosscheck_infrastructure::{
    ChatCompletionsClient, ConfigLoader, FileConfig, JsonlConversationLogger,
};
use crosscheck_presentation::{
    Cli, ConsoleFormatter, OutputFormatter, ProgressReporter, SimpleProgress,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = init_logging(cli.verbose, cli.log_dir.as_deref());

    info!("Starting crosscheck");

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_deref()) {
            println!("{}", line);
        }
        return Ok(());
    }

    // === Load Configuration ===
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).context("failed to load configuration")?
    };
    check_config(&config)?;

    if !config.output.color {
        colored::control::set_override(false);
    }

    // === Dependency Injection ===
    let transcript: Arc<dyn ConversationLogger> = match &cli.transcript {
        Some(path) => match JsonlConversationLogger::open(path) {
            Some(logger) => Arc::new(logger),
            None => Arc::new(NoConversationLogger),
        },
        None => Arc::new(NoConversationLogger),
    };

    let catalog = Arc::new(config.to_catalog()?);
    let rotation = Arc::new(
        KeyRotationManager::new(
            config.credential_pools(),
            config.rotation.to_settings(),
            Arc::new(SystemClock),
        )
        .with_logger(transcript.clone()),
    );

    if cli.key_status {
        print!("{}", ConsoleFormatter::format_key_status(&rotation.status(None)));
        return Ok(());
    }

    let prompt = match &cli.prompt {
        Some(p) => p.clone(),
        None => bail!("A prompt is required. Use --key-status or --show-config for other modes."),
    };

    // Prompts no rule matches go to the default backend, else the first one
    let fallback_backend = config
        .orchestration
        .default_backend
        .clone()
        .or_else(|| catalog.names().into_iter().next());

    let client = Arc::new(ChatCompletionsClient::new(config.endpoints())?);
    let caller = ResilientCaller::new(client, rotation, catalog, config.retry.to_policy())
        .with_temperature(config.orchestration.temperature);

    let params = config.orchestration.to_params();
    let selector = Arc::new(
        config
            .selector
            .to_selector(fallback_backend.as_deref(), params.default_confidence),
    );

    let cancellation = CancellationToken::new();
    spawn_ctrl_c_handler(cancellation.clone());

    let use_case = RunOrchestrationUseCase::new(caller, selector, params)
        .with_logger(transcript)
        .with_cancellation(cancellation);

    let mut input = RunOrchestrationInput::from_text(prompt)?;
    if let Some(ms) = cli.deadline_ms {
        input = input.with_deadline(Duration::from_millis(ms));
    }

    // Execute with or without progress reporting
    let progress: Box<dyn ProgressNotifier> = if cli.quiet || !config.output.progress {
        Box::new(NoProgress)
    } else if config.output.color {
        Box::new(ProgressReporter::new())
    } else {
        Box::new(SimpleProgress)
    };
    let result = use_case
        .execute_with_progress(input, progress.as_ref())
        .await?;

    // Output results
    let format: OutputFormat = cli
        .output
        .map(Into::into)
        .or(config.output.format)
        .unwrap_or_default();
    println!("{}", ConsoleFormatter.render(&result, format));

    if let Some(source) = &cli.refine_with {
        let Some(refine) = RefineInput::from_result(&result, source) else {
            bail!(
                "Cannot refine: no successful primary answer and critique from '{}'",
                source
            );
        };
        let refinement = use_case.refine(refine).await;
        let output = if format == OutputFormat::Json {
            ConsoleFormatter::format_refinement_json(&refinement)
        } else {
            ConsoleFormatter::format_refinement(&refinement)
        };
        println!("{}", output);
    }

    Ok(())
}

/// Install the stderr subscriber and, with `--log-dir`, a daily rolling file.
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "crosscheck.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}

/// Print warnings, abort on errors.
fn check_config(config: &FileConfig) -> Result<()> {
    let issues = config.validate();
    for issue in issues.iter().filter(|i| !i.is_error()) {
        warn!("{}", issue.message);
        eprintln!("warning: {}", issue.message);
    }
    let errors: Vec<_> = issues.iter().filter(|i| i.is_error()).collect();
    if !errors.is_empty() {
        for issue in &errors {
            eprintln!("error: {}", issue.message);
        }
        bail!("invalid configuration ({} error(s))", errors.len());
    }
    Ok(())
}

fn spawn_ctrl_c_handler(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling in-flight requests");
            token.cancel();
        }
    });
}
