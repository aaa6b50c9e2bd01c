//! CLI entrypoint for parley
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result};
use clap::Parser;
use parley_application::{ChatSession, HistoryStore, SessionParams};
use parley_infrastructure::{
    ChatOverrides, ConfigLoader, HistoryChoice, JsonlHistoryStore, MemoryHistoryStore,
    ResolvedChat, build_gateway,
};
use parley_presentation::{ChatRepl, Cli};
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(&cli)?;

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).context("failed to load configuration")?
    };

    let overrides = ChatOverrides {
        provider: cli.provider.clone(),
        model: cli.model.clone(),
        api_key: cli.api_key.clone(),
        history: if cli.no_history {
            HistoryChoice::Disabled
        } else if let Some(path) = &cli.history {
            HistoryChoice::Path(path.clone())
        } else {
            HistoryChoice::Configured
        },
    };
    let resolved = ResolvedChat::resolve(&config, &overrides)?;

    info!(
        provider = %resolved.provider.kind,
        model = %resolved.model,
        base_url = %resolved.provider.base_url,
        "Starting parley"
    );

    if resolved.provider.credential.is_none() {
        warn!(
            provider = %resolved.provider.kind,
            "No API key found ({}); messages will not be sent",
            resolved.provider.credential_hint
        );
    }

    // === Dependency Injection ===
    let history: Arc<dyn HistoryStore> = match &resolved.history {
        Some(path) => Arc::new(JsonlHistoryStore::new(path)),
        None => Arc::new(MemoryHistoryStore::new()),
    };
    let gateway = build_gateway(resolved.provider);
    let session = ChatSession::open(gateway, history, SessionParams::new(resolved.model));

    let mut repl = ChatRepl::new(session).with_progress(!cli.quiet);
    if let Some(path) = &resolved.history {
        repl = repl.with_history_location(path.display().to_string());
    }

    repl.run().await?;
    Ok(())
}

/// Set up `tracing` from `-v` (or `RUST_LOG`), writing to stderr or `--log-file`.
fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let Some(path) = &cli.log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}
