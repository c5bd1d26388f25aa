//! Assist
//!
//! Main entry point for the assist binary.
//! Serves retrieval-augmented answers over HTTP or answers one query from the
//! command line.

mod commands;
mod http;

use anyhow::Context;
use assist_core::config::{AppConfig, LogFormat};
use assist_core::logging;
use clap::{Parser, Subcommand};
use commands::{AskCommand, ServeCommand};
use std::path::PathBuf;

/// Assist - retrieval-augmented answers for support questions
#[derive(Parser, Debug)]
#[command(name = "assist")]
#[command(about = "Retrieval-augmented answers for support questions", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "ASSIST_CONFIG")]
    config: Option<PathBuf>,

    /// Log level or filter (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve(ServeCommand),

    /// Answer a single query and exit
    Ask(AskCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Defaults < config file < environment
    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    let bind = match &cli.command {
        Commands::Serve(cmd) => cmd.bind.clone(),
        Commands::Ask(_) => None,
    };

    // CLI flags win
    let config = config.with_overrides(
        bind,
        cli.log_level.clone(),
        cli.log_format,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(
        config.logging.level.as_deref(),
        config.logging.no_color,
        config.logging.format,
    )?;

    tracing::info!("Assist starting");
    tracing::debug!("Store backend: {}", config.store.backend);
    tracing::debug!(
        "Embedding: {} ({})",
        config.embedding.provider,
        config.embedding.model
    );
    tracing::debug!("Chat: {} ({})", config.chat.provider, config.chat.model);

    config.validate().context("invalid configuration")?;

    let command_name = match &cli.command {
        Commands::Serve(_) => "serve",
        Commands::Ask(_) => "ask",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match &cli.command {
        Commands::Serve(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {:#}", e),
    }

    result
}
