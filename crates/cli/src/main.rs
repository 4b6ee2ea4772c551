mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nopaystation_core::{load_config_or_default, validate_config, Config, LogFormat};

use cli::{Cli, Command};
use commands::AppContext;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}

/// Returns `false` when the command finished but something in it failed.
async fn run() -> Result<bool> {
    let cli = Cli::parse();

    let config = load_config_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    validate_config(&config).context("Configuration validation failed")?;

    init_logging(&config);
    debug!(config = ?cli.config, "Configuration loaded");

    let ctx = AppContext::new(config)?;
    debug!(workspace = %ctx.workspace.dir().display(), "Working directory ready");

    match &cli.command {
        Command::Sync(args) => commands::run_sync(&ctx, args).await,
        Command::Ingest { source_type, file } => commands::run_ingest(&ctx, source_type, file),
        Command::Sources(command) => commands::run_sources(&ctx, command).map(|()| true),
        Command::Titles(command) => commands::run_titles(&ctx, command).map(|()| true),
    }
}

fn init_logging(config: &Config) {
    let (pretty, json) = match config.logging.format {
        LogFormat::Pretty => (
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(pretty)
        .with(json)
        .init();
}
