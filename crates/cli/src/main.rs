//! # daq-app
//!
//! Command-line host for module/queue DAQ applications.
//!
//! - Graph file loading and validation
//! - Graph construction and command dispatch
//! - Graceful shutdown on Ctrl-C / SIGTERM

mod app;
mod cli;
mod commands;
mod error;

use anyhow::Result;
use clap::Parser;
use observability::{LogFormat, ObservabilityConfig};
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_app, run_info, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "daq-app starting");

    let result = match &cli.command {
        Commands::Run(args) => run_app(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

fn init_logging(cli: &Cli) -> Result<()> {
    let default_log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let log_format = match cli.log_format {
        cli::LogFormat::Json => LogFormat::Json,
        cli::LogFormat::Pretty => LogFormat::Pretty,
        cli::LogFormat::Compact => LogFormat::Compact,
    };

    // Metrics are installed by `run` only
    observability::init_with_config(ObservabilityConfig {
        log_format,
        metrics_port: None,
        default_log_level: default_log_level.to_string(),
    })
}
