//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::CommandRequest;
use std::time::Duration;
use tracing::info;

use crate::app::{Application, RunConfig};
use crate::cli::RunArgs;
use crate::error::CliError;

/// Execute the `run` command
pub async fn run_app(args: &RunArgs) -> Result<()> {
    info!(graph = %args.graph.display(), "Loading graph");

    if !args.graph.exists() {
        return Err(CliError::graph_not_found(args.graph.display().to_string()).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.graph)
        .with_context(|| format!("Failed to load graph from {}", args.graph.display()))?;

    info!(
        queues = blueprint.queues.len(),
        modules = blueprint.modules.len(),
        "Graph loaded"
    );

    let config = RunConfig {
        blueprint,
        startup_commands: parse_commands(&args.commands),
        duration: (args.duration > 0).then(|| Duration::from_secs(args.duration)),
        listen_stdin: !args.no_stdin,
        sample_interval: Duration::from_millis(args.sample_interval_ms.max(1)),
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    };

    let stats = Application::new(config)
        .run(shutdown_signal())
        .await
        .context("Application run failed")?;

    info!(
        duration_secs = stats.duration.as_secs_f64(),
        commands = stats.commands_executed,
        reason = %stats.stop_reason,
        "daq-app finished"
    );
    stats.print_summary();
    Ok(())
}

/// `--commands` entries, each `name [args...]`
fn parse_commands(raw: &[String]) -> Vec<CommandRequest> {
    raw.iter().filter_map(|line| CommandRequest::from_line(line)).collect()
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands_skips_blanks_and_keeps_args() {
        let raw = vec!["configure".to_string(), " ".to_string(), "start fast".to_string()];
        assert_eq!(
            parse_commands(&raw),
            vec![
                CommandRequest::new("configure"),
                CommandRequest::with_args("start", vec!["fast".into()]),
            ]
        );
    }
}
