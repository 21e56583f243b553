//! Application runner - registers the graph and drives the coordinator.

use std::future::Future;
use std::io::BufRead;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{CommandRequest, GraphBlueprint};
use coordinator::{
    ChannelCommandFacility, CommandFacility, CommandReport, CommandSender, CoordinatorError,
    ProcessCoordinator, ReaderCommandFacility,
};
use modules::ModuleRegistry;
use observability::{record_queue_summaries, QueueDepthAggregator};
use tracing::{error, info, warn};

use super::{build_graph, RunStats, StopReason};
use crate::error::CliError;

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub blueprint: GraphBlueprint,

    /// Executed in order right after registration
    pub startup_commands: Vec<CommandRequest>,

    /// Stop after this long (None = until stopped)
    pub duration: Option<Duration>,

    /// Forward stdin lines to the coordinator
    pub listen_stdin: bool,

    pub sample_interval: Duration,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

pub struct Application {
    config: RunConfig,
    registry: ModuleRegistry,
}

impl Application {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            registry: ModuleRegistry::with_builtins(),
        }
    }

    /// Run until the command source closes, `shutdown` resolves or the
    /// duration elapses; modules are always sent a final `stop`.
    pub async fn run<S>(self, shutdown: S) -> Result<RunStats>
    where
        S: Future<Output = ()>,
    {
        let started = Instant::now();

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
        }

        let graph = build_graph(&self.config.blueprint, &self.registry)
            .context("Failed to build module graph")?;
        let modules = graph.len();

        let coordinator = Arc::new(ProcessCoordinator::new());
        coordinator.register(graph).map_err(CliError::from)?;

        let mut commands_executed = 0;
        for request in &self.config.startup_commands {
            let result = dispatch(&coordinator, request.clone()).await?;
            if let Err(source) = result {
                error!(command = %request.name, error = %source, "startup command failed, stopping modules");
                let _ = dispatch(&coordinator, CommandRequest::new("stop")).await;
                return Err(CliError::StartupCommand {
                    command: request.name.clone(),
                    source,
                }
                .into());
            }
            commands_executed += 1;
        }

        let (sender, facility) = ChannelCommandFacility::channel();
        if self.config.listen_stdin {
            spawn_stdin_forwarder(sender.clone())?;
        }

        let mut listener = {
            let coordinator = Arc::clone(&coordinator);
            let mut facility = facility;
            tokio::task::spawn_blocking(move || coordinator.listen(&mut facility))
        };

        let deadline = async {
            match self.config.duration {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);
        tokio::pin!(shutdown);

        let mut aggregator = QueueDepthAggregator::new();
        let mut ticker = tokio::time::interval(self.config.sample_interval);

        let (stop_reason, listened) = loop {
            tokio::select! {
                joined = &mut listener => break (StopReason::CommandSource, joined),
                _ = &mut shutdown => {
                    warn!("Received shutdown signal, stopping modules...");
                    sender.shutdown();
                    break (StopReason::Signal, (&mut listener).await);
                }
                _ = &mut deadline => {
                    info!("Run duration elapsed, stopping modules...");
                    sender.shutdown();
                    break (StopReason::Duration, (&mut listener).await);
                }
                _ = ticker.tick() => {
                    let summaries = coordinator.queue_summaries();
                    record_queue_summaries(&summaries);
                    aggregator.update(&summaries);
                }
            }
        };

        commands_executed += listened
            .context("Command listener panicked")?
            .map_err(CliError::from)?;

        // Stop is idempotent, so modules already stopped by a command are unaffected
        if let Err(e) = dispatch(&coordinator, CommandRequest::new("stop")).await? {
            warn!(error = %e, "final stop reported failures");
        }
        aggregator.update(&coordinator.queue_summaries());

        Ok(RunStats {
            duration: started.elapsed(),
            stop_reason,
            commands_executed,
            modules,
            queues: aggregator.summary(),
        })
    }
}

/// Run one command on the blocking pool
async fn dispatch(
    coordinator: &Arc<ProcessCoordinator>,
    request: CommandRequest,
) -> Result<std::result::Result<CommandReport, CoordinatorError>> {
    let coordinator = Arc::clone(coordinator);
    let result = tokio::task::spawn_blocking(move || {
        coordinator.execute_command(&request.name, &request.args)
    })
    .await
    .context("Command dispatch panicked")?;

    if let Ok(ref report) = result {
        info!(command = %report.command, modules = report.outcomes.len(), "command succeeded");
    }
    Ok(result)
}

/// Forward stdin commands into the channel; quit / EOF shuts the listener down
fn spawn_stdin_forwarder(sender: CommandSender) -> Result<()> {
    std::thread::Builder::new()
        .name("stdin-commands".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            forward_commands(stdin.lock(), &sender);
        })
        .context("Failed to spawn stdin reader")?;
    Ok(())
}

fn forward_commands<R: BufRead>(reader: R, sender: &CommandSender) {
    let mut lines = ReaderCommandFacility::new(reader);
    while let Some(request) = lines.next_command() {
        if !sender.execute(request) {
            return;
        }
    }
    sender.shutdown();
}
