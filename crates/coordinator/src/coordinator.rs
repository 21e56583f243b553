//! ProcessCoordinator - owns the module graph and dispatches commands
//!
//! Dispatch of one command:
//! 1. Modules listed for the command in the order table, strictly in order.
//!    The first failure aborts the command.
//! 2. Every other module, concurrently. All are attempted; failures are
//!    collected.
//!
//! Commands are serialized: a second `execute_command` waits for the first.

use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};
use std::thread;

use contracts::{Module, ModuleError};
use metrics::counter;
use parking_lot::Mutex;
use queues::QueueSummary;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{CoordinatorError, ModuleFailure};
use crate::facility::CommandFacility;
use crate::graph::ModuleGraph;

/// Status string returned by one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleOutcome {
    pub module: String,
    pub status: String,
}

/// Result of a fully successful command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReport {
    pub command: String,
    /// Ordered modules first, in table order, then the remainder by alias
    pub outcomes: Vec<ModuleOutcome>,
}

/// Top-level process container
#[derive(Debug, Default)]
pub struct ProcessCoordinator {
    graph: OnceLock<ModuleGraph>,
    dispatch: Mutex<()>,
}

impl ProcessCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt a module graph
    ///
    /// # Errors
    /// - [`CoordinatorError::AlreadyRegistered`] on a second call
    /// - [`CoordinatorError::UnknownModule`] / [`CoordinatorError::DuplicateOrderEntry`]
    ///   if the command-order table does not match the module set
    pub fn register(&self, graph: ModuleGraph) -> Result<(), CoordinatorError> {
        if self.graph.get().is_some() {
            return Err(CoordinatorError::AlreadyRegistered);
        }
        graph.validate()?;

        let modules = graph.len();
        let queues = graph.queues().len();
        self.graph
            .set(graph)
            .map_err(|_| CoordinatorError::AlreadyRegistered)?;
        info!(modules, queues, "module graph registered");
        Ok(())
    }

    pub fn is_registered(&self) -> bool {
        self.graph.get().is_some()
    }

    pub fn graph(&self) -> Option<&ModuleGraph> {
        self.graph.get()
    }

    /// Queue states of the registered graph
    pub fn queue_summaries(&self) -> Vec<QueueSummary> {
        self.graph
            .get()
            .map(|graph| graph.queues().summaries())
            .unwrap_or_default()
    }

    /// Dispatch `command` to every module
    ///
    /// # Errors
    /// - [`CoordinatorError::NotRegistered`] before `register`
    /// - [`CoordinatorError::OrderedCommandFailed`] if an ordered module failed;
    ///   nothing after it received the command
    /// - [`CoordinatorError::CommandFailed`] if any remaining module failed
    #[instrument(name = "coordinator_execute", skip(self, args))]
    pub fn execute_command(
        &self,
        command: &str,
        args: &[String],
    ) -> Result<CommandReport, CoordinatorError> {
        let graph = self.graph.get().ok_or(CoordinatorError::NotRegistered)?;
        let _serial = self.dispatch.lock();

        let ordered = graph.command_order().modules_for(command);
        let mut outcomes = Vec::with_capacity(graph.len());

        for alias in ordered {
            let module = graph
                .module(alias)
                .ok_or_else(|| CoordinatorError::UnknownModule {
                    command: command.to_string(),
                    module: alias.clone(),
                })?;
            debug!(module = %alias, "dispatching ordered command");
            match run_one(module, command, args) {
                Ok(status) => outcomes.push(ModuleOutcome {
                    module: alias.clone(),
                    status,
                }),
                Err(source) => {
                    error!(module = %alias, error = %source, "ordered module failed, aborting command");
                    return Err(CoordinatorError::OrderedCommandFailed {
                        command: command.to_string(),
                        module: alias.clone(),
                        source,
                    });
                }
            }
        }

        let ordered_set: BTreeSet<&str> = ordered.iter().map(String::as_str).collect();
        let remainder: Vec<(&str, &Arc<dyn Module>)> = graph
            .modules()
            .filter(|(alias, _)| !ordered_set.contains(alias))
            .collect();

        let results = dispatch_unordered(&remainder, command, args);
        let mut failures = Vec::new();
        for (alias, result) in results {
            match result {
                Ok(status) => outcomes.push(ModuleOutcome {
                    module: alias.to_string(),
                    status,
                }),
                Err(error) => {
                    error!(module = %alias, error = %error, "module failed to execute command");
                    failures.push(ModuleFailure {
                        module: alias.to_string(),
                        error,
                    });
                }
            }
        }

        if !failures.is_empty() {
            return Err(CoordinatorError::CommandFailed {
                command: command.to_string(),
                failures,
            });
        }

        info!(modules = outcomes.len(), "command completed");
        Ok(CommandReport {
            command: command.to_string(),
            outcomes,
        })
    }

    /// Forward commands from `facility` until it signals shutdown
    ///
    /// Command failures are logged and do not end the loop.
    /// Returns the number of commands processed.
    ///
    /// # Errors
    /// [`CoordinatorError::NotRegistered`] before `register`.
    pub fn listen(&self, facility: &mut dyn CommandFacility) -> Result<u64, CoordinatorError> {
        if !self.is_registered() {
            return Err(CoordinatorError::NotRegistered);
        }

        info!("listening for commands");
        let mut processed = 0;
        while let Some(request) = facility.next_command() {
            match self.execute_command(&request.name, &request.args) {
                Ok(report) => {
                    info!(command = %report.command, modules = report.outcomes.len(), "command succeeded")
                }
                Err(e) => warn!(command = %request.name, error = %e, "command failed"),
            }
            processed += 1;
        }
        info!(processed, "command source closed, listener exiting");
        Ok(processed)
    }
}

fn run_one(module: &Arc<dyn Module>, command: &str, args: &[String]) -> Result<String, ModuleError> {
    let result = module.execute_command(command, args);
    let status = if result.is_ok() { "success" } else { "failure" };
    counter!(
        "daq_commands_total",
        "module" => module.name().to_string(),
        "command" => command.to_ascii_lowercase(),
        "status" => status
    )
    .increment(1);
    result
}

fn dispatch_unordered<'g>(
    modules: &[(&'g str, &'g Arc<dyn Module>)],
    command: &str,
    args: &[String],
) -> Vec<(&'g str, Result<String, ModuleError>)> {
    match modules {
        [] => Vec::new(),
        [(alias, module)] => vec![(*alias, run_one(module, command, args))],
        _ => thread::scope(|scope| {
            let handles: Vec<_> = modules
                .iter()
                .map(|(alias, module)| {
                    (*alias, scope.spawn(move || run_one(module, command, args)))
                })
                .collect();

            handles
                .into_iter()
                .map(|(alias, handle)| {
                    let result = handle.join().unwrap_or_else(|_| {
                        Err(ModuleError::command_failed(
                            command,
                            "module panicked while handling the command",
                        ))
                    });
                    (alias, result)
                })
                .collect()
        }),
    }
}
