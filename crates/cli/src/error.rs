//! Error types for CLI operations.

use coordinator::CoordinatorError;
use modules::RegistryError;
use queues::QueueError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    /// Graph file not found
    #[error("Graph file not found: {path}")]
    GraphNotFound { path: String },

    /// A declared queue could not be created
    #[error("Failed to create queue '{name}': {source}")]
    QueueCreation {
        name: String,
        #[source]
        source: QueueError,
    },

    /// A declared module could not be instantiated
    #[error("Failed to create module '{name}': {source}")]
    ModuleCreation {
        name: String,
        #[source]
        source: RegistryError,
    },

    /// The graph was rejected by the coordinator
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),

    /// A scripted startup command failed
    #[error("Startup command '{command}' failed: {source}")]
    StartupCommand {
        command: String,
        #[source]
        source: CoordinatorError,
    },
}

impl CliError {
    pub fn graph_not_found(path: impl Into<String>) -> Self {
        Self::GraphNotFound { path: path.into() }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
