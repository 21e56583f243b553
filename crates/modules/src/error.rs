//! Module-crate error types

use thiserror::Error;

/// Worker thread errors
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The OS refused to create the thread
    #[error("failed to spawn worker thread '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Module registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No factory registered under this plugin name
    #[error("unknown module plugin '{plugin}'")]
    UnknownPlugin { plugin: String },

    /// Plugin name already taken
    #[error("module plugin '{plugin}' is already registered")]
    DuplicatePlugin { plugin: String },
}
