//! Coordinator error types

use contracts::ModuleError;
use thiserror::Error;

/// A module that reported an error for a dispatched command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFailure {
    pub module: String,
    pub error: ModuleError,
}

impl std::fmt::Display for ModuleFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.module, self.error)
    }
}

/// Coordinator errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    /// `register` was called a second time
    #[error("a module graph has already been registered")]
    AlreadyRegistered,

    /// Dispatch attempted before `register`
    #[error("no module graph has been registered")]
    NotRegistered,

    /// Command-order table names a module that is not in the graph
    #[error("command order for '{command}' references unknown module '{module}'")]
    UnknownModule { command: String, module: String },

    /// A command-order list names the same module twice
    #[error("command order for '{command}' lists module '{module}' more than once")]
    DuplicateOrderEntry { command: String, module: String },

    /// Two modules share an alias
    #[error("module '{module}' is already part of the graph")]
    DuplicateModule { module: String },

    /// A module of the ordered prefix failed; dispatch was aborted
    #[error("command '{command}' aborted: ordered module '{module}' failed: {source}")]
    OrderedCommandFailed {
        command: String,
        module: String,
        #[source]
        source: ModuleError,
    },

    /// One or more modules of the unordered remainder failed
    #[error("command '{command}' failed on {} module(s): {}", .failures.len(), describe(.failures))]
    CommandFailed {
        command: String,
        failures: Vec<ModuleFailure>,
    },
}

fn describe(failures: &[ModuleFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
