//! Layered error definitions
//!
//! Categorized by source: module commands / module configuration / graph blueprint

use thiserror::Error;

/// Errors reported by a module's command entry point
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleError {
    /// The module does not understand the command
    #[error("command '{command}' is not recognised")]
    UnknownCommand { command: String },

    /// The command was understood but could not complete
    #[error("command '{command}' failed to execute: {reason}")]
    CommandFailed { command: String, reason: String },
}

impl ModuleError {
    /// Create unknown command error
    pub fn unknown_command(command: impl Into<String>) -> Self {
        Self::UnknownCommand {
            command: command.into(),
        }
    }

    /// Create command failed error
    pub fn command_failed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// Command string this error refers to
    pub fn command(&self) -> &str {
        match self {
            Self::UnknownCommand { command } | Self::CommandFailed { command, .. } => command,
        }
    }

    /// True if the command was not understood at all
    pub fn is_unknown_command(&self) -> bool {
        matches!(self, Self::UnknownCommand { .. })
    }
}

/// Errors reading typed values out of a module's opaque configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required key absent
    #[error("missing required configuration key '{key}'")]
    MissingKey { key: String },

    /// Key present but of the wrong shape
    #[error("invalid value for configuration key '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    /// Create missing key error
    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingKey { key: key.into() }
    }

    /// Create invalid value error
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Errors loading or validating a graph blueprint
#[derive(Debug, Error)]
pub enum ContractError {
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }
}
