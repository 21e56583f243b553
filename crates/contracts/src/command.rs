//! Lifecycle commands
//!
//! Commands travel as plain strings from the command source to the
//! coordinator and into every module. Modules parse them with
//! [`Command::parse`], which is case-insensitive.

use std::fmt;
use std::str::FromStr;

use crate::ModuleError;

/// Status string returned by a command handler that completed
pub const SUCCESS: &str = "Success";

/// Lifecycle command understood by every module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Configure,
    Start,
    Stop,
}

impl Command {
    /// All lifecycle commands, in their natural order
    pub const ALL: [Command; 3] = [Command::Configure, Command::Start, Command::Stop];

    /// Parse a command name, ignoring case
    ///
    /// # Errors
    /// Returns [`ModuleError::UnknownCommand`] carrying the original string.
    pub fn parse(name: &str) -> Result<Self, ModuleError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "configure" => Ok(Self::Configure),
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            _ => Err(ModuleError::unknown_command(name)),
        }
    }

    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configure => "configure",
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }
}

impl FromStr for Command {
    type Err = ModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A command as delivered by a command source: name plus free-form arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub name: String,
    pub args: Vec<String>,
}

impl CommandRequest {
    /// Request without arguments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Request with arguments
    pub fn with_args(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Split a whitespace-separated line into command and arguments
    ///
    /// Returns `None` for blank lines.
    pub fn from_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let name = parts.next()?;
        Some(Self {
            name: name.to_string(),
            args: parts.map(str::to_string).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Command::parse("configure").unwrap(), Command::Configure);
        assert_eq!(Command::parse("Start").unwrap(), Command::Start);
        assert_eq!(Command::parse("STOP").unwrap(), Command::Stop);
    }

    #[test]
    fn test_parse_unknown_keeps_original_string() {
        let err = Command::parse("Resume").unwrap_err();
        assert_eq!(err, ModuleError::unknown_command("Resume"));
    }

    #[test]
    fn test_request_from_line() {
        let req = CommandRequest::from_line("  start run=42 fast ").unwrap();
        assert_eq!(req.name, "start");
        assert_eq!(req.args, vec!["run=42".to_string(), "fast".to_string()]);
        assert!(CommandRequest::from_line("   ").is_none());
    }
}
