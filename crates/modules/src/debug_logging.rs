//! DebugLogging - a module with no queues that logs every command it receives

use contracts::{CommandResult, Module, SUCCESS};
use parking_lot::Mutex;
use tracing::info;

use crate::registry::ModuleInit;

/// Logs each command and its arguments, always succeeding
pub struct DebugLoggingModule {
    name: String,
    received: Mutex<Vec<String>>,
}

impl DebugLoggingModule {
    pub fn new(init: ModuleInit) -> Self {
        Self {
            name: init.name,
            received: Mutex::new(Vec::new()),
        }
    }

    /// Commands seen so far, in arrival order
    pub fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    fn log(&self, command: &str, args: &[String]) -> CommandResult {
        info!(module = %self.name, command, args = ?args, "executing command");
        self.received.lock().push(command.to_string());
        Ok(SUCCESS.to_string())
    }
}

impl Module for DebugLoggingModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn configure(&self, args: &[String]) -> CommandResult {
        self.log("configure", args)
    }

    fn start(&self, args: &[String]) -> CommandResult {
        self.log("start", args)
    }

    fn stop(&self, args: &[String]) -> CommandResult {
        self.log("stop", args)
    }
}
