//! Module trait - the unit of work in a module graph
//!
//! Every processing unit exposes one command entry point. The default
//! [`Module::execute_command`] parses the command and routes it to the
//! lifecycle handlers a concrete module implements.

use crate::{Command, ModuleError};

/// Result of a command handler: a status string on success
pub type CommandResult = Result<String, ModuleError>;

/// Processing unit driven by lifecycle commands
///
/// Implementations are shared between the coordinator and its dispatch
/// threads, so handlers take `&self`. A module must serialize its own
/// handlers (configure/start/stop never run concurrently on one instance);
/// the builtin modules do this with an internal lock.
///
/// # Contract
///
/// - `configure` resolves queue handles and reads tunables from the
///   module's configuration, applying defaults for missing optional keys.
/// - `start` is idempotent and launches the worker thread, if any. A module
///   that was never configured must refuse to start.
/// - `stop` is idempotent and returns only after the worker thread, if any,
///   has exited.
pub trait Module: Send + Sync {
    /// Unique instance name (alias) within the graph
    fn name(&self) -> &str;

    /// Handle `configure`
    fn configure(&self, args: &[String]) -> CommandResult;

    /// Handle `start`
    fn start(&self, args: &[String]) -> CommandResult;

    /// Handle `stop`
    fn stop(&self, args: &[String]) -> CommandResult;

    /// Single entry point for the coordinator
    ///
    /// # Errors
    /// [`ModuleError::UnknownCommand`] for anything but configure/start/stop
    /// (any case), otherwise whatever the handler reports.
    fn execute_command(&self, cmd: &str, args: &[String]) -> CommandResult {
        match Command::parse(cmd)? {
            Command::Configure => self.configure(args),
            Command::Start => self.start(args),
            Command::Stop => self.stop(args),
        }
    }
}
