//! Run statistics.

use std::fmt;
use std::time::Duration;

use observability::RunSummary;

/// Why the run loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Command source closed (quit / EOF)
    CommandSource,
    /// Ctrl-C or SIGTERM
    Signal,
    /// `--duration` elapsed
    Duration,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CommandSource => "command source closed",
            Self::Signal => "shutdown signal",
            Self::Duration => "duration elapsed",
        })
    }
}

#[derive(Debug, Clone)]
pub struct RunStats {
    pub duration: Duration,
    pub stop_reason: StopReason,
    /// Startup commands plus commands received while listening
    pub commands_executed: u64,
    pub modules: usize,
    pub queues: RunSummary,
}

impl RunStats {
    pub fn print_summary(&self) {
        println!("\n=== Run Statistics ===");
        println!("Duration: {:.2}s", self.duration.as_secs_f64());
        println!("Stopped by: {}", self.stop_reason);
        println!("Modules: {}", self.modules);
        println!("Commands executed: {}", self.commands_executed);
        println!();
        print!("{}", self.queues);
    }
}
