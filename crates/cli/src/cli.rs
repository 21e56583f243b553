//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// DAQ application host - builds a module/queue graph and drives it with commands
#[derive(Parser, Debug)]
#[command(
    name = "daq-app",
    author,
    version,
    about = "Host a module/queue data-acquisition application",
    long_about = "Builds a graph of modules connected by bounded queues from a TOML or JSON\n\
                  file, registers it with a process coordinator and dispatches\n\
                  configure/start/stop commands from the command line or stdin."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "DAQ_APP_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "DAQ_APP_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the graph and dispatch commands until shut down
    Run(RunArgs),

    /// Validate a graph file without running it
    Validate(ValidateArgs),

    /// Display the queues, modules and command order of a graph file
    Info(InfoArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to the graph file (TOML or JSON)
    #[arg(short, long, default_value = "graph.toml", env = "DAQ_APP_GRAPH")]
    pub graph: PathBuf,

    /// Commands executed right after registration, in order
    #[arg(long, value_delimiter = ',', env = "DAQ_APP_COMMANDS")]
    pub commands: Vec<String>,

    /// Stop after this many seconds (0 = run until stopped)
    #[arg(long, default_value = "0", env = "DAQ_APP_DURATION")]
    pub duration: u64,

    /// Do not read commands from stdin
    #[arg(long)]
    pub no_stdin: bool,

    /// Queue sampling interval in milliseconds
    #[arg(long, default_value = "1000", env = "DAQ_APP_SAMPLE_INTERVAL_MS")]
    pub sample_interval_ms: u64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "DAQ_APP_METRICS_PORT")]
    pub metrics_port: u16,
}

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the graph file to validate
    #[arg(short, long, default_value = "graph.toml", env = "DAQ_APP_GRAPH")]
    pub graph: PathBuf,

    /// Output the validation result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to the graph file
    #[arg(short, long, default_value = "graph.toml", env = "DAQ_APP_GRAPH")]
    pub graph: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Include each module's configuration
    #[arg(long)]
    pub config: bool,

    /// List the module plugins this binary provides
    #[arg(long)]
    pub plugins: bool,
}

#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args_split_commands() {
        let cli = Cli::try_parse_from([
            "daq-app",
            "run",
            "--graph",
            "g.toml",
            "--commands",
            "configure,start",
            "--duration",
            "5",
            "--no-stdin",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.graph, PathBuf::from("g.toml"));
        assert_eq!(args.commands, vec!["configure", "start"]);
        assert_eq!(args.duration, 5);
        assert!(args.no_stdin);
        assert_eq!(args.metrics_port, 0);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["daq-app", "-q", "-v", "validate"]).is_err());
    }
}
