//! Application assembly and run loop.

mod builder;
mod runner;
mod stats;

pub use builder::build_graph;
pub use runner::{Application, RunConfig};
pub use stats::{RunStats, StopReason};
