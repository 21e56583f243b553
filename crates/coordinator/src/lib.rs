//! # Coordinator
//!
//! The process container: a [`ModuleGraph`] registered once into a
//! [`ProcessCoordinator`], which then dispatches commands coming from a
//! [`CommandFacility`] following the graph's command-order table.

mod coordinator;
mod error;
mod facility;
mod graph;

pub use coordinator::{CommandReport, ModuleOutcome, ProcessCoordinator};
pub use error::{CoordinatorError, ModuleFailure};
pub use facility::{
    ChannelCommandFacility, CommandFacility, CommandMessage, CommandSender, ReaderCommandFacility,
};
pub use graph::ModuleGraph;
