//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the framework:
//! the module command contract, the opaque module configuration and the
//! graph blueprint produced by the config loader.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Command model
//! - Commands are strings, matched case-insensitively (`configure`, `start`, `stop`)
//! - A handler returns a status string (`"Success"`) or a [`ModuleError`]

mod blueprint;
mod command;
mod config;
mod error;
mod module;

pub use blueprint::*;
pub use command::{Command, CommandRequest, SUCCESS};
pub use config::ModuleConfig;
pub use error::*;
pub use module::{CommandResult, Module};
