//! GraphBlueprint - Config Loader output
//!
//! Describes a complete application: queues, module instances and the
//! per-command delivery order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::ModuleConfig;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete module graph blueprint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Queue definitions
    #[serde(default)]
    pub queues: Vec<QueueSpec>,

    /// Module instances
    #[serde(default)]
    pub modules: Vec<ModuleSpec>,

    /// Modules that must receive a command before all others
    #[serde(default)]
    pub command_order: CommandOrderTable,
}

/// Element type carried by a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueValueType {
    /// `i64`
    Int,
    /// `Vec<i64>`
    IntVector,
    /// `String`
    Text,
}

impl QueueValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::IntVector => "int_vector",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for QueueValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Queue definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSpec {
    /// Unique alias
    pub name: String,

    /// Element type
    pub value_type: QueueValueType,

    /// Maximum number of buffered elements, must be > 0
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,
}

fn default_queue_capacity() -> usize {
    10
}

/// Module instance definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleSpec {
    /// Unique alias
    pub name: String,

    /// Registered implementation name (e.g. "FanOutIntVector")
    pub plugin: String,

    /// Opaque configuration, interpreted only by the module itself
    #[serde(default = "ModuleConfig::empty")]
    pub config: ModuleConfig,
}

/// Command name -> module aliases that must receive it first, in order
///
/// Command names are matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Vec<String>>", into = "BTreeMap<String, Vec<String>>")]
pub struct CommandOrderTable {
    entries: BTreeMap<String, Vec<String>>,
}

impl CommandOrderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ordered prefix for a command, replacing any previous entry
    pub fn insert<I, S>(&mut self, command: &str, modules: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.insert(
            command.to_ascii_lowercase(),
            modules.into_iter().map(Into::into).collect(),
        );
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with<I, S>(mut self, command: &str, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(command, modules);
        self
    }

    /// Ordered prefix for a command, empty if the command has no entry
    pub fn modules_for(&self, command: &str) -> &[String] {
        self.entries
            .get(&command.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterate over (command, ordered aliases)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<BTreeMap<String, Vec<String>>> for CommandOrderTable {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        let mut table = Self::new();
        for (command, modules) in map {
            table.insert(&command, modules);
        }
        table
    }
}

impl From<CommandOrderTable> for BTreeMap<String, Vec<String>> {
    fn from(table: CommandOrderTable) -> Self {
        table.entries
    }
}
