//! ModuleGraph - the module set, queue set and command-order table handed
//! to the coordinator in one piece

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use contracts::{CommandOrderTable, Module};
use queues::QueueRegistry;

use crate::error::CoordinatorError;

/// Modules by alias, the queues they share and the command order
pub struct ModuleGraph {
    modules: BTreeMap<String, Arc<dyn Module>>,
    queues: Arc<QueueRegistry>,
    command_order: CommandOrderTable,
}

impl ModuleGraph {
    pub fn new(queues: Arc<QueueRegistry>) -> Self {
        Self {
            modules: BTreeMap::new(),
            queues,
            command_order: CommandOrderTable::new(),
        }
    }

    /// Add a module under its own alias
    ///
    /// # Errors
    /// [`CoordinatorError::DuplicateModule`] if the alias is taken.
    pub fn add_module(&mut self, module: Arc<dyn Module>) -> Result<(), CoordinatorError> {
        let name = module.name().to_string();
        if self.modules.contains_key(&name) {
            return Err(CoordinatorError::DuplicateModule { module: name });
        }
        self.modules.insert(name, module);
        Ok(())
    }

    /// Builder-style [`add_module`](Self::add_module)
    pub fn with_module(mut self, module: Arc<dyn Module>) -> Result<Self, CoordinatorError> {
        self.add_module(module)?;
        Ok(self)
    }

    pub fn set_command_order(&mut self, table: CommandOrderTable) {
        self.command_order = table;
    }

    pub fn with_command_order(mut self, table: CommandOrderTable) -> Self {
        self.command_order = table;
        self
    }

    pub fn module(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.modules.get(name)
    }

    /// Modules sorted by alias
    pub fn modules(&self) -> impl Iterator<Item = (&str, &Arc<dyn Module>)> {
        self.modules.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn queues(&self) -> &Arc<QueueRegistry> {
        &self.queues
    }

    pub fn command_order(&self) -> &CommandOrderTable {
        &self.command_order
    }

    /// Check every command-order alias against the module set
    ///
    /// # Errors
    /// [`CoordinatorError::UnknownModule`] or
    /// [`CoordinatorError::DuplicateOrderEntry`] for the first offending entry.
    pub fn validate(&self) -> Result<(), CoordinatorError> {
        for (command, order) in self.command_order.iter() {
            let mut seen = BTreeSet::new();
            for module in order {
                if !self.modules.contains_key(module) {
                    return Err(CoordinatorError::UnknownModule {
                        command: command.to_string(),
                        module: module.clone(),
                    });
                }
                if !seen.insert(module.as_str()) {
                    return Err(CoordinatorError::DuplicateOrderEntry {
                        command: command.to_string(),
                        module: module.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ModuleGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleGraph")
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .field("queues", &self.queues)
            .field("command_order", &self.command_order)
            .finish()
    }
}
