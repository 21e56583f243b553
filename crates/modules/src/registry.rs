//! Module registry - plugin name -> factory
//!
//! Replaces dynamic plugin loading: every implementation is linked in and
//! registered under a name at startup. The graph builder looks plugins up
//! by the name given in the blueprint.

use std::collections::BTreeMap;
use std::sync::Arc;

use contracts::{Module, ModuleConfig};
use queues::QueueRegistry;
use tracing::debug;

use crate::consumer::FakeDataConsumer;
use crate::debug_logging::DebugLoggingModule;
use crate::error::RegistryError;
use crate::fanout::{FanOutModule, FanOutValue};
use crate::producer::FakeDataProducer;

/// Everything a module needs at construction
#[derive(Debug, Clone)]
pub struct ModuleInit {
    /// Instance alias
    pub name: String,
    /// Opaque configuration, parsed by the module at `configure`
    pub config: ModuleConfig,
    /// Shared queues, resolved by alias at `configure`
    pub queues: Arc<QueueRegistry>,
}

impl ModuleInit {
    pub fn new(name: impl Into<String>, config: ModuleConfig, queues: Arc<QueueRegistry>) -> Self {
        Self {
            name: name.into(),
            config,
            queues,
        }
    }
}

/// Constructor for one module implementation
pub type ModuleFactory = Arc<dyn Fn(ModuleInit) -> Arc<dyn Module> + Send + Sync>;

/// Plugin name -> factory map
#[derive(Default, Clone)]
pub struct ModuleRegistry {
    factories: BTreeMap<String, ModuleFactory>,
}

impl ModuleRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every module shipped with this crate
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let builtins: [(&str, fn(ModuleInit) -> Arc<dyn Module>); 6] = [
            ("FanOutInt", fan_out::<i64>),
            ("FanOutIntVector", fan_out::<Vec<i64>>),
            ("FanOutText", fan_out::<String>),
            ("FakeDataProducer", fake_data_producer),
            ("FakeDataConsumer", fake_data_consumer),
            ("DebugLogging", debug_logging),
        ];
        for (plugin, factory) in builtins {
            registry
                .factories
                .insert(plugin.to_string(), Arc::new(factory));
        }
        registry
    }

    /// Register a factory under `plugin`
    ///
    /// # Errors
    /// [`RegistryError::DuplicatePlugin`] if the name is taken.
    pub fn register<F>(&mut self, plugin: impl Into<String>, factory: F) -> Result<(), RegistryError>
    where
        F: Fn(ModuleInit) -> Arc<dyn Module> + Send + Sync + 'static,
    {
        let plugin = plugin.into();
        if self.factories.contains_key(&plugin) {
            return Err(RegistryError::DuplicatePlugin { plugin });
        }
        self.factories.insert(plugin, Arc::new(factory));
        Ok(())
    }

    /// Instantiate a module
    ///
    /// # Errors
    /// [`RegistryError::UnknownPlugin`] if nothing is registered as `plugin`.
    pub fn create(&self, plugin: &str, init: ModuleInit) -> Result<Arc<dyn Module>, RegistryError> {
        let factory = self
            .factories
            .get(plugin)
            .ok_or_else(|| RegistryError::UnknownPlugin {
                plugin: plugin.to_string(),
            })?;
        debug!(plugin = %plugin, module = %init.name, "creating module");
        Ok(factory(init))
    }

    pub fn contains(&self, plugin: &str) -> bool {
        self.factories.contains_key(plugin)
    }

    /// Registered plugin names, sorted
    pub fn plugin_names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

fn fan_out<T: FanOutValue>(init: ModuleInit) -> Arc<dyn Module> {
    Arc::new(FanOutModule::<T>::new(init))
}

fn fake_data_producer(init: ModuleInit) -> Arc<dyn Module> {
    Arc::new(FakeDataProducer::new(init))
}

fn fake_data_consumer(init: ModuleInit) -> Arc<dyn Module> {
    Arc::new(FakeDataConsumer::new(init))
}

fn debug_logging(init: ModuleInit) -> Arc<dyn Module> {
    Arc::new(DebugLoggingModule::new(init))
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("plugins", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SUCCESS;

    fn init(name: &str) -> ModuleInit {
        ModuleInit::new(name, ModuleConfig::empty(), Arc::new(QueueRegistry::new()))
    }

    #[test]
    fn test_builtins_are_registered() {
        let registry = ModuleRegistry::with_builtins();
        let names: Vec<_> = registry.plugin_names().collect();
        assert_eq!(
            names,
            vec![
                "DebugLogging",
                "FakeDataConsumer",
                "FakeDataProducer",
                "FanOutInt",
                "FanOutIntVector",
                "FanOutText",
            ]
        );
    }

    #[test]
    fn test_create_builds_named_instance() {
        let registry = ModuleRegistry::with_builtins();
        let module = registry.create("DebugLogging", init("logger")).unwrap();

        assert_eq!(module.name(), "logger");
        assert_eq!(module.execute_command("start", &[]).unwrap(), SUCCESS);
    }

    #[test]
    fn test_unknown_and_duplicate_plugins() {
        let mut registry = ModuleRegistry::with_builtins();

        assert_eq!(
            registry.create("Nope", init("x")).err(),
            Some(RegistryError::UnknownPlugin {
                plugin: "Nope".into()
            })
        );
        let err = registry
            .register("DebugLogging", |init: ModuleInit| -> Arc<dyn Module> {
                Arc::new(DebugLoggingModule::new(init))
            })
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicatePlugin { .. }));
    }
}
