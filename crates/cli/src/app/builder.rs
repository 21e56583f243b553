//! Graph builder - turns a `GraphBlueprint` into a `ModuleGraph`.

use std::sync::Arc;

use contracts::{GraphBlueprint, QueueSpec, QueueValueType};
use coordinator::ModuleGraph;
use modules::{ModuleInit, ModuleRegistry};
use queues::{QueueError, QueueRegistry};
use tracing::{debug, info};

use crate::error::{CliError, Result};

/// Create every queue, instantiate every module and attach the command order
///
/// Modules are constructed but not configured.
pub fn build_graph(blueprint: &GraphBlueprint, registry: &ModuleRegistry) -> Result<ModuleGraph> {
    let mut queues = QueueRegistry::new();
    for spec in &blueprint.queues {
        create_queue(&mut queues, spec).map_err(|source| CliError::QueueCreation {
            name: spec.name.clone(),
            source,
        })?;
    }
    let queues = Arc::new(queues);

    let mut graph = ModuleGraph::new(Arc::clone(&queues));
    for spec in &blueprint.modules {
        let init = ModuleInit::new(&spec.name, spec.config.clone(), Arc::clone(&queues));
        let module = registry
            .create(&spec.plugin, init)
            .map_err(|source| CliError::ModuleCreation {
                name: spec.name.clone(),
                source,
            })?;
        debug!(module = %spec.name, plugin = %spec.plugin, "module created");
        graph.add_module(module)?;
    }

    let graph = graph.with_command_order(blueprint.command_order.clone());
    graph.validate()?;

    info!(
        queues = queues.len(),
        modules = graph.len(),
        "module graph built"
    );
    Ok(graph)
}

fn create_queue(queues: &mut QueueRegistry, spec: &QueueSpec) -> std::result::Result<(), QueueError> {
    match spec.value_type {
        QueueValueType::Int => queues.create::<i64>(&spec.name, spec.capacity).map(drop),
        QueueValueType::IntVector => queues
            .create::<Vec<i64>>(&spec.name, spec.capacity)
            .map(drop),
        QueueValueType::Text => queues.create::<String>(&spec.name, spec.capacity).map(drop),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader};

    const GRAPH: &str = r#"
[[queues]]
name = "numbers"
value_type = "int"
capacity = 4

[[queues]]
name = "words"
value_type = "text"

[[modules]]
name = "log"
plugin = "DebugLogging"

[[modules]]
name = "fanout"
plugin = "FanOutInt"
[modules.config]
input = "numbers"
outputs = ["numbers"]

[command_order]
start = ["log"]
"#;

    #[test]
    fn test_builds_queues_and_modules() {
        let blueprint = ConfigLoader::load_from_str(GRAPH, ConfigFormat::Toml).unwrap();
        let graph = build_graph(&blueprint, &ModuleRegistry::with_builtins()).unwrap();

        assert_eq!(graph.module_names().collect::<Vec<_>>(), vec!["fanout", "log"]);
        assert!(graph.queues().get::<i64>("numbers").is_ok());
        assert!(graph.queues().get::<String>("words").is_ok());
        assert_eq!(graph.command_order().modules_for("start"), ["log"]);
    }

    #[test]
    fn test_unknown_plugin_is_reported_with_module_name() {
        let mut blueprint = ConfigLoader::load_from_str(GRAPH, ConfigFormat::Toml).unwrap();
        blueprint.modules[0].plugin = "Missing".into();

        let err = build_graph(&blueprint, &ModuleRegistry::with_builtins()).unwrap_err();
        assert!(matches!(err, CliError::ModuleCreation { ref name, .. } if name == "log"));
    }
}
