//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::GraphBlueprint;
use modules::ModuleRegistry;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Graph info for JSON output
#[derive(Serialize)]
struct GraphInfo {
    version: String,
    queues: Vec<QueueInfo>,
    modules: Vec<ModuleInfo>,
    command_order: Vec<OrderInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    plugins: Vec<String>,
}

#[derive(Serialize)]
struct QueueInfo {
    name: String,
    value_type: String,
    capacity: usize,
}

#[derive(Serialize)]
struct ModuleInfo {
    name: String,
    plugin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<Value>,
}

#[derive(Serialize)]
struct OrderInfo {
    command: String,
    modules: Vec<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(graph = %args.graph.display(), "Loading graph info");

    if !args.graph.exists() {
        return Err(CliError::graph_not_found(args.graph.display().to_string()).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.graph)
        .with_context(|| format!("Failed to load graph from {}", args.graph.display()))?;

    let info = build_graph_info(&blueprint, args);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize graph info")?;
        println!("{}", json);
    } else {
        print_graph_info(&info);
    }

    Ok(())
}

fn build_graph_info(blueprint: &GraphBlueprint, args: &InfoArgs) -> GraphInfo {
    let queues = blueprint
        .queues
        .iter()
        .map(|q| QueueInfo {
            name: q.name.clone(),
            value_type: q.value_type.to_string(),
            capacity: q.capacity,
        })
        .collect();

    let modules = blueprint
        .modules
        .iter()
        .map(|m| ModuleInfo {
            name: m.name.clone(),
            plugin: m.plugin.clone(),
            config: args.config.then(|| m.config.as_value().clone()),
        })
        .collect();

    let command_order = blueprint
        .command_order
        .iter()
        .map(|(command, modules)| OrderInfo {
            command: command.to_string(),
            modules: modules.to_vec(),
        })
        .collect();

    let plugins = if args.plugins {
        ModuleRegistry::with_builtins()
            .plugin_names()
            .map(str::to_string)
            .collect()
    } else {
        Vec::new()
    };

    GraphInfo {
        version: format!("{:?}", blueprint.version),
        queues,
        modules,
        command_order,
        plugins,
    }
}

fn branch(i: usize, len: usize) -> &'static str {
    if i + 1 == len {
        "└─"
    } else {
        "├─"
    }
}

fn print_graph_info(info: &GraphInfo) {
    println!("=== DAQ Graph ({}) ===\n", info.version);

    println!("Queues ({})", info.queues.len());
    for (i, q) in info.queues.iter().enumerate() {
        println!(
            "   {} {} ({}, capacity {})",
            branch(i, info.queues.len()),
            q.name,
            q.value_type,
            q.capacity
        );
    }

    println!("\nModules ({})", info.modules.len());
    for (i, m) in info.modules.iter().enumerate() {
        println!("   {} {} [{}]", branch(i, info.modules.len()), m.name, m.plugin);
        if let Some(ref config) = m.config {
            let indent = if i + 1 == info.modules.len() { "   " } else { "│  " };
            println!("   {}    config: {}", indent, config);
        }
    }

    println!("\nCommand order");
    if info.command_order.is_empty() {
        println!("   └─ (none, every command reaches all modules concurrently)");
    }
    for (i, order) in info.command_order.iter().enumerate() {
        println!(
            "   {} {}: {}, then the rest",
            branch(i, info.command_order.len()),
            order.command,
            order.modules.join(" -> ")
        );
    }

    if !info.plugins.is_empty() {
        println!("\nAvailable plugins");
        for (i, plugin) in info.plugins.iter().enumerate() {
            println!("   {} {}", branch(i, info.plugins.len()), plugin);
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader};
    use std::path::PathBuf;

    #[test]
    fn test_info_includes_config_and_plugins_on_request() {
        let blueprint = ConfigLoader::load_from_str(
            r#"
[[queues]]
name = "q"
value_type = "int"
capacity = 3

[[modules]]
name = "fan"
plugin = "FanOutInt"
[modules.config]
input = "q"
outputs = ["q"]

[command_order]
stop = ["fan"]
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let args = InfoArgs {
            graph: PathBuf::from("unused.toml"),
            json: true,
            config: true,
            plugins: true,
        };
        let info = build_graph_info(&blueprint, &args);

        assert_eq!(info.queues[0].value_type, "int");
        assert_eq!(info.modules[0].config.as_ref().unwrap()["input"], "q");
        assert_eq!(info.command_order[0].command, "stop");
        assert!(info.plugins.contains(&"FanOutInt".to_string()));

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["queues"][0]["capacity"], 3);
    }

    #[test]
    fn test_info_omits_optional_sections() {
        let blueprint = GraphBlueprint::default();
        let args = InfoArgs {
            graph: PathBuf::from("unused.toml"),
            json: true,
            config: false,
            plugins: false,
        };
        let json = serde_json::to_value(build_graph_info(&blueprint, &args)).unwrap();
        assert!(json.get("plugins").is_none());
    }
}
