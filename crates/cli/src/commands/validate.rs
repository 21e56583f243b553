//! `validate` command implementation.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use contracts::{Command, GraphBlueprint};
use modules::ModuleRegistry;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::app::build_graph;
use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    graph_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<GraphSummary>,
}

#[derive(Serialize)]
struct GraphSummary {
    version: String,
    queue_count: usize,
    module_count: usize,
    ordered_commands: Vec<String>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(graph = %args.graph.display(), "Validating graph");

    let result = validate_graph(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Graph validation failed")
    }
}

fn validate_graph(args: &ValidateArgs) -> ValidationResult {
    let graph_path = args.graph.display().to_string();
    let invalid = |error: String| ValidationResult {
        valid: false,
        graph_path: graph_path.clone(),
        error: Some(error),
        warnings: Vec::new(),
        summary: None,
    };

    if !args.graph.exists() {
        return invalid(format!("File not found: {}", args.graph.display()));
    }

    let blueprint = match config_loader::ConfigLoader::load_from_path(&args.graph) {
        Ok(blueprint) => blueprint,
        Err(e) => return invalid(e.to_string()),
    };

    // Constructing the graph resolves plugin names without configuring anything
    if let Err(e) = build_graph(&blueprint, &ModuleRegistry::with_builtins()) {
        return invalid(e.to_string());
    }

    ValidationResult {
        valid: true,
        graph_path: graph_path.clone(),
        error: None,
        warnings: collect_warnings(&blueprint),
        summary: Some(GraphSummary {
            version: format!("{:?}", blueprint.version),
            queue_count: blueprint.queues.len(),
            module_count: blueprint.modules.len(),
            ordered_commands: blueprint
                .command_order
                .iter()
                .map(|(command, _)| command.to_string())
                .collect(),
        }),
    }
}

/// Non-fatal issues
fn collect_warnings(blueprint: &GraphBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.modules.is_empty() {
        warnings.push("No modules declared - commands will have no effect".to_string());
    }

    for (command, _) in blueprint.command_order.iter() {
        if Command::parse(command).is_err() {
            warnings.push(format!(
                "command_order.{command} is not a standard command; modules will reject it"
            ));
        }
    }

    let mut referenced = BTreeSet::new();
    for module in &blueprint.modules {
        collect_strings(module.config.as_value(), &mut referenced);
    }
    for queue in &blueprint.queues {
        if !referenced.contains(queue.name.as_str()) {
            warnings.push(format!(
                "Queue '{}' is not referenced by any module configuration",
                queue.name
            ));
        }
    }

    warnings
}

fn collect_strings<'a>(value: &'a Value, out: &mut BTreeSet<&'a str>) {
    match value {
        Value::String(s) => {
            out.insert(s.as_str());
        }
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Graph is valid: {}", result.graph_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Queues: {}", summary.queue_count);
            println!("  Modules: {}", summary.module_count);
            if !summary.ordered_commands.is_empty() {
                println!("  Ordered commands: {}", summary.ordered_commands.join(", "));
            }
        }

        if !result.warnings.is_empty() {
            println!("\n⚠ Warnings:");
            for warning in &result.warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Graph is invalid: {}", result.graph_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
