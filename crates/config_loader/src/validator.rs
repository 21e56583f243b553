//! Graph blueprint validation
//!
//! Rules:
//! - queue names unique, module names unique
//! - queue capacity > 0
//! - module plugin name not empty
//! - every command-order alias names a declared module
//! - no alias listed twice for the same command

use std::collections::HashSet;

use contracts::{ContractError, GraphBlueprint};

/// Validate a blueprint
///
/// Returns the first error encountered.
pub fn validate(blueprint: &GraphBlueprint) -> Result<(), ContractError> {
    validate_queues(blueprint)?;
    validate_modules(blueprint)?;
    validate_command_order(blueprint)?;
    Ok(())
}

fn validate_queues(blueprint: &GraphBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for queue in &blueprint.queues {
        if !seen.insert(&queue.name) {
            return Err(ContractError::config_validation(
                format!("queues[name={}]", queue.name),
                "duplicate queue name",
            ));
        }
        if queue.capacity == 0 {
            return Err(ContractError::config_validation(
                format!("queues[{}].capacity", queue.name),
                "capacity must be > 0",
            ));
        }
    }
    Ok(())
}

fn validate_modules(blueprint: &GraphBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for module in &blueprint.modules {
        if !seen.insert(&module.name) {
            return Err(ContractError::config_validation(
                format!("modules[name={}]", module.name),
                "duplicate module name",
            ));
        }
        if module.plugin.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("modules[{}].plugin", module.name),
                "plugin must not be empty",
            ));
        }
    }
    Ok(())
}

fn validate_command_order(blueprint: &GraphBlueprint) -> Result<(), ContractError> {
    let declared: HashSet<&str> = blueprint.modules.iter().map(|m| m.name.as_str()).collect();

    for (command, order) in blueprint.command_order.iter() {
        let mut seen = HashSet::new();
        for alias in order {
            if !declared.contains(alias.as_str()) {
                return Err(ContractError::config_validation(
                    format!("command_order.{command}"),
                    format!("module '{alias}' is not declared"),
                ));
            }
            if !seen.insert(alias.as_str()) {
                return Err(ContractError::config_validation(
                    format!("command_order.{command}"),
                    format!("module '{alias}' is listed more than once"),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{CommandOrderTable, ModuleConfig, ModuleSpec, QueueSpec, QueueValueType};

    fn blueprint() -> GraphBlueprint {
        GraphBlueprint {
            queues: vec![QueueSpec {
                name: "q".into(),
                value_type: QueueValueType::Int,
                capacity: 4,
            }],
            modules: vec![
                ModuleSpec {
                    name: "a".into(),
                    plugin: "DebugLogging".into(),
                    config: ModuleConfig::empty(),
                },
                ModuleSpec {
                    name: "b".into(),
                    plugin: "DebugLogging".into(),
                    config: ModuleConfig::empty(),
                },
            ],
            command_order: CommandOrderTable::new().with("start", ["a", "b"]),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_blueprint() {
        assert!(validate(&blueprint()).is_ok());
    }

    #[test]
    fn test_duplicate_queue_name() {
        let mut bp = blueprint();
        bp.queues.push(bp.queues[0].clone());
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("duplicate queue name"));
    }

    #[test]
    fn test_zero_capacity() {
        let mut bp = blueprint();
        bp.queues[0].capacity = 0;
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("queues[q].capacity"));
    }

    #[test]
    fn test_duplicate_module_name() {
        let mut bp = blueprint();
        bp.modules[1].name = "a".into();
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("duplicate module name"));
    }

    #[test]
    fn test_empty_plugin() {
        let mut bp = blueprint();
        bp.modules[0].plugin = " ".into();
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn test_order_references_undeclared_module() {
        let mut bp = blueprint();
        bp.command_order.insert("stop", ["ghost"]);
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("command_order.stop"));
        assert!(err.to_string().contains("'ghost' is not declared"));
    }

    #[test]
    fn test_order_lists_module_twice() {
        let mut bp = blueprint();
        bp.command_order.insert("configure", ["a", "a"]);
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }
}
