//! # Config Loader
//!
//! Loads a module graph description.
//!
//! Responsibilities:
//! - Parse TOML/JSON graph files
//! - Validate queue, module and command-order declarations
//! - Produce a `GraphBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("graph.toml")).unwrap();
//! println!("modules: {}", blueprint.modules.len());
//! ```

mod parser;
mod validator;

pub use contracts::GraphBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Graph file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a graph from a file path
    ///
    /// Format is detected from the extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<GraphBlueprint, ContractError> {
        let format = Self::detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load a graph from a string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<GraphBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Check an already-built blueprint
    pub fn validate(blueprint: &GraphBlueprint) -> Result<(), ContractError> {
        validator::validate(blueprint)
    }

    pub fn to_toml(blueprint: &GraphBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    pub fn to_json(blueprint: &GraphBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }

    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const GRAPH_TOML: &str = r#"
[[queues]]
name = "producer_out"
value_type = "int_vector"
capacity = 4

[[queues]]
name = "c1_in"
value_type = "int_vector"

[[modules]]
name = "producer"
plugin = "FakeDataProducer"
[modules.config]
output = "producer_out"
nIntsPerVector = 5

[[modules]]
name = "fanout"
plugin = "FanOutIntVector"
[modules.config]
input = "producer_out"
outputs = ["c1_in"]
fanout_mode = "Broadcast"

[command_order]
start = ["fanout", "producer"]
stop = ["producer", "fanout"]
"#;

    #[test]
    fn test_load_from_path_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(GRAPH_TOML.as_bytes()).unwrap();

        let bp = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(bp.queues.len(), 2);
        assert_eq!(bp.modules[1].name, "fanout");
        assert_eq!(bp.command_order.modules_for("stop"), ["producer", "fanout"]);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::load_from_path(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ContractError::Io(_)));
    }

    #[test]
    fn test_round_trip_toml_and_json() {
        let bp = ConfigLoader::load_from_str(GRAPH_TOML, ConfigFormat::Toml).unwrap();

        let toml = ConfigLoader::to_toml(&bp).unwrap();
        let from_toml = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        assert_eq!(from_toml.modules[0].config, bp.modules[0].config);

        let json = ConfigLoader::to_json(&bp).unwrap();
        let from_json = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(from_json.command_order, bp.command_order);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[[modules]]
name = "a"
plugin = "DebugLogging"

[command_order]
start = ["a", "b"]
"#;
        let err = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap_err();
        assert!(err.to_string().contains("'b' is not declared"));
    }
}
