//! ModuleConfig - opaque per-module configuration
//!
//! The framework passes this document through untouched. Each module
//! converts the keys it recognises into typed fields inside its own
//! `configure` handler.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ConfigError;

/// Hierarchical key/value document handed to a module at construction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleConfig(Value);

impl ModuleConfig {
    /// Wrap an existing JSON value
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Empty object
    pub fn empty() -> Self {
        Self(Value::Object(Map::new()))
    }

    /// Raw document
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// True if the key is present (and not null)
    pub fn contains(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(|v| !v.is_null())
    }

    /// Typed value of a required key
    ///
    /// # Errors
    /// `MissingKey` if absent, `InvalidValue` if it does not deserialize as `T`.
    pub fn require<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Err(ConfigError::missing_key(key)),
            Some(v) => serde_json::from_value(v.clone())
                .map_err(|e| ConfigError::invalid_value(key, e.to_string())),
        }
    }

    /// Typed value of an optional key
    ///
    /// # Errors
    /// `InvalidValue` if present but not deserializable as `T`.
    pub fn optional<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => serde_json::from_value(v.clone())
                .map(Some)
                .map_err(|e| ConfigError::invalid_value(key, e.to_string())),
        }
    }

    /// Typed value of an optional key, or `default` when absent
    pub fn value_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        Ok(self.optional(key)?.unwrap_or(default))
    }
}

impl From<Value> for ModuleConfig {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
