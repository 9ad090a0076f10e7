use serde::Deserialize;

use crate::error::{Error, Result};

/// Serializer settings. Every field has a default, so an empty TOML
/// document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerializerConfig {
    /// Deepest nesting of arrays, maps and records accepted before the
    /// input is rejected. Guards the stack against pathological inputs.
    pub max_depth: usize,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}

impl SerializerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::invalid(format!("{path}: {e}")))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| Error::invalid(e.to_string()))?;
        if config.max_depth == 0 {
            return Err(Error::invalid("max_depth must be at least 1"));
        }
        Ok(config)
    }
}
