//! Tool configuration: category labels, level labels and file conventions.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid barfiber pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Settings shared by every tool. Every field has a default, so a config
/// file only needs the keys it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// ECC heights accepted as category labels, in output order.
    pub categories: Vec<u32>,

    /// Ground-motion intensity labels. The i-th `B` column of a results
    /// file carries the i-th label.
    pub levels: Vec<String>,

    /// File names picked up by the barfiber tabulator.
    pub barfiber_pattern: String,

    /// Multiplier applied to each max |strain|.
    pub strain_scale: f64,

    /// Text written in place of a missing or invalid value.
    pub error_token: String,
}

fn default_categories() -> Vec<u32> {
    (1..=7).map(|i| i * 100).collect()
}

fn default_levels() -> Vec<String> {
    (1..=17).map(|i| format!("{:.1}g", f64::from(i) / 10.0)).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            levels: default_levels(),
            barfiber_pattern: r"^S2_B.*_IDA_8\.5MPa_barfiber.*\.out$".to_string(),
            strain_scale: 1000.0,
            error_token: "error".to_string(),
        }
    }
}

impl Config {
    /// Load from a JSON file; absent keys keep their defaults.
    pub fn from_json(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.barfiber_regex()?;
        Ok(config)
    }

    pub fn barfiber_regex(&self) -> Result<regex::Regex, ConfigError> {
        Ok(regex::Regex::new(&self.barfiber_pattern)?)
    }
}
