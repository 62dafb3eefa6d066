//! Route table files.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sentier_router::RouteDefinition;
use thiserror::Error;

/// Errors loading a route table.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("unsupported route table format: {0} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(String),
}

/// A route table as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteTableConfig {
    /// Stamped on the router built from this table.
    #[serde(default = "default_version")]
    pub version: i32,

    #[serde(default)]
    pub routes: Vec<RouteDefinition>,
}

fn default_version() -> i32 {
    1
}

/// Route table file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Yaml,
    Json,
}

impl TableFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl RouteTableConfig {
    /// Load a route table from a YAML or JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = TableFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::parse(&content, format, path)
    }

    /// Parse route table content. `path` is only used in error messages.
    pub fn parse(content: &str, format: TableFormat, path: &Path) -> Result<Self, ConfigError> {
        let parsed = match format {
            TableFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            TableFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| ConfigError::Parse {
            path: path.display().to_string(),
            message,
        })
    }
}
