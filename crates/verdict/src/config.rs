//! Report and run configuration loaded from TOML.
//!
//! ```toml
//! format = "json"
//! colors = false
//! name_width = 40
//! stop_on_failure = false
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::report::OutputFormat;

/// Error returned when a configuration file cannot be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML or has unknown fields.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A specialized [`Result`] type for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Settings shared by the reporter and the top-level suite.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Output format of the report stream.
    pub format: OutputFormat,
    /// Whether terminal output is colored.
    pub colors: bool,
    /// Zero-padded width of the countdown index.
    pub index_width: usize,
    /// Width case names are padded to.
    pub name_width: usize,
    /// Stop-on-failure flag of the top-level suite.
    pub stop_on_failure: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Human,
            colors: true,
            index_width: 4,
            name_width: 30,
            stop_on_failure: true,
        }
    }
}

impl ReportConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
