//! Global Configuration (~/.pizza/config.toml)
//!
//! Handles user-level defaults stored in `~/.pizza/config.toml`. Only
//! presentation settings live here; case selection is per project.

use crate::project::ReportSection;
use crate::run::RunConfig;
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.pizza/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Default report settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportSection>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })
    }

    /// Get the global config file path (~/.pizza/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".pizza").join("config.toml"))
    }

    pub fn apply_to(&self, config: &mut RunConfig) {
        if let Some(report) = &self.report {
            report.apply_to(config);
        }
    }
}
