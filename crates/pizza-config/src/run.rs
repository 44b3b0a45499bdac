//! Resolved run configuration
//!
//! [`RunConfig`] is the flattened result of merging every configuration
//! source. Unlike the file-level structs every field has a concrete value.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How much the reporter prints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Suite counts, failures and the grand total
    #[default]
    Plain,
    /// Plain output plus one line per case
    Ci,
    /// Everything, including case durations, tags and criteria
    Doge,
}

impl Verbosity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Plain => "plain",
            Verbosity::Ci => "ci",
            Verbosity::Doge => "doge",
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verbosity {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "plain" => Ok(Verbosity::Plain),
            "ci" => Ok(Verbosity::Ci),
            "doge" => Ok(Verbosity::Doge),
            other => Err(ConfigError::InvalidValue {
                field: "verbose".to_string(),
                reason: format!("must be 'plain', 'ci', or 'doge', got '{}'", other),
            }),
        }
    }
}

/// Summary output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => f.write_str("text"),
            OutputFormat::Json => f.write_str("json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(ConfigError::InvalidValue {
                field: "format".to_string(),
                reason: format!("must be 'text' or 'json', got '{}'", other),
            }),
        }
    }
}

/// Fully resolved configuration for one engine run
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Case name patterns to run (empty = all). `*` is a wildcard.
    pub only: Vec<String>,
    /// Case name patterns to leave out
    pub skip: Vec<String>,
    /// Run only cases carrying at least one of these tags (empty = all)
    pub tags: Vec<String>,
    /// Suite name patterns to run (empty = all)
    pub suites: Vec<String>,
    pub verbosity: Verbosity,
    pub format: OutputFormat,
    /// Colored text output
    pub color: bool,
    /// Time each case with the timing collaborator
    pub timing: bool,
    /// Times `run_all` executes the selection, each into a fresh report
    pub repeat: u32,
    /// List the selected cases instead of running them
    pub dry_run: bool,
    /// Directory holding the pizza.toml that was applied, if any
    pub project_root: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            only: Vec::new(),
            skip: Vec::new(),
            tags: Vec::new(),
            suites: Vec::new(),
            verbosity: Verbosity::Plain,
            format: OutputFormat::Text,
            color: true,
            timing: true,
            repeat: 1,
            dry_run: false,
            project_root: None,
        }
    }
}

impl RunConfig {
    /// Whether any case or suite filter is active
    pub fn has_filters(&self) -> bool {
        !self.only.is_empty()
            || !self.skip.is_empty()
            || !self.tags.is_empty()
            || !self.suites.is_empty()
    }

    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }
}

/// Split a comma separated list, dropping empty entries
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
