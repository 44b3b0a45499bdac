//! Project Configuration (pizza.toml)
//!
//! Handles project-level configuration stored in `pizza.toml` next to the
//! test harness.

use crate::run::{OutputFormat, RunConfig, Verbosity};
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Project configuration from pizza.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Case selection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<RunSection>,

    /// Summary output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportSection>,
}

/// `[run]` section: which cases take part in a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    /// Case name patterns to run
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub only: Vec<String>,

    /// Case name patterns to leave out
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skip: Vec<String>,

    /// Tags a case must carry (any of)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Suite name patterns to run
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suites: Vec<String>,

    /// Number of back-to-back runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat: Option<u32>,

    /// List selected cases without running them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
}

/// `[report]` section: how the summary looks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ReportSection {
    /// Verbosity level ("plain", "ci", "doge")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<Verbosity>,

    /// Output format ("text", "json")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,

    /// Colored output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,

    /// Record per-case durations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<bool>,
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(run) = &self.run {
            validate_patterns("run.only", &run.only)?;
            validate_patterns("run.skip", &run.skip)?;
            validate_patterns("run.tags", &run.tags)?;
            validate_patterns("run.suites", &run.suites)?;
            if run.repeat == Some(0) {
                return Err(ConfigError::InvalidValue {
                    field: "run.repeat".to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Merge another project config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &ProjectConfig) {
        if other.run.is_some() {
            self.run = other.run.clone();
        }
        if let Some(report) = &other.report {
            let base = self.report.get_or_insert_with(Default::default);
            base.merge(report);
        }
    }

    /// Write the settings of this file onto a resolved configuration
    pub fn apply_to(&self, config: &mut RunConfig) {
        if let Some(run) = &self.run {
            config.only = run.only.clone();
            config.skip = run.skip.clone();
            config.tags = run.tags.clone();
            config.suites = run.suites.clone();
            if let Some(repeat) = run.repeat {
                config.repeat = repeat;
            }
            if let Some(dry_run) = run.dry_run {
                config.dry_run = dry_run;
            }
        }
        if let Some(report) = &self.report {
            report.apply_to(config);
        }
    }
}

impl ReportSection {
    /// Overlay the set fields of `other`
    pub fn merge(&mut self, other: &ReportSection) {
        if other.verbose.is_some() {
            self.verbose = other.verbose;
        }
        if other.format.is_some() {
            self.format = other.format;
        }
        if other.color.is_some() {
            self.color = other.color;
        }
        if other.timing.is_some() {
            self.timing = other.timing;
        }
    }

    pub fn apply_to(&self, config: &mut RunConfig) {
        if let Some(verbose) = self.verbose {
            config.verbosity = verbose;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(color) = self.color {
            config.color = color;
        }
        if let Some(timing) = self.timing {
            config.timing = timing;
        }
    }
}

/// Reject blank entries in a pattern list
fn validate_patterns(field: &str, patterns: &[String]) -> ConfigResult<()> {
    if let Some(pos) = patterns.iter().position(|p| p.trim().is_empty()) {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("entry {} is empty", pos),
        });
    }
    Ok(())
}
