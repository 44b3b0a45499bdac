//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::GlobalConfig;
use crate::project::ProjectConfig;
use crate::run::{split_list, RunConfig};
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};

/// Name of the project configuration file
pub const PROJECT_CONFIG_FILE: &str = "pizza.toml";

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.pizza/config.toml) - lowest priority
/// 2. Project config (./pizza.toml) - overrides global
/// 3. Environment variables (PIZZA_*) - overrides project
/// 4. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use an explicit global config file instead of ~/.pizza/config.toml
    pub fn with_global_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find pizza.toml, then layers global
    /// config, project config and environment overrides.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<RunConfig> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;
        self.resolve(project_root, project_config)
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<RunConfig> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let project_root = config_path.parent().map(|p| p.to_path_buf());
        self.resolve(project_root, project_config)
    }

    fn resolve(
        &mut self,
        project_root: Option<PathBuf>,
        project_config: ProjectConfig,
    ) -> ConfigResult<RunConfig> {
        let mut config = RunConfig::default();

        // Global config is optional; a broken one should not block a run
        let global_config = self.load_global_config().unwrap_or_default();
        global_config.apply_to(&mut config);

        project_config.apply_to(&mut config);
        config.project_root = project_root;

        self.apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Find project configuration by walking up directory tree
    ///
    /// Returns (project_root, project_config); a missing file yields defaults.
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_CONFIG_FILE);

            if config_path.exists() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Load global configuration from ~/.pizza/config.toml
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => {
                let path = GlobalConfig::global_config_path()?;
                self.global_config_path = Some(path.clone());
                path
            }
        };

        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(&path)
    }

    /// Apply environment variable overrides
    ///
    /// Recognised: PIZZA_VERBOSE, PIZZA_FORMAT, PIZZA_NO_COLOR (or NO_COLOR),
    /// PIZZA_TIMING, PIZZA_ONLY, PIZZA_SKIP, PIZZA_TAG, PIZZA_SUITE,
    /// PIZZA_REPEAT, PIZZA_DRY_RUN.
    fn apply_env_overrides(&self, config: &mut RunConfig) -> ConfigResult<()> {
        if let Ok(verbose) = env::var("PIZZA_VERBOSE") {
            config.verbosity = verbose.parse()?;
        }

        if let Ok(format) = env::var("PIZZA_FORMAT") {
            config.format = format.parse()?;
        }

        if env::var("PIZZA_NO_COLOR").is_ok() || env::var("NO_COLOR").is_ok() {
            config.color = false;
        }

        if let Ok(timing) = env::var("PIZZA_TIMING") {
            config.timing = matches!(timing.to_lowercase().as_str(), "true" | "1" | "yes");
        }

        if let Ok(only) = env::var("PIZZA_ONLY") {
            config.only = split_list(&only);
        }
        if let Ok(skip) = env::var("PIZZA_SKIP") {
            config.skip = split_list(&skip);
        }
        if let Ok(tags) = env::var("PIZZA_TAG") {
            config.tags = split_list(&tags);
        }
        if let Ok(suites) = env::var("PIZZA_SUITE") {
            config.suites = split_list(&suites);
        }

        if let Ok(repeat) = env::var("PIZZA_REPEAT") {
            config.repeat = match repeat.trim().parse::<u32>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "PIZZA_REPEAT".to_string(),
                        reason: format!("must be a positive integer, got '{}'", repeat),
                    })
                }
            };
        }
        if let Ok(dry_run) = env::var("PIZZA_DRY_RUN") {
            config.dry_run = matches!(dry_run.to_lowercase().as_str(), "true" | "1" | "yes");
        }

        Ok(())
    }

    /// Get the global configuration directory (~/.pizza)
    pub fn global_config_dir() -> ConfigResult<PathBuf> {
        let path = GlobalConfig::global_config_path()?;
        Ok(path.parent().map(Path::to_path_buf).unwrap_or(path))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::Verbosity;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn create_config_file(dir: &Path, content: &str) -> PathBuf {
        let config_path = dir.join(PROJECT_CONFIG_FILE);
        fs::write(&config_path, content).unwrap();
        config_path
    }

    fn isolated_loader(dir: &Path) -> ConfigLoader {
        ConfigLoader::new().with_global_path(dir.join("no-global.toml"))
    }

    #[test]
    #[serial]
    fn test_load_project_config() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            r#"
[report]
verbose = "ci"
"#,
        );

        let mut loader = isolated_loader(temp_dir.path());
        let config = loader.load_from_directory(temp_dir.path()).unwrap();

        assert_eq!(config.verbosity, Verbosity::Ci);
        assert_eq!(config.project_root(), Some(temp_dir.path()));
    }

    #[test]
    #[serial]
    fn test_find_config_in_parent() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            r#"
[run]
only = ["parent*"]
"#,
        );

        let sub_dir = temp_dir.path().join("subdir");
        fs::create_dir(&sub_dir).unwrap();

        let mut loader = isolated_loader(temp_dir.path());
        let config = loader.load_from_directory(&sub_dir).unwrap();

        assert_eq!(config.only, vec!["parent*"]);
        assert_eq!(config.project_root(), Some(temp_dir.path()));
    }

    #[test]
    #[serial]
    fn test_env_override_verbose() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            r#"
[report]
verbose = "plain"
"#,
        );

        env::set_var("PIZZA_VERBOSE", "doge");

        let mut loader = isolated_loader(temp_dir.path());
        let config = loader.load_from_directory(temp_dir.path()).unwrap();

        assert_eq!(config.verbosity, Verbosity::Doge);

        env::remove_var("PIZZA_VERBOSE");
    }

    #[test]
    #[serial]
    fn test_env_override_invalid_value() {
        let temp_dir = TempDir::new().unwrap();
        env::set_var("PIZZA_FORMAT", "xml");

        let mut loader = isolated_loader(temp_dir.path());
        let result = loader.load_from_directory(temp_dir.path());

        env::remove_var("PIZZA_FORMAT");
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_env_repeat_and_dry_run() {
        let temp_dir = TempDir::new().unwrap();
        env::set_var("PIZZA_REPEAT", "4");
        env::set_var("PIZZA_DRY_RUN", "1");

        let mut loader = isolated_loader(temp_dir.path());
        let config = loader.load_from_directory(temp_dir.path());

        env::remove_var("PIZZA_REPEAT");
        env::remove_var("PIZZA_DRY_RUN");
        let config = config.unwrap();
        assert_eq!(config.repeat, 4);
        assert!(config.dry_run);
    }

    #[test]
    #[serial]
    fn test_env_zero_repeat_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        env::set_var("PIZZA_REPEAT", "0");

        let mut loader = isolated_loader(temp_dir.path());
        let result = loader.load_from_directory(temp_dir.path());

        env::remove_var("PIZZA_REPEAT");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    #[serial]
    fn test_load_from_specific_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config_file(
            temp_dir.path(),
            r#"
[run]
tags = ["fast"]
"#,
        );

        let mut loader = isolated_loader(temp_dir.path());
        let config = loader.load_from_file(&config_path).unwrap();

        assert_eq!(config.tags, vec!["fast"]);
    }
}
