//! Pizza Configuration System
//!
//! Provides run configuration for the pizza test engine:
//! - Project configuration (pizza.toml)
//! - Global user configuration (~/.pizza/config.toml)
//! - Environment overrides (PIZZA_*)
//! - The resolved [`RunConfig`] the engine consumes
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Global config (~/.pizza/config.toml)
//! 3. Project config (./pizza.toml, searched upwards)
//! 4. Environment variables (PIZZA_*)
//! 5. Command-line flags (applied by the engine)
//!
//! # Example
//!
//! ```no_run
//! use pizza_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("verbosity: {}", config.verbosity);
//! ```

pub mod global;
pub mod loader;
pub mod project;
pub mod run;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use global::GlobalConfig;
pub use loader::ConfigLoader;
pub use project::{ProjectConfig, ReportSection, RunSection};
pub use run::{OutputFormat, RunConfig, Verbosity};
