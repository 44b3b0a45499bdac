//! Command-line run arguments
//!
//! Flags override whatever the configuration files and `PIZZA_*`
//! environment variables resolved to.

use crate::error::EngineResult;
use clap::Parser;
use pizza_config::{ConfigLoader, OutputFormat, RunConfig, Verbosity};
use std::env;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default, PartialEq)]
#[command(name = "pizza")]
#[command(about = "Run registered test suites")]
pub struct RunArgs {
    /// Run only cases whose name matches (comma separated, `*` wildcard)
    #[arg(long, value_delimiter = ',', value_name = "NAMES")]
    pub only: Vec<String>,

    /// Leave out cases whose name matches
    #[arg(long, value_delimiter = ',', value_name = "NAMES")]
    pub skip: Vec<String>,

    /// Run only cases carrying one of these tags
    #[arg(long = "tag", value_delimiter = ',', value_name = "TAGS")]
    pub tags: Vec<String>,

    /// Run only cases below suites whose name matches
    #[arg(long = "suite", value_delimiter = ',', value_name = "NAMES")]
    pub suites: Vec<String>,

    /// Summary detail: plain, ci or doge
    #[arg(long, value_name = "LEVEL")]
    pub verbose: Option<Verbosity>,

    /// Summary format: text or json
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Do not time cases
    #[arg(long)]
    pub no_timing: bool,

    /// Run the selection this many times, each into a fresh report
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub repeat: Option<u32>,

    /// List the selected cases without running any hook or body
    #[arg(long, visible_alias = "list")]
    pub dry_run: bool,

    /// Project config file (defaults to the nearest pizza.toml)
    #[arg(long, env = "PIZZA_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl RunArgs {
    /// Load file and environment configuration, then apply the flags
    pub fn resolve(&self) -> EngineResult<RunConfig> {
        let mut loader = ConfigLoader::new();
        let mut config = match &self.config {
            Some(path) => loader.load_from_file(path)?,
            None => loader.load_from_directory(&env::current_dir()?)?,
        };
        self.apply(&mut config);
        Ok(config)
    }

    /// Overlay the flags that were given onto `config`
    pub fn apply(&self, config: &mut RunConfig) {
        if !self.only.is_empty() {
            config.only = self.only.clone();
        }
        if !self.skip.is_empty() {
            config.skip = self.skip.clone();
        }
        if !self.tags.is_empty() {
            config.tags = self.tags.clone();
        }
        if !self.suites.is_empty() {
            config.suites = self.suites.clone();
        }
        if let Some(verbose) = self.verbose {
            config.verbosity = verbose;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if self.no_color {
            config.color = false;
        }
        if self.no_timing {
            config.timing = false;
        }
        if let Some(repeat) = self.repeat {
            config.repeat = repeat;
        }
        if self.dry_run {
            config.dry_run = true;
        }
    }
}
