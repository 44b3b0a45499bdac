//! Engine error types

use pizza_config::ConfigError;
use thiserror::Error;

/// Errors surfaced by engine registration, execution and lifecycle calls.
///
/// Case-level failures never appear here: they are captured as case
/// statuses in the run report.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("a {kind} named '{name}' is already registered in {scope}")]
    DuplicateName {
        kind: &'static str,
        name: String,
        scope: String,
    },

    #[error("{kind} names cannot be empty")]
    EmptyName { kind: &'static str },

    #[error("suite handle {0} is not owned by this engine")]
    UnknownSuite(String),

    #[error("handle {0} is no longer valid")]
    InvalidHandle(String),

    #[error("cannot {action}: the suite tree is immutable once a run has started")]
    Immutable { action: &'static str },

    #[error("no run has completed yet")]
    NotRun,

    #[error("the engine has already ended")]
    Ended,

    #[error("invalid name pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("failed to render report: {0}")]
    Render(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Args(#[from] clap::Error),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
