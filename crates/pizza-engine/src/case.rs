//! Test cases and their outcomes
//!
//! A case is a named closure returning [`CaseResult`]. The engine tells the
//! two failure shapes apart:
//!
//! - `Err(CaseError::Assertion(..))` means the case's own checks did not
//!   hold and the case is recorded as `Failed`;
//! - `Err(CaseError::Fault(..))`, or a panic escaping the body, means the
//!   case could not complete and it is recorded as `Errored`;
//! - `Err(CaseError::Skipped(..))` means the case chose not to run and it
//!   is recorded as `Skipped`, which never counts against the exit code.
//!
//! `?` on I/O, mock and OS-facade errors converts them to faults.

use crate::mock::MockError;
use crate::sanity::SanityError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Outcome of a case body or hook
pub type CaseResult = Result<(), CaseError>;

/// A case body, setup or teardown
pub type Hook = Box<dyn Fn() -> CaseResult>;

/// Why a case body did not succeed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaseError {
    /// An expectation inside the case did not hold
    #[error("{0}")]
    Assertion(String),

    /// The case could not run to completion
    #[error("{0}")]
    Fault(String),

    /// The case declined to run
    #[error("skipped: {0}")]
    Skipped(String),
}

impl CaseError {
    pub fn assertion(msg: impl Into<String>) -> Self {
        CaseError::Assertion(msg.into())
    }

    pub fn fault(msg: impl Into<String>) -> Self {
        CaseError::Fault(msg.into())
    }

    /// Leave the case out of this run, e.g. when a fixture is unavailable
    pub fn skip(reason: impl Into<String>) -> Self {
        CaseError::Skipped(reason.into())
    }

    pub fn is_assertion(&self) -> bool {
        matches!(self, CaseError::Assertion(_))
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, CaseError::Skipped(_))
    }

    pub fn message(&self) -> &str {
        match self {
            CaseError::Assertion(msg) | CaseError::Fault(msg) | CaseError::Skipped(msg) => msg,
        }
    }
}

impl From<std::io::Error> for CaseError {
    fn from(err: std::io::Error) -> Self {
        CaseError::Fault(err.to_string())
    }
}

impl From<MockError> for CaseError {
    fn from(err: MockError) -> Self {
        CaseError::Fault(err.to_string())
    }
}

impl From<SanityError> for CaseError {
    fn from(err: SanityError) -> Self {
        CaseError::Fault(err.to_string())
    }
}

/// Fail the case with `message` unless `condition` holds
pub fn ensure(condition: bool, message: impl Into<String>) -> CaseResult {
    if condition {
        Ok(())
    } else {
        Err(CaseError::Assertion(message.into()))
    }
}

/// Fail the case unless `actual == expected`
pub fn ensure_eq<T>(actual: T, expected: T) -> CaseResult
where
    T: PartialEq + fmt::Debug,
{
    if actual == expected {
        Ok(())
    } else {
        Err(CaseError::Assertion(format!(
            "expected {:?}, got {:?}",
            expected, actual
        )))
    }
}

/// Lifecycle of a case within one run.
///
/// `Pending → Running → {Passed | Failed | Errored | Skipped}`; the last
/// four are terminal. A statically skipped case goes straight from
/// `Pending` to `Skipped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Pending,
    Running,
    Passed,
    Failed,
    Errored,
    Skipped,
}

impl CaseStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CaseStatus::Passed | CaseStatus::Failed | CaseStatus::Errored | CaseStatus::Skipped
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            CaseStatus::Pending => "PENDING",
            CaseStatus::Running => "RUNNING",
            CaseStatus::Passed => "PASS",
            CaseStatus::Failed => "FAIL",
            CaseStatus::Errored => "ERROR",
            CaseStatus::Skipped => "SKIP",
        }
    }
}

/// A named unit of work registered with the engine
pub struct TestCase {
    name: String,
    tags: Vec<String>,
    criteria: Option<String>,
    skip: Option<String>,
    setup: Option<Hook>,
    teardown: Option<Hook>,
    run: Hook,
}

impl TestCase {
    /// Create a case from its name and body
    pub fn new<F>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn() -> CaseResult + 'static,
    {
        Self {
            name: name.into(),
            tags: Vec::new(),
            criteria: None,
            skip: None,
            setup: None,
            teardown: None,
            run: Box::new(run),
        }
    }

    /// Tags used by `--tag` selection
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Free-form acceptance criteria shown at `doge` verbosity
    pub fn with_criteria(mut self, criteria: impl Into<String>) -> Self {
        self.criteria = Some(criteria.into());
        self
    }

    /// Keep the case registered but never run it; it reports `Skipped`
    pub fn with_skip(mut self, reason: impl Into<String>) -> Self {
        self.skip = Some(reason.into());
        self
    }

    /// Runs before the body; a failure errors the case without running it
    pub fn with_setup<F>(mut self, setup: F) -> Self
    where
        F: Fn() -> CaseResult + 'static,
    {
        self.setup = Some(Box::new(setup));
        self
    }

    /// Runs after the body
    pub fn with_teardown<F>(mut self, teardown: F) -> Self
    where
        F: Fn() -> CaseResult + 'static,
    {
        self.teardown = Some(Box::new(teardown));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn criteria(&self) -> Option<&str> {
        self.criteria.as_deref()
    }

    pub fn skip_reason(&self) -> Option<&str> {
        self.skip.as_deref()
    }

    pub(crate) fn setup(&self) -> Option<&Hook> {
        self.setup.as_ref()
    }

    pub(crate) fn teardown(&self) -> Option<&Hook> {
        self.teardown.as_ref()
    }

    pub(crate) fn body(&self) -> &Hook {
        &self.run
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("criteria", &self.criteria)
            .field("skip", &self.skip)
            .field("setup", &self.setup.is_some())
            .field("teardown", &self.teardown.is_some())
            .finish()
    }
}
