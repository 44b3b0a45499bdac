//! Suite definitions
//!
//! A [`TestSuite`] is a builder value: name, cases, nested suites and
//! optional hooks. Handing it to the engine moves it into the engine's
//! registry, where it is addressed by a [`SuiteId`](crate::SuiteId).

use crate::case::{CaseResult, Hook, TestCase};
use std::fmt;

pub struct TestSuite {
    pub(crate) name: String,
    pub(crate) cases: Vec<TestCase>,
    pub(crate) suites: Vec<TestSuite>,
    pub(crate) setup: Option<Hook>,
    pub(crate) teardown: Option<Hook>,
}

impl TestSuite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cases: Vec::new(),
            suites: Vec::new(),
            setup: None,
            teardown: None,
        }
    }

    /// Append a case; execution follows insertion order
    pub fn with_case(mut self, case: TestCase) -> Self {
        self.cases.push(case);
        self
    }

    /// Append a nested suite; it runs after this suite's own cases
    pub fn with_suite(mut self, suite: TestSuite) -> Self {
        self.suites.push(suite);
        self
    }

    /// Runs once before any case in the subtree.
    ///
    /// If it fails, every case below this suite is recorded as errored
    /// without running.
    pub fn with_setup<F>(mut self, setup: F) -> Self
    where
        F: Fn() -> CaseResult + 'static,
    {
        self.setup = Some(Box::new(setup));
        self
    }

    /// Runs once after the whole subtree
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

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn suites(&self) -> &[TestSuite] {
        &self.suites
    }
}

impl fmt::Debug for TestSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSuite")
            .field("name", &self.name)
            .field("cases", &self.cases)
            .field("suites", &self.suites)
            .field("setup", &self.setup.is_some())
            .field("teardown", &self.teardown.is_some())
            .finish()
    }
}
