//! Result tree produced by a run
//!
//! Results are kept apart from the registered definitions: every run builds
//! a fresh [`RunReport`], so re-running never sees residue from an earlier
//! run.

use crate::case::{CaseStatus, TestCase};
use serde::Serialize;

/// Roll-up counts over a subtree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Score {
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped: usize,
}

impl Score {
    /// Every selected case, skipped ones included
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.errored + self.skipped
    }

    pub fn not_passed(&self) -> usize {
        self.failed + self.errored
    }

    pub fn all_passed(&self) -> bool {
        self.not_passed() == 0
    }

    pub fn record(&mut self, status: CaseStatus) {
        match status {
            CaseStatus::Passed => self.passed += 1,
            CaseStatus::Failed => self.failed += 1,
            CaseStatus::Errored => self.errored += 1,
            CaseStatus::Skipped => self.skipped += 1,
            CaseStatus::Pending | CaseStatus::Running => {}
        }
    }

    pub fn absorb(&mut self, other: &Score) {
        self.passed += other.passed;
        self.failed += other.failed;
        self.errored += other.errored;
        self.skipped += other.skipped;
    }
}

/// One case's result within a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criteria: Option<String>,
    pub status: CaseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
}

impl CaseRecord {
    pub(crate) fn pending(case: &TestCase) -> Self {
        Self {
            name: case.name().to_string(),
            tags: case.tags().to_vec(),
            criteria: case.criteria().map(str::to_string),
            status: CaseStatus::Pending,
            message: None,
            duration_ms: None,
        }
    }

    pub(crate) fn begin(&mut self) {
        if self.status == CaseStatus::Pending {
            self.status = CaseStatus::Running;
        }
    }

    /// Move to a terminal status. Has no effect once terminal.
    pub(crate) fn finish(
        &mut self,
        status: CaseStatus,
        message: Option<String>,
        duration_ms: Option<f64>,
    ) {
        debug_assert!(status.is_terminal());
        if self.status.is_terminal() {
            return;
        }
        self.status = status;
        self.message = message;
        self.duration_ms = duration_ms;
    }

    pub fn passed(&self) -> bool {
        self.status == CaseStatus::Passed
    }

    /// Failed or errored; skipped cases are not failures
    pub fn failed(&self) -> bool {
        matches!(self.status, CaseStatus::Failed | CaseStatus::Errored)
    }
}

/// A suite's result, with its nested suites in registration order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuiteReport {
    pub name: String,
    /// Suite names from the root, joined with `::`
    pub path: String,
    pub cases: Vec<CaseRecord>,
    pub suites: Vec<SuiteReport>,
    /// Aggregate over this suite's cases and every nested suite
    pub score: Score,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teardown_error: Option<String>,
    pub elapsed_ms: f64,
}

impl SuiteReport {
    pub(crate) fn new(name: &str, path: String) -> Self {
        Self {
            name: name.to_string(),
            path,
            cases: Vec::new(),
            suites: Vec::new(),
            score: Score::default(),
            setup_error: None,
            teardown_error: None,
            elapsed_ms: 0.0,
        }
    }

    /// Recompute `score` from cases and nested suites
    pub(crate) fn tally(&mut self) {
        let mut score = Score::default();
        for case in &self.cases {
            score.record(case.status);
        }
        for suite in &self.suites {
            score.absorb(&suite.score);
        }
        self.score = score;
    }

    /// Number of suites in this subtree, including this one
    pub fn suite_count(&self) -> usize {
        1 + self.suites.iter().map(SuiteReport::suite_count).sum::<usize>()
    }

    /// Every case in the subtree in execution order, with its suite path
    pub fn walk_cases(&self) -> Vec<(&str, &CaseRecord)> {
        let mut out = Vec::new();
        self.collect_cases(&mut out);
        out
    }

    fn collect_cases<'a>(&'a self, out: &mut Vec<(&'a str, &'a CaseRecord)>) {
        for case in &self.cases {
            out.push((self.path.as_str(), case));
        }
        for suite in &self.suites {
            suite.collect_cases(out);
        }
    }

    /// Find a nested suite by name path below this one
    pub fn find(&self, path: &[&str]) -> Option<&SuiteReport> {
        match path.split_first() {
            None => Some(self),
            Some((head, rest)) => self
                .suites
                .iter()
                .find(|s| s.name == *head)
                .and_then(|s| s.find(rest)),
        }
    }

    pub fn case(&self, name: &str) -> Option<&CaseRecord> {
        self.cases.iter().find(|c| c.name == name)
    }
}

/// Min/max/avg reported by the timing collaborator, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimingSummary {
    pub min_ms: f64,
    pub max_ms: f64,
    pub avg_ms: f64,
}

/// Everything one `run_all` / `run_suite` call produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// RFC 3339 start time
    pub started_at: String,
    pub suites: Vec<SuiteReport>,
    pub score: Score,
    pub elapsed_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimingSummary>,
}

impl RunReport {
    pub fn suite(&self, name: &str) -> Option<&SuiteReport> {
        self.suites.iter().find(|s| s.name == name)
    }

    /// Every case in the run, in execution order
    pub fn cases(&self) -> Vec<(&str, &CaseRecord)> {
        self.suites.iter().flat_map(SuiteReport::walk_cases).collect()
    }

    /// Failed and errored cases, in execution order
    pub fn failures(&self) -> Vec<(&str, &CaseRecord)> {
        self.cases()
            .into_iter()
            .filter(|(_, case)| case.failed())
            .collect()
    }

    pub fn suite_count(&self) -> usize {
        self.suites.iter().map(SuiteReport::suite_count).sum()
    }

    /// Process exit status: number of non-passing cases, capped at 255
    pub fn exit_code(&self) -> i32 {
        self.score.not_passed().min(255) as i32
    }
}
