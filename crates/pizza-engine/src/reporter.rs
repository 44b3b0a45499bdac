//! Summary rendering
//!
//! [`Reporter`] turns a [`RunReport`] into text. It never looks at the
//! engine, so the same report renders the same way every time. Color is
//! applied per fragment only when enabled; no global color state is touched.

use crate::case::CaseStatus;
use crate::report::{CaseRecord, RunReport, Score, SuiteReport};
use colored::{ColoredString, Colorize};
use pizza_config::{RunConfig, Verbosity};
use std::fmt::Write;

const RULE_WIDTH: usize = 50;

/// Text reporter with output configuration
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    verbosity: Verbosity,
    color: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(Verbosity::Plain)
    }
}

impl Reporter {
    /// Create a reporter; color is off until enabled
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            color: false,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.verbosity).with_color(config.color)
    }

    /// Render the suite tree, the failure list and the grand total
    pub fn report(&self, run: &RunReport) -> String {
        let mut out = String::new();

        for suite in &run.suites {
            self.write_suite(&mut out, suite, 0);
        }

        let _ = writeln!(out, "{}", "─".repeat(RULE_WIDTH));
        self.write_failures(&mut out, run);
        self.write_total(&mut out, run);
        out
    }

    /// The same tree as pretty-printed JSON
    pub fn render_json(&self, run: &RunReport) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(run)
    }

    /// Render several iterations of the same selection, each under a
    /// `Run i/N` header. A single run renders exactly like [`Reporter::report`].
    pub fn report_runs(&self, runs: &[RunReport]) -> String {
        if let [run] = runs {
            return self.report(run);
        }
        let mut out = String::new();
        for (i, run) in runs.iter().enumerate() {
            let header = format!("Run {}/{}", i + 1, runs.len());
            let _ = writeln!(out, "{}", self.paint(&header, |s| s.bold()));
            out.push_str(&self.report(run));
        }
        out
    }

    /// One JSON object for a single run, an array for several
    pub fn render_json_runs(&self, runs: &[RunReport]) -> Result<String, serde_json::Error> {
        match runs {
            [run] => self.render_json(run),
            runs => serde_json::to_string_pretty(runs),
        }
    }

    /// Cases a dry run selected, one full name per line
    pub fn render_listing(&self, cases: &[String]) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} {} selected, none executed",
            self.paint("Dry run:", |s| s.cyan().bold()),
            plural(cases.len(), "case")
        );
        for name in cases {
            let _ = writeln!(out, "  {}", name);
        }
        out
    }

    fn write_suite(&self, out: &mut String, suite: &SuiteReport, depth: usize) {
        let indent = "  ".repeat(depth);
        let score = suite.score;
        let _ = writeln!(
            out,
            "{}{} ({} passed, {} failed, {} errored{})",
            indent,
            self.paint(&suite.name, |s| s.bold()),
            score.passed,
            score.failed,
            score.errored,
            skipped_suffix(&score)
        );

        if let Some(err) = &suite.setup_error {
            let _ = writeln!(out, "{}  {} {}", indent, self.paint("setup failed:", |s| s.red()), err);
        }

        if self.verbosity != Verbosity::Plain {
            for case in &suite.cases {
                self.write_case(out, case, &indent);
            }
        }

        for nested in &suite.suites {
            self.write_suite(out, nested, depth + 1);
        }

        if let Some(err) = &suite.teardown_error {
            let _ = writeln!(
                out,
                "{}  {} {}",
                indent,
                self.paint("teardown failed:", |s| s.yellow()),
                err
            );
        }
    }

    fn write_case(&self, out: &mut String, case: &CaseRecord, indent: &str) {
        let _ = write!(out, "{}  {} {}", indent, self.status(case.status), case.name);
        if self.verbosity == Verbosity::Doge {
            if let Some(ms) = case.duration_ms {
                let _ = write!(out, " ({:.3} ms)", ms);
            }
        }
        if let Some(msg) = &case.message {
            let _ = write!(out, ": {}", msg);
        }
        out.push('\n');

        if self.verbosity == Verbosity::Doge {
            if !case.tags.is_empty() {
                let _ = writeln!(out, "{}      tags: {}", indent, case.tags.join(", "));
            }
            if let Some(criteria) = &case.criteria {
                let _ = writeln!(out, "{}      criteria: {}", indent, criteria);
            }
        }
    }

    fn write_failures(&self, out: &mut String, run: &RunReport) {
        let failures = run.failures();
        if failures.is_empty() {
            return;
        }

        let _ = writeln!(out, "{}", self.paint("Failures:", |s| s.red().bold()));
        for (path, case) in failures {
            let _ = writeln!(
                out,
                "  {} {}::{}",
                self.status(case.status),
                path,
                case.name
            );
            if let Some(msg) = &case.message {
                for line in msg.lines() {
                    let _ = writeln!(out, "      {}", self.paint(line, |s| s.dimmed()));
                }
            }
        }
        let _ = writeln!(out, "{}", "─".repeat(RULE_WIDTH));
    }

    fn write_total(&self, out: &mut String, run: &RunReport) {
        let score = run.score;
        let verdict = if score.all_passed() {
            self.paint("PASSED", |s| s.green().bold())
        } else {
            self.paint("FAILED", |s| s.red().bold())
        };

        let _ = writeln!(
            out,
            "Test result: {} | {} total, {} passed, {} failed, {} errored{}",
            verdict,
            score.total(),
            score.passed,
            score.failed,
            score.errored,
            skipped_suffix(&score)
        );
        let _ = writeln!(out, "Time: {:.3} ms", run.elapsed_ms);

        if let Some(timing) = run.timing {
            let _ = writeln!(
                out,
                "Timing: min {:.3} ms, max {:.3} ms, avg {:.3} ms",
                timing.min_ms, timing.max_ms, timing.avg_ms
            );
        }
    }

    fn status(&self, status: CaseStatus) -> String {
        let label = status.label();
        match status {
            CaseStatus::Passed => self.paint(label, |s| s.green().bold()),
            CaseStatus::Failed => self.paint(label, |s| s.red().bold()),
            CaseStatus::Errored => self.paint(label, |s| s.magenta().bold()),
            CaseStatus::Skipped => self.paint(label, |s| s.yellow()),
            CaseStatus::Pending | CaseStatus::Running => label.to_string(),
        }
    }

    fn paint(&self, text: &str, style: impl Fn(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }
}

fn skipped_suffix(score: &Score) -> String {
    if score.skipped > 0 {
        format!(", {} skipped", score.skipped)
    } else {
        String::new()
    }
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{} {}", n, noun)
    } else {
        format!("{} {}s", n, noun)
    }
}
