//! Suite execution
//!
//! Walks a registered suite tree depth-first: setup, own cases, nested
//! suites, teardown. Every hook and case body runs behind `catch_unwind`,
//! so one misbehaving case never takes the rest of the run down with it.

use crate::case::{CaseError, CaseStatus, Hook, TestCase};
use crate::filter::CaseFilter;
use crate::registry::Registry;
use crate::report::{CaseRecord, RunReport, Score, SuiteReport, TimingSummary};
use crate::timing::Timer;
use chrono::{SecondsFormat, Utc};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// How a single hook or body invocation ended
#[derive(Debug, Clone, PartialEq)]
enum Outcome {
    Passed,
    Failed(String),
    Errored(String),
    Panicked(String),
    Skipped(String),
}

impl Outcome {
    fn passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }

    /// Failure text; `None` for passed and skipped invocations
    fn message(&self) -> Option<&str> {
        match self {
            Outcome::Passed | Outcome::Skipped(_) => None,
            Outcome::Failed(msg) | Outcome::Errored(msg) | Outcome::Panicked(msg) => Some(msg),
        }
    }
}

/// Invoke a hook, containing both returned errors and panics
fn guarded(hook: &Hook) -> Outcome {
    match panic::catch_unwind(AssertUnwindSafe(|| hook())) {
        Ok(Ok(())) => Outcome::Passed,
        Ok(Err(CaseError::Assertion(msg))) => Outcome::Failed(msg),
        Ok(Err(CaseError::Fault(msg))) => Outcome::Errored(msg),
        Ok(Err(CaseError::Skipped(reason))) => Outcome::Skipped(reason),
        Err(payload) => Outcome::Panicked(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    format!("panicked: {}", detail)
}

/// Why a subtree's cases are recorded without running
#[derive(Debug, Clone, PartialEq)]
struct Block {
    status: CaseStatus,
    reason: String,
}

pub(crate) struct SuiteRunner<'a> {
    registry: &'a Registry,
    filter: &'a CaseFilter,
    timer: Option<&'a mut (dyn Timer + 'static)>,
}

impl<'a> SuiteRunner<'a> {
    pub fn new(
        registry: &'a Registry,
        filter: &'a CaseFilter,
        timer: Option<&'a mut (dyn Timer + 'static)>,
    ) -> Self {
        Self {
            registry,
            filter,
            timer,
        }
    }

    /// Run the given suites in order and collect a fresh report
    pub fn run(&mut self, suites: &[usize]) -> RunReport {
        let started_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let clock = Instant::now();
        if let Some(timer) = self.timer.as_deref_mut() {
            timer.reset();
        }

        let mut reports = Vec::with_capacity(suites.len());
        let mut score = Score::default();
        for &index in suites {
            let report = self.run_suite(index, None);
            score.absorb(&report.score);
            reports.push(report);
        }

        let timing = self.timer.as_deref().map(|timer| TimingSummary {
            min_ms: timer.min() * 1000.0,
            max_ms: timer.max() * 1000.0,
            avg_ms: timer.avg() * 1000.0,
        });

        tracing::debug!(
            passed = score.passed,
            failed = score.failed,
            errored = score.errored,
            skipped = score.skipped,
            "run finished"
        );

        RunReport {
            started_at,
            suites: reports,
            score,
            elapsed_ms: clock.elapsed().as_secs_f64() * 1000.0,
            timing,
        }
    }

    /// Full names (`Suite::Nested::case`) of the cases a run of `suites`
    /// would select, in execution order. Nothing is invoked.
    pub fn plan(&self, suites: &[usize]) -> Vec<String> {
        let mut names = Vec::new();
        for &index in suites {
            self.plan_suite(index, &mut names);
        }
        names
    }

    fn plan_suite(&self, index: usize, names: &mut Vec<String>) {
        let node = self.registry.node(index);
        let path = self.registry.path(index);
        let prefix = path.join("::");
        for case in node.cases.iter().filter(|c| self.filter.selects(&path, c)) {
            names.push(format!("{}::{}", prefix, case.name()));
        }
        for &child in &node.children {
            self.plan_suite(child, names);
        }
    }

    /// Whether the filter selects at least one case in the subtree
    fn has_selected(&self, index: usize) -> bool {
        let node = self.registry.node(index);
        let path = self.registry.path(index);
        node.cases.iter().any(|c| self.filter.selects(&path, c))
            || node.children.iter().any(|&child| self.has_selected(child))
    }

    /// Run one suite subtree. `blocked` carries the reason an ancestor's
    /// setup failed or skipped; a blocked subtree runs no hooks and no
    /// bodies. Hooks of a subtree with no selected case never run either.
    fn run_suite(&mut self, index: usize, blocked: Option<&Block>) -> SuiteReport {
        let registry = self.registry;
        let filter = self.filter;
        let node = registry.node(index);
        let path = registry.path(index);
        let mut report = SuiteReport::new(&node.name, path.join("::"));
        let clock = Instant::now();

        let span = tracing::debug_span!("suite", path = %report.path);
        let _enter = span.enter();

        let active = blocked.is_none() && self.has_selected(index);
        tracing::debug!(active, "suite started");

        let mut setup_panicked = false;
        let mut own_block: Option<Block> = None;
        if active {
            if let Some(setup) = &node.setup {
                let outcome = guarded(setup);
                if let Some(msg) = outcome.message() {
                    tracing::warn!(suite = %report.path, error = msg, "suite setup failed");
                    setup_panicked = matches!(outcome, Outcome::Panicked(_));
                    report.setup_error = Some(msg.to_string());
                    own_block = Some(Block {
                        status: CaseStatus::Errored,
                        reason: format!("suite setup failed: {}", msg),
                    });
                } else if let Outcome::Skipped(reason) = outcome {
                    tracing::debug!(suite = %report.path, reason = %reason, "suite skipped");
                    own_block = Some(Block {
                        status: CaseStatus::Skipped,
                        reason,
                    });
                }
            }
        }
        let block = blocked.or(own_block.as_ref());

        for case in node.cases.iter().filter(|c| filter.selects(&path, c)) {
            let record = match (case.skip_reason(), block) {
                (Some(reason), _) => skipped_record(case, reason),
                (None, Some(block)) => blocked_record(case, block),
                (None, None) => self.run_case(case),
            };
            report.cases.push(record);
        }

        for &child in &node.children {
            let child_report = self.run_suite(child, block);
            report.suites.push(child_report);
        }

        if active && !setup_panicked {
            if let Some(teardown) = &node.teardown {
                let outcome = guarded(teardown);
                if let Some(msg) = outcome.message() {
                    tracing::warn!(suite = %report.path, error = msg, "suite teardown failed");
                    report.teardown_error = Some(msg.to_string());
                }
            }
        }

        report.tally();
        report.elapsed_ms = clock.elapsed().as_secs_f64() * 1000.0;
        tracing::debug!(
            passed = report.score.passed,
            failed = report.score.failed,
            errored = report.score.errored,
            skipped = report.score.skipped,
            "suite finished"
        );
        report
    }

    fn run_case(&mut self, case: &TestCase) -> CaseRecord {
        let mut record = CaseRecord::pending(case);
        record.begin();
        tracing::debug!(case = case.name(), "case started");

        let before = self.timer.as_deref().map(|t| t.elapsed());
        if let Some(timer) = self.timer.as_deref_mut() {
            timer.start();
        }

        let mut setup_panicked = false;
        let mut outcome = match case.setup().map(guarded) {
            Some(Outcome::Passed) | None => guarded(case.body()),
            Some(Outcome::Skipped(reason)) => Outcome::Skipped(reason),
            Some(failed) => {
                setup_panicked = matches!(failed, Outcome::Panicked(_));
                Outcome::Errored(format!(
                    "case setup failed: {}",
                    failed.message().unwrap_or_default()
                ))
            }
        };

        if !setup_panicked {
            if let Some(teardown) = case.teardown() {
                let teardown_outcome = guarded(teardown);
                if outcome.passed() {
                    if let Some(msg) = teardown_outcome.message() {
                        outcome = Outcome::Errored(format!("case teardown failed: {}", msg));
                    }
                }
            }
        }

        if let Some(timer) = self.timer.as_deref_mut() {
            timer.stop();
        }
        let duration_ms = match (before, self.timer.as_deref()) {
            (Some(before), Some(timer)) => Some((timer.elapsed() - before).max(0.0) * 1000.0),
            _ => None,
        };

        let (status, message) = match outcome {
            Outcome::Passed => (CaseStatus::Passed, None),
            Outcome::Failed(msg) => (CaseStatus::Failed, Some(msg)),
            Outcome::Errored(msg) | Outcome::Panicked(msg) => (CaseStatus::Errored, Some(msg)),
            Outcome::Skipped(reason) => (CaseStatus::Skipped, Some(reason)),
        };
        tracing::debug!(case = case.name(), status = status.label(), "case finished");
        record.finish(status, message, duration_ms);
        record
    }
}

fn blocked_record(case: &TestCase, block: &Block) -> CaseRecord {
    let mut record = CaseRecord::pending(case);
    record.finish(block.status, Some(block.reason.clone()), None);
    record
}

fn skipped_record(case: &TestCase, reason: &str) -> CaseRecord {
    tracing::debug!(case = case.name(), reason, "case skipped");
    let mut record = CaseRecord::pending(case);
    record.finish(CaseStatus::Skipped, Some(reason.to_string()), None);
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::CaseResult;
    use crate::suite::TestSuite;
    use crate::timing::Benchmark;
    use pretty_assertions::assert_eq;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn run(registry: &Registry) -> RunReport {
        let filter = CaseFilter::all();
        SuiteRunner::new(registry, &filter, None).run(registry.roots())
    }

    fn statuses(report: &SuiteReport) -> Vec<(String, CaseStatus)> {
        report
            .walk_cases()
            .into_iter()
            .map(|(_, c)| (c.name.clone(), c.status))
            .collect()
    }

    #[test]
    fn test_classification() {
        let mut registry = Registry::new(1);
        registry
            .insert_root(
                TestSuite::new("s")
                    .with_case(TestCase::new("ok", || Ok(())))
                    .with_case(TestCase::new("fails", || Err(CaseError::assertion("no"))))
                    .with_case(TestCase::new("faults", || Err(CaseError::fault("io"))))
                    .with_case(TestCase::new("panics", || -> CaseResult { panic!("boom") })),
            )
            .unwrap();

        let report = run(&registry);
        let suite = report.suite("s").unwrap();

        assert_eq!(
            statuses(suite),
            vec![
                ("ok".to_string(), CaseStatus::Passed),
                ("fails".to_string(), CaseStatus::Failed),
                ("faults".to_string(), CaseStatus::Errored),
                ("panics".to_string(), CaseStatus::Errored),
            ]
        );
        assert_eq!(suite.case("panics").unwrap().message.as_deref(), Some("panicked: boom"));
        assert_eq!(report.exit_code(), 3);
    }

    #[test]
    fn test_execution_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let push = |name: &'static str| {
            let log = Rc::clone(&log);
            move || -> CaseResult {
                log.borrow_mut().push(name);
                Ok(())
            }
        };

        let mut registry = Registry::new(1);
        registry
            .insert_root(
                TestSuite::new("outer")
                    .with_setup(push("outer.setup"))
                    .with_teardown(push("outer.teardown"))
                    .with_case(TestCase::new("a", push("a")))
                    .with_suite(
                        TestSuite::new("inner")
                            .with_setup(push("inner.setup"))
                            .with_teardown(push("inner.teardown"))
                            .with_case(TestCase::new("b", push("b"))),
                    )
                    .with_case(TestCase::new("c", push("c"))),
            )
            .unwrap();

        run(&registry);

        assert_eq!(
            *log.borrow(),
            vec![
                "outer.setup",
                "a",
                "c",
                "inner.setup",
                "b",
                "inner.teardown",
                "outer.teardown"
            ]
        );
    }

    #[test]
    fn test_setup_failure_blocks_subtree_but_runs_teardown() {
        let ran = Rc::new(RefCell::new(Vec::new()));
        let mark = |name: &'static str| {
            let ran = Rc::clone(&ran);
            move || -> CaseResult {
                ran.borrow_mut().push(name);
                Ok(())
            }
        };

        let mut registry = Registry::new(1);
        registry
            .insert_root(
                TestSuite::new("broken")
                    .with_setup(|| Err(CaseError::fault("db down")))
                    .with_teardown(mark("teardown"))
                    .with_case(TestCase::new("x", mark("x")))
                    .with_suite(
                        TestSuite::new("nested")
                            .with_setup(mark("nested.setup"))
                            .with_case(TestCase::new("y", mark("y"))),
                    ),
            )
            .unwrap();
        registry
            .insert_root(TestSuite::new("sibling").with_case(TestCase::new("z", mark("z"))))
            .unwrap();

        let report = run(&registry);
        let broken = report.suite("broken").unwrap();

        assert_eq!(*ran.borrow(), vec!["teardown", "z"]);
        assert_eq!(broken.setup_error.as_deref(), Some("db down"));
        assert_eq!(broken.score.errored, 2);
        for (_, case) in broken.walk_cases() {
            assert_eq!(case.status, CaseStatus::Errored);
            assert_eq!(case.message.as_deref(), Some("suite setup failed: db down"));
        }
        assert!(report.suite("sibling").unwrap().score.all_passed());
    }

    #[test]
    fn test_setup_panic_skips_teardown() {
        let torn_down = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&torn_down);

        let mut registry = Registry::new(1);
        registry
            .insert_root(
                TestSuite::new("s")
                    .with_setup(|| -> CaseResult { panic!("no resources") })
                    .with_teardown(move || {
                        *flag.borrow_mut() = true;
                        Ok(())
                    })
                    .with_case(TestCase::new("x", || Ok(()))),
            )
            .unwrap();

        let report = run(&registry);

        assert!(!*torn_down.borrow());
        assert_eq!(report.score.errored, 1);
    }

    #[test]
    fn test_case_hooks() {
        let mut registry = Registry::new(1);
        registry
            .insert_root(
                TestSuite::new("s")
                    .with_case(
                        TestCase::new("bad_setup", || panic!("body must not run"))
                            .with_setup(|| Err(CaseError::fault("no fixture"))),
                    )
                    .with_case(
                        TestCase::new("bad_teardown", || Ok(()))
                            .with_teardown(|| Err(CaseError::fault("leak"))),
                    )
                    .with_case(
                        TestCase::new("fails_first", || Err(CaseError::assertion("off by one")))
                            .with_teardown(|| Err(CaseError::fault("leak"))),
                    ),
            )
            .unwrap();

        let report = run(&registry);
        let suite = report.suite("s").unwrap();

        let bad_setup = suite.case("bad_setup").unwrap();
        assert_eq!(bad_setup.status, CaseStatus::Errored);
        assert_eq!(bad_setup.message.as_deref(), Some("case setup failed: no fixture"));

        let bad_teardown = suite.case("bad_teardown").unwrap();
        assert_eq!(bad_teardown.status, CaseStatus::Errored);
        assert_eq!(bad_teardown.message.as_deref(), Some("case teardown failed: leak"));

        let fails_first = suite.case("fails_first").unwrap();
        assert_eq!(fails_first.status, CaseStatus::Failed);
        assert_eq!(fails_first.message.as_deref(), Some("off by one"));
    }

    #[test]
    fn test_teardown_failure_is_recorded_not_counted() {
        let mut registry = Registry::new(1);
        registry
            .insert_root(
                TestSuite::new("s")
                    .with_teardown(|| Err(CaseError::fault("cleanup")))
                    .with_case(TestCase::new("x", || Ok(()))),
            )
            .unwrap();

        let report = run(&registry);
        let suite = report.suite("s").unwrap();

        assert_eq!(suite.teardown_error.as_deref(), Some("cleanup"));
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_timer_drives_durations() {
        let mut registry = Registry::new(1);
        registry
            .insert_root(
                TestSuite::new("s")
                    .with_case(TestCase::new("a", || Ok(())))
                    .with_case(TestCase::new("b", || Ok(()))),
            )
            .unwrap();

        let filter = CaseFilter::all();
        let mut timer = Benchmark::new("cases");
        let report = SuiteRunner::new(
            &registry,
            &filter,
            Some(&mut timer as &mut (dyn Timer + 'static)),
        )
        .run(registry.roots());

        assert_eq!(timer.samples(), 2);
        assert!(report.timing.is_some());
        for (_, case) in report.cases() {
            assert!(case.duration_ms.is_some());
        }
    }

    #[test]
    fn test_filtered_cases_are_absent() {
        let mut registry = Registry::new(1);
        registry
            .insert_root(
                TestSuite::new("s")
                    .with_case(TestCase::new("keep", || Ok(())))
                    .with_case(TestCase::new("drop", || panic!("deselected"))),
            )
            .unwrap();

        let mut config = pizza_config::RunConfig::default();
        config.skip = vec!["drop".to_string()];
        let filter = CaseFilter::from_config(&config).unwrap();
        let report = SuiteRunner::new(&registry, &filter, None).run(registry.roots());

        let suite = report.suite("s").unwrap();
        assert_eq!(suite.cases.len(), 1);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_hooks_skip_suites_without_selected_cases() {
        let counter = Rc::new(Cell::new(0));
        let (on_setup, on_teardown) = (Rc::clone(&counter), Rc::clone(&counter));

        let mut registry = Registry::new(1);
        registry
            .insert_root(TestSuite::new("Math").with_case(TestCase::new("adds", || Ok(()))))
            .unwrap();
        registry
            .insert_root(
                TestSuite::new("Db")
                    .with_setup(move || {
                        on_setup.set(on_setup.get() + 1);
                        Err(CaseError::fault("db down"))
                    })
                    .with_teardown(move || {
                        on_teardown.set(on_teardown.get() + 10);
                        Ok(())
                    })
                    .with_case(TestCase::new("query", || Ok(()))),
            )
            .unwrap();

        let mut config = pizza_config::RunConfig::default();
        config.suites = vec!["Math".to_string()];
        let filter = CaseFilter::from_config(&config).unwrap();
        let report = SuiteRunner::new(&registry, &filter, None).run(registry.roots());

        assert_eq!(counter.get(), 0);
        let db = report.suite("Db").unwrap();
        assert_eq!(db.setup_error, None);
        assert!(db.cases.is_empty());
        assert_eq!(report.score.total(), 1);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_hooks_run_for_parent_of_selected_nested_case() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let push = |name: &'static str| {
            let log = Rc::clone(&log);
            move || -> CaseResult {
                log.borrow_mut().push(name);
                Ok(())
            }
        };

        let mut registry = Registry::new(1);
        registry
            .insert_root(
                TestSuite::new("outer")
                    .with_setup(push("outer.setup"))
                    .with_teardown(push("outer.teardown"))
                    .with_case(TestCase::new("slow", push("slow")))
                    .with_suite(
                        TestSuite::new("inner")
                            .with_setup(push("inner.setup"))
                            .with_case(TestCase::new("fast", push("fast")).with_tags(["fast"])),
                    )
                    .with_suite(
                        TestSuite::new("idle")
                            .with_setup(push("idle.setup"))
                            .with_case(TestCase::new("other", push("other"))),
                    ),
            )
            .unwrap();

        let mut config = pizza_config::RunConfig::default();
        config.tags = vec!["fast".to_string()];
        let filter = CaseFilter::from_config(&config).unwrap();
        SuiteRunner::new(&registry, &filter, None).run(registry.roots());

        assert_eq!(
            *log.borrow(),
            vec!["outer.setup", "inner.setup", "fast", "outer.teardown"]
        );
    }

    #[test]
    fn test_skipped_cases() {
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);

        let mut registry = Registry::new(1);
        registry
            .insert_root(
                TestSuite::new("s")
                    .with_case(TestCase::new("declines", || Err(CaseError::skip("no network"))))
                    .with_case(
                        TestCase::new("parked", move || {
                            flag.set(true);
                            Ok(())
                        })
                        .with_skip("flaky on CI"),
                    )
                    .with_case(
                        TestCase::new("no_fixture", || panic!("body must not run"))
                            .with_setup(|| Err(CaseError::skip("fixture missing"))),
                    )
                    .with_case(TestCase::new("ok", || Ok(()))),
            )
            .unwrap();

        let report = run(&registry);
        let suite = report.suite("s").unwrap();

        assert!(!ran.get());
        assert_eq!(
            statuses(suite),
            vec![
                ("declines".to_string(), CaseStatus::Skipped),
                ("parked".to_string(), CaseStatus::Skipped),
                ("no_fixture".to_string(), CaseStatus::Skipped),
                ("ok".to_string(), CaseStatus::Passed),
            ]
        );
        assert_eq!(suite.case("parked").unwrap().message.as_deref(), Some("flaky on CI"));
        assert_eq!(suite.score.skipped, 3);
        assert!(report.failures().is_empty());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_suite_setup_skip_skips_subtree() {
        let torn_down = Rc::new(Cell::new(false));
        let flag = Rc::clone(&torn_down);

        let mut registry = Registry::new(1);
        registry
            .insert_root(
                TestSuite::new("gpu")
                    .with_setup(|| Err(CaseError::skip("no device")))
                    .with_teardown(move || {
                        flag.set(true);
                        Ok(())
                    })
                    .with_case(TestCase::new("draws", || panic!("must not run")))
                    .with_suite(
                        TestSuite::new("shaders")
                            .with_case(TestCase::new("compiles", || panic!("must not run"))),
                    ),
            )
            .unwrap();

        let report = run(&registry);
        let gpu = report.suite("gpu").unwrap();

        assert!(torn_down.get());
        assert_eq!(gpu.setup_error, None);
        assert_eq!(gpu.score.skipped, 2);
        for (_, case) in gpu.walk_cases() {
            assert_eq!(case.status, CaseStatus::Skipped);
            assert_eq!(case.message.as_deref(), Some("no device"));
        }
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_static_skip_survives_failed_setup() {
        let mut registry = Registry::new(1);
        registry
            .insert_root(
                TestSuite::new("s")
                    .with_setup(|| Err(CaseError::fault("db down")))
                    .with_case(TestCase::new("parked", || Ok(())).with_skip("later"))
                    .with_case(TestCase::new("x", || Ok(()))),
            )
            .unwrap();

        let report = run(&registry);
        let suite = report.suite("s").unwrap();

        assert_eq!(suite.case("parked").unwrap().status, CaseStatus::Skipped);
        assert_eq!(suite.case("x").unwrap().status, CaseStatus::Errored);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_plan_lists_selected_cases_without_running() {
        let mut registry = Registry::new(1);
        registry
            .insert_root(
                TestSuite::new("Math")
                    .with_setup(|| panic!("setup must not run"))
                    .with_case(TestCase::new("adds", || panic!("must not run")))
                    .with_case(TestCase::new("addsLarge", || panic!("must not run")))
                    .with_suite(
                        TestSuite::new("Rounding")
                            .with_case(TestCase::new("floors", || panic!("must not run"))),
                    ),
            )
            .unwrap();

        let mut config = pizza_config::RunConfig::default();
        config.skip = vec!["*Large".to_string()];
        let filter = CaseFilter::from_config(&config).unwrap();
        let plan = SuiteRunner::new(&registry, &filter, None).plan(registry.roots());

        assert_eq!(plan, vec!["Math::adds", "Math::Rounding::floors"]);
    }
}
