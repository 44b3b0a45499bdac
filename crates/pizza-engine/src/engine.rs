//! The engine: registration, execution and lifecycle
//!
//! An [`Engine`] is created once at process start with [`Engine::init`],
//! collects suites and cases, runs them, and is closed with
//! [`Engine::end`], which returns the process exit status.
//!
//! ```
//! use pizza_engine::{ensure_eq, Engine, TestCase, TestSuite};
//! use pizza_config::RunConfig;
//!
//! let mut engine = Engine::with_config(RunConfig::default()).unwrap();
//! let math = engine.add_suite(TestSuite::new("Math")).unwrap();
//! engine
//!     .add_case(math, TestCase::new("adds", || ensure_eq(2 + 2, 4)))
//!     .unwrap();
//!
//! assert_eq!(engine.run_all().unwrap(), 0);
//! assert_eq!(engine.end(), 0);
//! ```
//!
//! With `repeat` set, each run call executes the selection that many times
//! and keeps every report. With `dry_run` set, run calls only record which
//! cases would have been selected.

use crate::args::RunArgs;
use crate::case::TestCase;
use crate::error::{EngineError, EngineResult};
use crate::filter::CaseFilter;
use crate::logging;
use crate::mock::CallRecorder;
use crate::registry::{CaseId, Registry, SuiteId};
use crate::report::RunReport;
use crate::reporter::Reporter;
use crate::runner::SuiteRunner;
use crate::suite::TestSuite;
use crate::timing::{Benchmark, Timer};
use clap::Parser;
use pizza_config::{OutputFormat, RunConfig};
use std::ffi::OsString;
use std::process::ExitCode;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ENGINE_ID: AtomicU64 = AtomicU64::new(1);

pub struct Engine {
    config: RunConfig,
    filter: CaseFilter,
    registry: Registry,
    timer: Option<Box<dyn Timer>>,
    recorders: Vec<CallRecorder>,
    /// Reports of the latest run call, one per repetition
    reports: Vec<RunReport>,
    /// Case names selected by the latest dry run
    listing: Option<Vec<String>>,
    /// Set when the first run starts; freezes the suite tree
    frozen: bool,
    has_run: bool,
    exit_code: i32,
    ended: bool,
}

impl Engine {
    /// Build an engine from command-line arguments.
    ///
    /// `args` includes the program name, as with `std::env::args()`. Flags
    /// are layered over the file and environment configuration, and the
    /// tracing subscriber is installed for the resolved verbosity.
    pub fn init<I, T>(args: I) -> EngineResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args = RunArgs::try_parse_from(args)?;
        let config = args.resolve()?;
        logging::init(config.verbosity);
        Self::with_config(config)
    }

    /// Build an engine from an already resolved configuration
    pub fn with_config(config: RunConfig) -> EngineResult<Self> {
        let filter = CaseFilter::from_config(&config)?;
        let timer: Option<Box<dyn Timer>> = if config.timing {
            Some(Box::new(Benchmark::new("cases")))
        } else {
            None
        };

        let id = NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(engine = id, filters = config.has_filters(), "engine created");

        Ok(Self {
            config,
            filter,
            registry: Registry::new(id),
            timer,
            recorders: Vec::new(),
            reports: Vec::new(),
            listing: None,
            frozen: false,
            has_run: false,
            exit_code: 0,
            ended: false,
        })
    }

    /// Replace the timing collaborator
    pub fn with_timer<T: Timer + 'static>(mut self, timer: T) -> Self {
        self.timer = Some(Box::new(timer));
        self
    }

    /// Register a top-level suite together with its nested suites and cases
    pub fn add_suite(&mut self, suite: TestSuite) -> EngineResult<SuiteId> {
        self.check_mutable("add a suite")?;
        self.registry.insert_root(suite)
    }

    /// Register a suite nested under `parent`
    pub fn add_sub_suite(&mut self, parent: SuiteId, suite: TestSuite) -> EngineResult<SuiteId> {
        self.registry.resolve(parent)?;
        self.check_mutable("add a suite")?;
        self.registry.insert_child(parent, suite)
    }

    /// Register a case under a root or nested suite.
    ///
    /// A handle is checked before the engine state, so a handle used after
    /// [`Engine::end`] reports [`EngineError::InvalidHandle`].
    pub fn add_case(&mut self, suite: SuiteId, case: TestCase) -> EngineResult<CaseId> {
        self.registry.resolve(suite)?;
        self.check_mutable("add a case")?;
        self.registry.insert_case(suite, case)
    }

    /// Hand out a recorder that is swept at [`Engine::end`] if still alive
    pub fn new_recorder(&mut self) -> EngineResult<CallRecorder> {
        self.check_open()?;
        let recorder = CallRecorder::new();
        self.recorders.push(recorder.clone());
        Ok(recorder)
    }

    /// Run one suite subtree; returns whether every selected case passed
    /// in every repetition
    pub fn run_suite(&mut self, suite: SuiteId) -> EngineResult<bool> {
        let index = self.registry.resolve(suite)?;
        self.check_open()?;
        Ok(self.execute(&[index]) == 0)
    }

    /// Run every root suite in registration order; returns the exit code
    pub fn run_all(&mut self) -> EngineResult<i32> {
        self.check_open()?;
        let roots = self.registry.roots().to_vec();
        Ok(self.execute(&roots))
    }

    /// Full names of the cases the configured filters select, in
    /// execution order. Nothing is run.
    pub fn selected_cases(&self) -> EngineResult<Vec<String>> {
        self.check_open()?;
        let runner = SuiteRunner::new(&self.registry, &self.filter, None);
        Ok(runner.plan(self.registry.roots()))
    }

    fn execute(&mut self, suites: &[usize]) -> i32 {
        self.frozen = true;
        self.reports.clear();
        self.listing = None;

        if self.config.dry_run {
            let names = SuiteRunner::new(&self.registry, &self.filter, None).plan(suites);
            tracing::info!(cases = names.len(), "dry run, no case executed");
            self.listing = Some(names);
            self.exit_code = 0;
            return 0;
        }

        let repeat = self.config.repeat.max(1);
        tracing::debug!(
            suites = self.registry.suite_count(),
            cases = self.registry.case_count(),
            repeat,
            "run started"
        );
        for iteration in 1..=repeat {
            let report = SuiteRunner::new(&self.registry, &self.filter, self.timer.as_deref_mut())
                .run(suites);
            tracing::debug!(iteration, exit_code = report.exit_code(), "iteration finished");
            self.reports.push(report);
        }

        self.has_run = true;
        self.exit_code = self
            .reports
            .iter()
            .map(RunReport::exit_code)
            .max()
            .unwrap_or(0);
        self.exit_code
    }

    /// Render the latest run in the configured format
    pub fn summary(&self) -> EngineResult<String> {
        let reporter = Reporter::from_config(&self.config);
        if let Some(listing) = &self.listing {
            return match self.config.format {
                OutputFormat::Text => Ok(reporter.render_listing(listing)),
                OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                    "dry_run": true,
                    "cases": listing,
                }))?),
            };
        }

        if self.reports.is_empty() {
            return Err(EngineError::NotRun);
        }
        match self.config.format {
            OutputFormat::Text => Ok(reporter.report_runs(&self.reports)),
            OutputFormat::Json => Ok(reporter.render_json_runs(&self.reports)?),
        }
    }

    /// Write [`Engine::summary`] to stdout
    pub fn print_summary(&self) -> EngineResult<()> {
        let summary = self.summary()?;
        print!("{}", summary);
        if !summary.ends_with('\n') {
            println!();
        }
        Ok(())
    }

    /// Structured result of the latest run; its last repetition when repeated
    pub fn report(&self) -> Option<&RunReport> {
        self.reports.last()
    }

    /// Every repetition of the latest run, in order
    pub fn reports(&self) -> &[RunReport] {
        &self.reports
    }

    /// Case names recorded by the latest dry run
    pub fn listing(&self) -> Option<&[String]> {
        self.listing.as_deref()
    }

    /// Exit code of the latest run, 0 before any run. Repeated runs report
    /// their worst repetition.
    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// [`Engine::exit_code`] as a value `main` can return
    pub fn process_exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_code.clamp(0, 255) as u8)
    }

    /// Whether any case bodies have been executed; dry runs do not count
    pub fn has_run(&self) -> bool {
        self.has_run
    }

    /// The resolved configuration this engine runs with
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Release every suite, case and engine-issued recorder and return the
    /// final exit code. Calling it again returns the same code.
    pub fn end(&mut self) -> i32 {
        if self.ended {
            return self.exit_code;
        }

        let leaked = self
            .recorders
            .drain(..)
            .filter(|recorder| recorder.destroy().is_ok())
            .count();
        if leaked > 0 {
            tracing::warn!(count = leaked, "call recorders were not destroyed before end");
        }

        self.registry.release();
        self.ended = true;
        tracing::debug!(exit_code = self.exit_code, "engine ended");
        self.exit_code
    }

    fn check_open(&self) -> EngineResult<()> {
        if self.ended {
            Err(EngineError::Ended)
        } else {
            Ok(())
        }
    }

    fn check_mutable(&self, action: &'static str) -> EngineResult<()> {
        self.check_open()?;
        if self.frozen {
            return Err(EngineError::Immutable { action });
        }
        Ok(())
    }
}
