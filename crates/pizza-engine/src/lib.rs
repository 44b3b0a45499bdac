//! Pizza Engine - test-suite execution runtime
//!
//! This library provides:
//! - Hierarchical suites of named cases, run in registration order
//! - Failure containment: assertion failures, faults and panics stay inside their case
//! - Deterministic summaries (text or JSON) and a process exit code
//! - Mock call recording for interaction checks
//! - Timing and OS collaborators for case bodies

/// Pizza engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod args;
pub mod case;
pub mod engine;
pub mod error;
pub mod logging;
pub mod mock;
pub mod report;
pub mod reporter;
pub mod sanity;
pub mod suite;
pub mod timing;

mod filter;
mod registry;
mod runner;

// Re-export commonly used types
pub use args::RunArgs;
pub use case::{ensure, ensure_eq, CaseError, CaseResult, CaseStatus, TestCase};
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use mock::{capture_output, compare_output, ArgType, CallRecord, CallRecorder, MockArg, MockError};
pub use registry::{CaseId, SuiteId};
pub use report::{CaseRecord, RunReport, Score, SuiteReport, TimingSummary};
pub use reporter::Reporter;
pub use sanity::{Sanity, SanityError, SystemSanity};
pub use suite::TestSuite;
pub use timing::{Benchmark, ScopedTimer, Timer};
