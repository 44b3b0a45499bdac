//! Reporter output snapshots
//!
//! Reports are built by hand so elapsed times are fixed.

use pizza_config::Verbosity;
use pizza_engine::{CaseRecord, CaseStatus, Reporter, RunReport, Score, SuiteReport, TimingSummary};

fn case(name: &str, status: CaseStatus, message: Option<&str>) -> CaseRecord {
    CaseRecord {
        name: name.to_string(),
        tags: Vec::new(),
        criteria: None,
        status,
        message: message.map(str::to_string),
        duration_ms: Some(0.1),
    }
}

fn math_run() -> RunReport {
    let rounding = SuiteReport {
        name: "Rounding".to_string(),
        path: "Math::Rounding".to_string(),
        cases: vec![case("floors", CaseStatus::Failed, Some("expected 2, got 3"))],
        suites: Vec::new(),
        score: Score {
            passed: 0,
            failed: 1,
            errored: 0,
            skipped: 0,
        },
        setup_error: None,
        teardown_error: None,
        elapsed_ms: 0.2,
    };

    let math = SuiteReport {
        name: "Math".to_string(),
        path: "Math".to_string(),
        cases: vec![
            case("adds", CaseStatus::Passed, None),
            case("divides", CaseStatus::Errored, Some("division by zero")),
        ],
        suites: vec![rounding],
        score: Score {
            passed: 1,
            failed: 1,
            errored: 1,
            skipped: 0,
        },
        setup_error: None,
        teardown_error: None,
        elapsed_ms: 0.9,
    };

    RunReport {
        started_at: "2024-05-01T12:00:00.000Z".to_string(),
        score: math.score,
        suites: vec![math],
        elapsed_ms: 1.5,
        timing: Some(TimingSummary {
            min_ms: 0.1,
            max_ms: 0.3,
            avg_ms: 0.2,
        }),
    }
}

#[test]
fn test_ci_report() {
    let text = Reporter::new(Verbosity::Ci).report(&math_run());
    insta::assert_snapshot!(text, @r"
    Math (1 passed, 1 failed, 1 errored)
      PASS adds
      ERROR divides: division by zero
      Rounding (0 passed, 1 failed, 0 errored)
        FAIL floors: expected 2, got 3
    ──────────────────────────────────────────────────
    Failures:
      ERROR Math::divides
          division by zero
      FAIL Math::Rounding::floors
          expected 2, got 3
    ──────────────────────────────────────────────────
    Test result: FAILED | 3 total, 1 passed, 1 failed, 1 errored
    Time: 1.500 ms
    Timing: min 0.100 ms, max 0.300 ms, avg 0.200 ms
    ");
}

#[test]
fn test_plain_report_of_passing_run() {
    let run = RunReport {
        started_at: "2024-05-01T12:00:00.000Z".to_string(),
        suites: vec![SuiteReport {
            name: "Strings".to_string(),
            path: "Strings".to_string(),
            cases: vec![case("splits", CaseStatus::Passed, None)],
            suites: Vec::new(),
            score: Score {
                passed: 1,
                failed: 0,
                errored: 0,
                skipped: 0,
            },
            setup_error: None,
            teardown_error: Some("temp dir already gone".to_string()),
            elapsed_ms: 0.4,
        }],
        score: Score {
            passed: 1,
            failed: 0,
            errored: 0,
            skipped: 0,
        },
        elapsed_ms: 0.4,
        timing: None,
    };

    let text = Reporter::new(Verbosity::Plain).report(&run);
    insta::assert_snapshot!(text, @r"
    Strings (1 passed, 0 failed, 0 errored)
      teardown failed: temp dir already gone
    ──────────────────────────────────────────────────
    Test result: PASSED | 1 total, 1 passed, 0 failed, 0 errored
    Time: 0.400 ms
    ");
}

#[test]
fn test_json_report() {
    let json = Reporter::default().render_json(&math_run()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    insta::assert_json_snapshot!(value["suites"][0]["suites"][0]["cases"][0], @r#"
    {
      "duration_ms": 0.1,
      "message": "expected 2, got 3",
      "name": "floors",
      "status": "failed"
    }
    "#);
}
