use testrun::parse::{self, TestCounts};
use testrun::state::RunResult;

const JEST_FAILING: &str = "\
FAIL test/doctores.test.js
  ● Doctors API › POST /api/doctores - should create a new doctor

Test Suites: 1 failed, 4 passed, 5 total
Tests:       1 failed, 35 passed, 36 total
Snapshots:   0 total
Time:        3.2 s
";

// --- parse_output ---

#[test]
fn counts_from_tests_line() {
    let counts = parse::parse_output("Tests:       36 passed, 36 total\n");
    assert_eq!(counts.passed, 36);
    assert_eq!(counts.failed, 0);
    assert_eq!(counts.total(), 36);
    assert!(counts.tests_passed());
}

#[test]
fn first_passed_occurrence_wins() {
    // The suites line comes first in Jest output, so its count is the one picked up.
    let counts = parse::parse_output(JEST_FAILING);
    assert_eq!(counts.passed, 4);
    assert_eq!(counts.failed, 1);
    assert_eq!(counts.suites, 4);
    assert!(!counts.tests_passed());
}

#[test]
fn suites_count_needs_suites_prefix() {
    let counts = parse::parse_output("Tests: 12 passed, 12 total");
    assert_eq!(counts.suites, 0);
}

#[test]
fn suites_pattern_stays_on_one_line() {
    let counts = parse::parse_output("Test Suites: 2 total\nTests: 9 passed, 9 total");
    assert_eq!(counts.suites, 0);
    assert_eq!(counts.passed, 9);
}

#[test]
fn unparseable_output_defaults_to_zero_and_passing() {
    let counts = parse::parse_output("npm ERR! missing script: test");
    assert_eq!(counts, TestCounts::default());
    assert_eq!(counts.total(), 0);
    assert_eq!(counts.total_or(36), 36);
    assert!(counts.tests_passed(), "failed == 0 reads as passing even with no counts");
}

#[test]
fn whitespace_between_count_and_word_may_include_newline() {
    let counts = parse::parse_output("7\npassed");
    assert_eq!(counts.passed, 7);
}

#[test]
fn non_ascii_digits_are_not_counts() {
    let counts = parse::parse_output("renders \u{663} passed rows\nTests: 1 failed, 5 passed");
    assert_eq!(counts.passed, 5);
    assert_eq!(counts.failed, 1);
}

#[test]
fn huge_counts_do_not_overflow_total() {
    let counts = parse::parse_output("18446744073709551615 passed, 1 failed");
    assert_eq!(counts.passed, u64::MAX);
    assert_eq!(counts.failed, 1);
    assert_eq!(counts.total(), u64::MAX);
    assert_eq!(counts.total_or(36), u64::MAX);
}

#[test]
fn total_or_keeps_real_total() {
    let counts = TestCounts { passed: 3, failed: 2, suites: 1 };
    assert_eq!(counts.total_or(36), 5);
}

// --- structured results ---

#[test]
fn jest_json_summary_is_read() {
    let json = r#"{"numPassedTests": 30, "numFailedTests": 6, "numPassedTestSuites": 3, "numTotalTests": 36}"#;
    let counts = parse::parse_jest_json(json).unwrap();
    assert_eq!(counts, TestCounts { passed: 30, failed: 6, suites: 3 });
}

#[test]
fn jest_json_rejects_other_documents() {
    assert!(parse::parse_jest_json("Tests: 3 passed").is_none());
    assert!(parse::parse_jest_json(r#"{"passed": 3}"#).is_none());
}

#[test]
fn parse_run_prefers_results_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let results = dir.path().join("results.json");
    std::fs::write(&results, r#"{"numPassedTests": 35, "numFailedTests": 1, "numPassedTestSuites": 4}"#)
        .unwrap();

    let counts = parse::parse_run(JEST_FAILING, Some(&results));
    assert_eq!(counts.passed, 35);
    assert_eq!(counts.failed, 1);
}

#[test]
fn parse_run_falls_back_to_text() {
    let dir = tempfile::TempDir::new().unwrap();
    let missing = dir.path().join("results.json");
    let counts = parse::parse_run("Tests: 2 failed, 34 passed, 36 total", Some(&missing));
    assert_eq!(counts.failed, 2);
    assert_eq!(counts.passed, 34);

    let garbage = dir.path().join("garbage.json");
    std::fs::write(&garbage, "not json").unwrap();
    let counts = parse::parse_run("Tests: 5 passed", Some(&garbage));
    assert_eq!(counts.passed, 5);
}

// --- RunResult projection ---

#[test]
fn run_result_falls_back_to_expected_total() {
    let result = RunResult::from_counts(&TestCounts::default(), "", 36);
    assert!(result.success);
    assert!(result.tests_passed);
    assert_eq!(result.total_tests, 36);
    assert_eq!(result.passed, 0);
    assert_eq!(result.failed, 0);
    assert_eq!(result.output, "No output received");
    assert!(result.error.is_none());
}

#[test]
fn run_result_serializes_camel_case() {
    let counts = parse::parse_output("Tests: 1 failed, 35 passed, 36 total");
    let result = RunResult::from_counts(&counts, "Tests: 1 failed, 35 passed, 36 total", 36);
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["testsPassed"], false);
    assert_eq!(value["totalTests"], 36);
    assert_eq!(value["failed"], 1);
    assert!(value["error"].is_null());
}
