//! Recover pass/fail counts from a test run.
//!
//! Jest's JSON report is preferred when one was written; the text patterns
//! below are the fallback for everything else.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ASCII digits only: a count is never written in another script.
static PASSED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([0-9]+)\s+passed").unwrap());
static FAILED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([0-9]+)\s+failed").unwrap());
static SUITES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Test Suites:.*?([0-9]+)\s+passed").unwrap());

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TestCounts {
    pub passed: u64,
    pub failed: u64,
    pub suites: u64,
}

impl TestCounts {
    pub fn total(&self) -> u64 {
        self.passed.saturating_add(self.failed)
    }

    /// True when nothing failed, which includes output the parser could not read at all.
    pub fn tests_passed(&self) -> bool {
        self.failed == 0
    }

    /// `total`, or `baseline` when no counts were found.
    pub fn total_or(&self, baseline: u64) -> u64 {
        match self.total() {
            0 => baseline,
            n => n,
        }
    }
}

fn first_count(re: &Regex, text: &str) -> u64 {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Pattern-match counts out of free-form runner output. Missing matches count as 0.
pub fn parse_output(text: &str) -> TestCounts {
    TestCounts {
        passed: first_count(&PASSED_RE, text),
        failed: first_count(&FAILED_RE, text),
        suites: first_count(&SUITES_RE, text),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JestSummary {
    num_passed_tests: u64,
    num_failed_tests: u64,
    #[serde(default)]
    num_passed_test_suites: u64,
}

/// Counts from a Jest `--json` report, if `text` is one.
pub fn parse_jest_json(text: &str) -> Option<TestCounts> {
    let summary: JestSummary = serde_json::from_str(text).ok()?;
    Some(TestCounts {
        passed: summary.num_passed_tests,
        failed: summary.num_failed_tests,
        suites: summary.num_passed_test_suites,
    })
}

pub fn read_results_file(path: &Path) -> Option<TestCounts> {
    let data = std::fs::read_to_string(path).ok()?;
    let counts = parse_jest_json(&data);
    if counts.is_none() {
        debug!(file = %path.display(), "results file is not a Jest JSON report");
    }
    counts
}

/// Structured report first, text patterns as the fallback.
pub fn parse_run(output: &str, results_file: Option<&Path>) -> TestCounts {
    results_file
        .and_then(read_results_file)
        .unwrap_or_else(|| parse_output(output))
}
