use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, SecondsFormat, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, RunError};
use crate::parse::TestCounts;

pub const LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub success: bool,
    pub tests_passed: bool,
    pub total_tests: u64,
    pub passed: u64,
    pub failed: u64,
    pub suites: u64,
    pub output: String,
    pub error: Option<String>,
}

impl RunResult {
    pub fn from_counts(counts: &TestCounts, output: &str, expected_total: u64) -> Self {
        RunResult {
            success: true,
            tests_passed: counts.tests_passed(),
            total_tests: counts.total_or(expected_total),
            passed: counts.passed,
            failed: counts.failed,
            suites: counts.suites,
            output: if output.is_empty() {
                "No output received".to_string()
            } else {
                output.to_string()
            },
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: String,
    pub date: String,
    pub passed: u64,
    pub failed: u64,
    pub total: u64,
    #[serde(default)]
    pub failed_tests: Vec<String>,
    #[serde(default)]
    pub output: String,
}

impl LogEntry {
    /// Stamp a run outcome with the current time.
    pub fn new(counts: &TestCounts, failed_tests: &[String], output: &str) -> Self {
        LogEntry {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            date: Local::now().format("%-d/%-m/%Y, %-H:%M:%S").to_string(),
            passed: counts.passed,
            failed: counts.failed,
            total: counts.total(),
            failed_tests: failed_tests.to_vec(),
            output: output.to_string(),
        }
    }
}

/// Newest-first JSON array of run records, capped at [`LOG_CAPACITY`].
#[derive(Debug, Clone)]
pub struct LogStore {
    path: PathBuf,
    capacity: usize,
}

impl LogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LogStore {
            path: path.into(),
            capacity: LOG_CAPACITY,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries, or an empty list if the store has never been written.
    pub fn read_all(&self) -> Result<Vec<LogEntry>> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RunError::io(&self.path, e)),
        };
        serde_json::from_str(&data).map_err(|source| RunError::CorruptLog {
            path: self.path.clone(),
            source,
        })
    }

    /// Put `entry` at the front, keep the newest entries, rewrite the file.
    ///
    /// A corrupt store is left untouched and reported as `CorruptLog`.
    pub fn append(&self, entry: LogEntry) -> Result<()> {
        let dir = self.dir();
        std::fs::create_dir_all(&dir).map_err(|e| RunError::io(&dir, e))?;

        let lock_path = self.lock_path();
        let lock = File::create(&lock_path).map_err(|e| RunError::io(&lock_path, e))?;
        lock.lock_exclusive().map_err(|e| RunError::io(&lock_path, e))?;

        let mut logs = self.read_all()?;
        logs.insert(0, entry);
        logs.truncate(self.capacity);

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| RunError::io(&dir, e))?;
        serde_json::to_writer_pretty(&mut tmp, &logs)
            .map_err(|e| RunError::io(tmp.path(), e.into()))?;
        tmp.flush().map_err(|e| RunError::io(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| RunError::io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| RunError::io(&self.path, e.error))?;

        let _ = lock.unlock();
        debug!(file = %self.path.display(), entries = logs.len(), "saved test log");
        Ok(())
    }

    fn dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        self.path.with_file_name(name)
    }
}
