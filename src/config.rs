use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TEST_CMD: &str = "npm test";
pub const DEFAULT_LOG_FILE: &str = "test-logs.json";
/// Size of the full suite, reported when the output yields no counts.
pub const DEFAULT_EXPECTED_TOTAL: u64 = 36;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory of the test command; relative table paths resolve against it.
    pub project_root: PathBuf,
    pub test_cmd: String,
    /// `None` waits for the test command indefinitely.
    pub timeout: Option<Duration>,
    pub log_file: PathBuf,
    pub expected_total: u64,
    /// Jest `--json --outputFile` target, read in preference to the text output.
    pub results_file: Option<PathBuf>,
    /// JSON mutation table replacing the built-in one.
    pub table_file: Option<PathBuf>,
}

impl Config {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        Config {
            log_file: project_root.join(DEFAULT_LOG_FILE),
            project_root,
            test_cmd: DEFAULT_TEST_CMD.to_string(),
            timeout: Some(DEFAULT_TIMEOUT),
            expected_total: DEFAULT_EXPECTED_TOTAL,
            results_file: None,
            table_file: None,
        }
    }

    pub fn with_test_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.test_cmd = cmd.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = self.resolve(path.into());
        self
    }

    pub fn with_results_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.results_file = Some(self.resolve(path.into()));
        self
    }

    pub fn with_table_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.table_file = Some(self.resolve(path.into()));
        self
    }

    pub fn with_expected_total(mut self, total: u64) -> Self {
        self.expected_total = total;
        self
    }

    fn resolve(&self, path: PathBuf) -> PathBuf {
        if path.is_absolute() {
            path
        } else {
            self.project_root.join(path)
        }
    }

    pub fn root(&self) -> &Path {
        &self.project_root
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}
