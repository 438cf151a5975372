use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` timed out after {after:?}")]
    Timeout { command: String, after: Duration },

    #[error("Error reading test logs from {}: {source}", .path.display())]
    CorruptLog {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid mutation table {}: {reason}", .path.display())]
    InvalidTable { path: PathBuf, reason: String },

    #[error("Test command is empty")]
    EmptyCommand,
}

impl RunError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RunError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, RunError>;

/// Where in a run a swallowed error happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Mutate,
    Restore,
    Log,
}

/// A non-fatal error that was contained during a run and reported next to the result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileIssue {
    pub path: PathBuf,
    pub stage: Stage,
    pub message: String,
}

impl FileIssue {
    pub fn new(path: impl Into<PathBuf>, stage: Stage, message: impl ToString) -> Self {
        FileIssue {
            path: path.into(),
            stage,
            message: message.to_string(),
        }
    }
}
