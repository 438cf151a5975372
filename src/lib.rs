pub mod config;
pub mod error;
pub mod mutants;
pub mod orchestrator;
pub mod output;
pub mod parse;
pub mod patch;
pub mod runner;
pub mod safety;
pub mod state;

pub use config::Config;
pub use error::{FileIssue, Result, RunError, Stage};
pub use orchestrator::{Orchestrator, RunReport};
pub use state::{LogEntry, LogStore, RunResult};
