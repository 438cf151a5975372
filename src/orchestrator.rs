use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{FileIssue, Result, Stage};
use crate::mutants::MutationTable;
use crate::parse;
use crate::patch::{self, AppliedMutation};
use crate::runner;
use crate::safety;
use crate::state::{LogEntry, LogStore, RunResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Mutating,
    Executing,
    Restoring,
    Parsing,
    Logged,
    Done,
    Failed,
}

/// Outcome of one run, plus everything that went wrong without stopping it.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub result: RunResult,
    pub applied: Vec<AppliedMutation>,
    pub issues: Vec<FileIssue>,
    /// Requested keys with no entry in the mutation table.
    pub unknown_keys: Vec<String>,
    /// Files put back from backups left by an earlier interrupted run.
    pub recovered: Vec<PathBuf>,
}

impl RunReport {
    /// No swallowed mutation, restoration or logging error.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has_restore_failures(&self) -> bool {
        self.issues.iter().any(|i| i.stage == Stage::Restore)
    }
}

pub struct Orchestrator {
    config: Config,
    table: MutationTable,
    store: LogStore,
    // Held from mutation through logging; runs never overlap on the same files.
    run_lock: Mutex<()>,
}

impl Orchestrator {
    /// Uses `config.table_file` when set, the built-in table otherwise.
    pub fn new(config: Config) -> Result<Self> {
        let table = match &config.table_file {
            Some(path) => MutationTable::from_json_file(path)?,
            None => MutationTable::builtin(),
        };
        Ok(Orchestrator::with_table(config, table))
    }

    pub fn with_table(config: Config, table: MutationTable) -> Self {
        let store = LogStore::new(&config.log_file);
        Orchestrator {
            config,
            table,
            store,
            run_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn table(&self) -> &MutationTable {
        &self.table
    }

    pub fn store(&self) -> &LogStore {
        &self.store
    }

    /// Run the suite with the assertions named by `fail_keys` flipped.
    ///
    /// Every mutated file is restored before this returns, on success,
    /// on a launch failure or timeout, and while unwinding from a panic.
    pub fn run_tests(&self, fail_keys: &[String]) -> Result<RunReport> {
        let _guard = self.run_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut phase = Phase::Idle;
        let root = self.config.root();

        let (recovered, mut issues) = safety::recover_interrupted(&self.table.target_files(root));
        self.clear_results_file(&mut issues);

        let unknown_keys: Vec<String> = fail_keys
            .iter()
            .filter(|k| !self.table.contains(k.as_str()))
            .cloned()
            .collect();
        if !unknown_keys.is_empty() {
            warn!(keys = ?unknown_keys, "ignoring unknown test keys");
        }

        advance(&mut phase, Phase::Mutating);
        let mut patches = patch::apply_mutations(&self.table, root, fail_keys);
        issues.extend(patches.take_issues());
        info!(
            requested = fail_keys.len(),
            files = patches.modified().len(),
            "applied test mutations"
        );

        advance(&mut phase, Phase::Executing);
        let executed = runner::run_test_command(&self.config.test_cmd, root, self.config.timeout);

        advance(&mut phase, Phase::Restoring);
        let (applied, restore_issues) = patches.restore();
        issues.extend(restore_issues);

        let captured = match executed {
            Ok(c) => c,
            Err(e) => {
                advance(&mut phase, Phase::Failed);
                return Err(e);
            }
        };

        advance(&mut phase, Phase::Parsing);
        let output = captured.combined();
        let counts = parse::parse_run(&output, self.config.results_file.as_deref());
        let result = RunResult::from_counts(&counts, &output, self.config.expected_total);

        if let Err(e) = self.store.append(LogEntry::new(&counts, fail_keys, &output)) {
            warn!(error = %e, "error saving test log");
            issues.push(FileIssue::new(self.store.path(), Stage::Log, e));
        }
        advance(&mut phase, Phase::Logged);

        info!(
            passed = result.passed,
            failed = result.failed,
            total = result.total_tests,
            "test run finished"
        );
        advance(&mut phase, Phase::Done);

        Ok(RunReport {
            result,
            applied,
            issues,
            unknown_keys,
            recovered,
        })
    }

    /// The persisted run history, newest first.
    pub fn get_test_logs(&self) -> Result<Vec<LogEntry>> {
        self.store.read_all()
    }

    /// Put back any test file left mutated by an interrupted run.
    pub fn recover(&self) -> (Vec<PathBuf>, Vec<FileIssue>) {
        let _guard = self.run_lock.lock().unwrap_or_else(PoisonError::into_inner);
        safety::recover_interrupted(&self.table.target_files(self.config.root()))
    }

    fn clear_results_file(&self, issues: &mut Vec<FileIssue>) {
        let Some(path) = &self.config.results_file else {
            return;
        };
        match std::fs::remove_file(path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                warn!(file = %path.display(), error = %e, "could not remove stale results file");
                issues.push(FileIssue::new(path, Stage::Mutate, e));
            }
            _ => {}
        }
    }
}

fn advance(phase: &mut Phase, next: Phase) {
    debug!(from = ?*phase, to = ?next, "run phase");
    *phase = next;
}
