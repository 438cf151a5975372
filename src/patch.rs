use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::{FileIssue, Stage};
use crate::mutants::MutationTable;
use crate::safety;

/// A test file that was rewritten during the current run.
#[derive(Debug)]
pub struct ModifiedFile {
    pub path: PathBuf,
    /// Content before the first mutation of this run; restoration is a plain overwrite.
    pub original: String,
    pub keys: Vec<String>,
    pub diff: String,
}

/// What a run changed, kept for reporting after the originals are written back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedMutation {
    pub path: PathBuf,
    pub keys: Vec<String>,
    pub diff: String,
}

/// Replace the first occurrence of `find`. `None` when nothing would change.
pub fn apply_literal(source: &str, find: &str, replace: &str) -> Option<String> {
    if find.is_empty() || !source.contains(find) {
        return None;
    }
    let mutated = source.replacen(find, replace, 1);
    if mutated == source { None } else { Some(mutated) }
}

pub fn generate_diff(original: &str, mutated: &str) -> String {
    use similar::TextDiff;
    let diff = TextDiff::from_lines(original, mutated);
    let mut output = String::new();
    for change in diff.iter_all_changes() {
        match change.tag() {
            similar::ChangeTag::Delete => {
                output.push_str(&format!("- {}", change));
            }
            similar::ChangeTag::Insert => {
                output.push_str(&format!("+ {}", change));
            }
            _ => {}
        }
    }
    output
}

/// Replace `path` with `contents` through a sibling temp file and a rename.
///
/// Either the old or the new content is on disk afterwards, never a
/// truncated mix. The file keeps its permissions.
pub fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let name = path.file_name().unwrap_or_default().to_string_lossy();
    let mut tmp = tempfile::Builder::new()
        .prefix(&format!(".{}.", name))
        .suffix(".testrun.tmp")
        .tempfile_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;
    if let Ok(meta) = std::fs::metadata(path) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// The set of files mutated by one run.
///
/// Dropping a `PatchSet` without calling [`PatchSet::restore`] still writes every
/// original back, so an early return or a panic cannot leave a test file mutated.
#[derive(Debug, Default)]
pub struct PatchSet {
    modified: Vec<ModifiedFile>,
    issues: Vec<FileIssue>,
}

impl PatchSet {
    pub fn modified(&self) -> &[ModifiedFile] {
        &self.modified
    }

    pub fn is_empty(&self) -> bool {
        self.modified.is_empty()
    }

    /// Errors swallowed while mutating.
    pub fn take_issues(&mut self) -> Vec<FileIssue> {
        std::mem::take(&mut self.issues)
    }

    /// Write every original back and drop the records.
    pub fn restore(mut self) -> (Vec<AppliedMutation>, Vec<FileIssue>) {
        let applied = self
            .modified
            .iter()
            .map(|m| AppliedMutation {
                path: m.path.clone(),
                keys: m.keys.clone(),
                diff: m.diff.clone(),
            })
            .collect();
        let issues = self.restore_all();
        (applied, issues)
    }

    fn restore_all(&mut self) -> Vec<FileIssue> {
        let mut issues = Vec::new();
        while let Some(file) = self.modified.pop() {
            match write_atomic(&file.path, &file.original) {
                Ok(()) => {
                    debug!(file = %file.path.display(), "restored test file");
                    if let Err(e) = safety::discard_backup(&file.path) {
                        warn!(file = %file.path.display(), error = %e, "failed to remove backup");
                    }
                }
                Err(e) => {
                    // The backup stays so `recover` can finish the job later.
                    error!(file = %file.path.display(), error = %e, "error restoring test file");
                    issues.push(FileIssue::new(&file.path, Stage::Restore, e));
                }
            }
        }
        issues
    }

    fn record(&mut self, path: &Path, key: &str, current: &str, mutated: &str) {
        match self.modified.iter_mut().find(|m| m.path == path) {
            Some(existing) => {
                existing.keys.push(key.to_string());
                existing.diff = generate_diff(&existing.original, mutated);
            }
            None => self.modified.push(ModifiedFile {
                path: path.to_path_buf(),
                original: current.to_string(),
                keys: vec![key.to_string()],
                diff: generate_diff(current, mutated),
            }),
        }
    }

    fn is_tracked(&self, path: &Path) -> bool {
        self.modified.iter().any(|m| m.path == path)
    }
}

impl Drop for PatchSet {
    fn drop(&mut self) {
        if !self.modified.is_empty() {
            warn!(count = self.modified.len(), "restoring test files outside the normal flow");
            self.restore_all();
        }
    }
}

/// Apply the mutation for each key in order.
///
/// Unknown keys and `find` misses are skipped. I/O errors are logged and
/// collected per file; they never abort the batch.
pub fn apply_mutations(table: &MutationTable, project_root: &Path, keys: &[String]) -> PatchSet {
    let mut set = PatchSet::default();

    for key in keys {
        let Some(mutation) = table.get(key) else {
            debug!(key = %key, "no mutation registered for key");
            continue;
        };
        let path = mutation.resolve(project_root);

        let current = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!(key = %key, file = %path.display(), error = %e, "error reading test file");
                set.issues.push(FileIssue::new(&path, Stage::Mutate, e));
                continue;
            }
        };

        let Some(mutated) = apply_literal(&current, &mutation.find, &mutation.replace) else {
            debug!(key = %key, file = %path.display(), "find string not present, skipping");
            continue;
        };

        let first_touch = !set.is_tracked(&path);
        if first_touch {
            if let Err(e) = safety::write_backup(&path, &current) {
                warn!(key = %key, file = %path.display(), error = %e, "error writing backup, skipping mutation");
                set.issues.push(FileIssue::new(&path, Stage::Mutate, e));
                continue;
            }
        }

        // A failed atomic write leaves `current` on disk untouched.
        if let Err(e) = write_atomic(&path, &mutated) {
            warn!(key = %key, file = %path.display(), error = %e, "error modifying test file");
            set.issues.push(FileIssue::new(&path, Stage::Mutate, e));
            if first_touch {
                if let Err(e) = safety::discard_backup(&path) {
                    warn!(file = %path.display(), error = %e, "failed to remove backup");
                }
            }
            continue;
        }

        debug!(key = %key, file = %path.display(), "mutated test file");
        set.record(&path, key, &current, &mutated);
    }

    set
}
