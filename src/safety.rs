use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{FileIssue, Stage};

pub fn backup_path(test_file: &Path) -> PathBuf {
    let mut backup = test_file.to_path_buf();
    let name = format!(
        ".{}.testrun.bak",
        test_file.file_name().unwrap_or_default().to_string_lossy()
    );
    backup.set_file_name(name);
    backup
}

/// Persist the pre-mutation content so an interrupted run can be undone later.
pub fn write_backup(test_file: &Path, original: &str) -> std::io::Result<()> {
    std::fs::write(backup_path(test_file), original)
}

pub fn discard_backup(test_file: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(backup_path(test_file)) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Check if a backup file exists from a previous interrupted run.
pub fn check_interrupted_run(test_file: &Path) -> Option<PathBuf> {
    let bak = backup_path(test_file);
    if bak.exists() { Some(bak) } else { None }
}

pub fn restore_from_backup(test_file: &Path, backup_file: &Path) -> std::io::Result<()> {
    std::fs::copy(backup_file, test_file)?;
    std::fs::remove_file(backup_file)?;
    Ok(())
}

/// Restore every file that still has a backup next to it.
///
/// Returns the files that were put back; failures are logged and collected.
pub fn recover_interrupted(files: &[PathBuf]) -> (Vec<PathBuf>, Vec<FileIssue>) {
    let mut restored = Vec::new();
    let mut issues = Vec::new();
    for file in files {
        let Some(bak) = check_interrupted_run(file) else {
            continue;
        };
        match restore_from_backup(file, &bak) {
            Ok(()) => {
                info!(file = %file.display(), "recovered test file from an interrupted run");
                restored.push(file.clone());
            }
            Err(e) => {
                warn!(file = %file.display(), error = %e, "failed to recover test file");
                issues.push(FileIssue::new(file, Stage::Restore, e));
            }
        }
    }
    (restored, issues)
}
