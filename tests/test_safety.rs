use testrun::safety;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn backup_path_format() {
    let path = safety::backup_path(Path::new("/tmp/doctores.test.js"));
    assert_eq!(path, Path::new("/tmp/.doctores.test.js.testrun.bak"));
}

#[test]
fn backup_path_nested() {
    let path = safety::backup_path(Path::new("/srv/api/test/pacientes.test.js"));
    assert_eq!(path, Path::new("/srv/api/test/.pacientes.test.js.testrun.bak"));
}

#[test]
fn check_interrupted_run_returns_none_when_clean() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("a.test.js");
    std::fs::write(&file, "test()").unwrap();
    assert!(safety::check_interrupted_run(&file).is_none());
}

#[test]
fn write_and_discard_backup() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("a.test.js");
    std::fs::write(&file, "mutated").unwrap();

    safety::write_backup(&file, "original").unwrap();
    let bak = safety::check_interrupted_run(&file).unwrap();
    assert_eq!(std::fs::read_to_string(&bak).unwrap(), "original");

    safety::discard_backup(&file).unwrap();
    assert!(safety::check_interrupted_run(&file).is_none());
    // Discarding twice is fine.
    safety::discard_backup(&file).unwrap();
}

#[test]
fn restore_from_backup_restores_and_cleans() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("a.test.js");
    let backup = dir.path().join(".a.test.js.testrun.bak");
    std::fs::write(&file, "mutated").unwrap();
    std::fs::write(&backup, "original").unwrap();

    safety::restore_from_backup(&file, &backup).unwrap();
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "original");
    assert!(!backup.exists());
}

#[test]
fn recover_interrupted_only_touches_files_with_backups() {
    let dir = TempDir::new().unwrap();
    let dirty = dir.path().join("dirty.test.js");
    let clean = dir.path().join("clean.test.js");
    std::fs::write(&dirty, "mutated").unwrap();
    std::fs::write(&clean, "untouched").unwrap();
    safety::write_backup(&dirty, "original").unwrap();

    let (restored, issues) = safety::recover_interrupted(&[dirty.clone(), clean.clone()]);
    assert!(issues.is_empty());
    assert_eq!(restored, vec![dirty.clone()]);
    assert_eq!(std::fs::read_to_string(&dirty).unwrap(), "original");
    assert_eq!(std::fs::read_to_string(&clean).unwrap(), "untouched");
}
