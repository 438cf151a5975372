use std::path::Path;

use testrun::RunError;
use testrun::mutants::{MutationTable, TestMutation};

#[test]
fn builtin_table_has_known_keys() {
    let table = MutationTable::builtin();
    let keys: Vec<_> = table.iter().map(|m| m.key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "doctors-create",
            "doctors-update",
            "doctors-delete",
            "patients-create",
            "medicines-create",
            "specialties-duplicate",
        ]
    );
}

#[test]
fn doctors_create_flips_201_to_500() {
    let table = MutationTable::builtin();
    let m = table.get("doctors-create").unwrap();
    assert_eq!(m.file.as_str(), "test/doctores.test.js");
    assert_eq!(m.find, "expect(response.status).toBe(201);");
    assert_eq!(m.replace, "expect(response.status).toBe(500); // MODIFIED TO FAIL");
}

#[test]
fn unknown_key_is_absent() {
    let table = MutationTable::builtin();
    assert!(table.get("billing-create").is_none());
    assert!(!table.contains("billing-create"));
}

#[test]
fn target_files_are_deduplicated() {
    let table = MutationTable::builtin();
    let files = table.target_files(Path::new("/srv/api"));
    assert_eq!(files.len(), 4);
    assert_eq!(files[0], Path::new("/srv/api/test/doctores.test.js"));
}

#[test]
fn absolute_file_ignores_root() {
    let m = TestMutation::new("k", "/abs/file.js", "a", "b");
    assert_eq!(m.resolve(Path::new("/srv/api")), Path::new("/abs/file.js"));
}

#[test]
fn new_rejects_duplicate_keys() {
    let err = MutationTable::new(vec![
        TestMutation::new("dup", "a.js", "x", "y"),
        TestMutation::new("dup", "b.js", "x", "y"),
    ])
    .unwrap_err();
    assert!(err.contains("duplicate"), "{err}");
}

#[test]
fn new_rejects_empty_find() {
    let err = MutationTable::new(vec![TestMutation::new("k", "a.js", "", "y")]).unwrap_err();
    assert!(err.contains("empty find"), "{err}");
}

#[test]
fn loads_table_from_json() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("table.json");
    std::fs::write(
        &path,
        r#"[{"key": "billing-create", "file": "test/billing.test.js", "find": "toBe(201)", "replace": "toBe(500)"}]"#,
    )
    .unwrap();

    let table = MutationTable::from_json_file(&path).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.get("billing-create").unwrap().replace, "toBe(500)");
}

#[test]
fn malformed_table_is_invalid() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("table.json");
    std::fs::write(&path, r#"{"key": "not-an-array"}"#).unwrap();
    assert!(matches!(
        MutationTable::from_json_file(&path),
        Err(RunError::InvalidTable { .. })
    ));
}

#[test]
fn missing_table_is_io_error() {
    let dir = tempfile::TempDir::new().unwrap();
    assert!(matches!(
        MutationTable::from_json_file(&dir.path().join("nope.json")),
        Err(RunError::Io { .. })
    ));
}
