use std::collections::HashSet;
use std::path::{Path, PathBuf};

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RunError};

/// A literal find/replace edit that flips one assertion in a test file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestMutation {
    pub key: String,
    /// Target file, relative to the project root unless absolute.
    pub file: Utf8PathBuf,
    pub find: String,
    pub replace: String,
}

impl TestMutation {
    pub fn new(key: &str, file: &str, find: &str, replace: &str) -> Self {
        TestMutation {
            key: key.to_string(),
            file: Utf8PathBuf::from(file),
            find: find.to_string(),
            replace: replace.to_string(),
        }
    }

    pub fn resolve(&self, project_root: &Path) -> PathBuf {
        project_root.join(self.file.as_std_path())
    }
}

#[derive(Debug, Clone)]
pub struct MutationTable {
    mutations: Vec<TestMutation>,
}

impl MutationTable {
    /// Validates keys are unique and no `find` string is empty.
    pub fn new(mutations: Vec<TestMutation>) -> std::result::Result<Self, String> {
        let mut seen = HashSet::new();
        for m in &mutations {
            if !seen.insert(m.key.as_str()) {
                return Err(format!("duplicate key '{}'", m.key));
            }
            if m.find.is_empty() {
                return Err(format!("key '{}' has an empty find string", m.key));
            }
        }
        Ok(MutationTable { mutations })
    }

    /// The hospital API suite: each entry flips the expected status code of one assertion.
    pub fn builtin() -> Self {
        MutationTable {
            mutations: vec![
                TestMutation::new(
                    "doctors-create",
                    "test/doctores.test.js",
                    "expect(response.status).toBe(201);",
                    "expect(response.status).toBe(500); // MODIFIED TO FAIL",
                ),
                TestMutation::new(
                    "doctors-update",
                    "test/doctores.test.js",
                    "expect(response.status).toBe(200);\n    expect(response.body.name).toBe('Dr. Juan Actualizado');",
                    "expect(response.status).toBe(404); // MODIFIED TO FAIL\n    expect(response.body.name).toBe('Dr. Juan Actualizado');",
                ),
                TestMutation::new(
                    "doctors-delete",
                    "test/doctores.test.js",
                    "const deleteResponse = await request(app).delete(`/api/doctores/${doctorId}`);\n    expect(deleteResponse.status).toBe(200);",
                    "const deleteResponse = await request(app).delete(`/api/doctores/${doctorId}`);\n    expect(deleteResponse.status).toBe(404); // MODIFIED TO FAIL",
                ),
                TestMutation::new(
                    "patients-create",
                    "test/pacientes.test.js",
                    "expect(response.status).toBe(201);",
                    "expect(response.status).toBe(500); // MODIFIED TO FAIL",
                ),
                TestMutation::new(
                    "medicines-create",
                    "test/medicamentos.test.js",
                    "expect(response.status).toBe(201);",
                    "expect(response.status).toBe(500); // MODIFIED TO FAIL",
                ),
                TestMutation::new(
                    "specialties-duplicate",
                    "test/especialidades.test.js",
                    "expect(response2.status).toBe(409);",
                    "expect(response2.status).toBe(201); // MODIFIED TO FAIL",
                ),
            ],
        }
    }

    /// Load a table from a JSON array of `{key, file, find, replace}` objects.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| RunError::io(path, e))?;
        let mutations: Vec<TestMutation> =
            serde_json::from_str(&data).map_err(|e| RunError::InvalidTable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        MutationTable::new(mutations).map_err(|reason| RunError::InvalidTable {
            path: path.to_path_buf(),
            reason,
        })
    }

    pub fn get(&self, key: &str) -> Option<&TestMutation> {
        self.mutations.iter().find(|m| m.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TestMutation> {
        self.mutations.iter()
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Every distinct target file, resolved against `project_root`, in table order.
    pub fn target_files(&self, project_root: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = Vec::new();
        for m in &self.mutations {
            let path = m.resolve(project_root);
            if !files.contains(&path) {
                files.push(path);
            }
        }
        files
    }
}

impl Default for MutationTable {
    fn default() -> Self {
        MutationTable::builtin()
    }
}
