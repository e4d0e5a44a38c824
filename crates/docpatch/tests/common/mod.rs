#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

/// A container with no content: the `empty.odt` analogue.
pub fn empty_container() -> Value {
    json!({"version": 1, "content": ["body", null]})
}

pub fn write_container(dir: &Path, name: &str, container: &Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(container).unwrap()).unwrap();
    path
}

/// Scenario directory pair: fixture sources and harness output.
pub struct ScenarioDirs {
    pub root: tempfile::TempDir,
    pub fixtures: PathBuf,
    pub output: PathBuf,
}

pub fn scenario_dirs() -> ScenarioDirs {
    let root = tempfile::tempdir().unwrap();
    let fixtures = root.path().join("fixtures");
    let output = root.path().join("out");
    fs::create_dir(&fixtures).unwrap();
    fs::create_dir(&output).unwrap();
    ScenarioDirs {
        root,
        fixtures,
        output,
    }
}
