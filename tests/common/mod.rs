#![allow(dead_code)]

use assert_cmd::cargo;
use std::fs;
use std::path::Path;

pub fn dupscan() -> assert_cmd::Command {
    assert_cmd::Command::new(cargo::cargo_bin!("dupscan"))
}

pub fn create_file(dir: &Path, name: &str, content: &[u8]) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Run a scan of `dir` with JSON output and return the parsed report
pub fn scan_json(dir: &Path, extra_args: &[&str]) -> serde_json::Value {
    let output = dupscan()
        .arg("--search_path")
        .arg(dir)
        .args(extra_args)
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    serde_json::from_slice(&output).unwrap()
}

/// Every file name that appears in any duplicate group
pub fn get_all_filenames(json: &serde_json::Value) -> Vec<String> {
    json["groups"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|g| g["files"].as_array().unwrap())
        .map(|f| f.as_str().unwrap().rsplit('/').next().unwrap().to_string())
        .collect()
}
