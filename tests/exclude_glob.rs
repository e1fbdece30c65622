mod common;

use common::{create_file, get_all_filenames, scan_json};
use std::io::Write;
use tempfile::TempDir;

#[test]
fn test_exclude_extension_finds_duplicates_in_remaining() {
    let dir = TempDir::new().unwrap();

    create_file(dir.path(), "a.txt", b"duplicate content");
    create_file(dir.path(), "b.txt", b"duplicate content");

    create_file(dir.path(), "a.log", b"log duplicate");
    create_file(dir.path(), "b.log", b"log duplicate");

    let json = scan_json(dir.path(), &["--exclude", "*.log"]);

    assert_eq!(json["stats"]["files_hashed"], 2);
    assert_eq!(json["groups"].as_array().unwrap().len(), 1);

    let filenames = get_all_filenames(&json);
    assert!(filenames.contains(&"a.txt".to_string()));
    assert!(filenames.contains(&"b.txt".to_string()));
    assert!(!filenames.iter().any(|f| f.ends_with(".log")));
}

#[test]
fn test_exclude_directory_skips_entire_tree() {
    let dir = TempDir::new().unwrap();

    create_file(dir.path(), "root.txt", b"unique root");

    create_file(dir.path(), "node_modules/pkg/a.js", b"module dup");
    create_file(dir.path(), "node_modules/pkg/b.js", b"module dup");

    let json = scan_json(dir.path(), &["-e", "node_modules"]);

    assert_eq!(json["stats"]["files_hashed"], 1);
    assert!(json["groups"].as_array().unwrap().is_empty());
}

#[test]
fn test_multiple_exclude_patterns() {
    let dir = TempDir::new().unwrap();

    create_file(dir.path(), "keep1.txt", b"keep this");
    create_file(dir.path(), "keep2.txt", b"keep this");

    create_file(dir.path(), "skip.log", b"skip log");
    create_file(dir.path(), "skip.bak", b"skip bak");
    create_file(dir.path(), "build/output.js", b"build output");

    let json = scan_json(dir.path(), &["-e", "*.log", "-e", "*.bak", "-e", "build"]);

    assert_eq!(json["stats"]["files_hashed"], 2);
    assert_eq!(json["groups"].as_array().unwrap().len(), 1);

    let filenames = get_all_filenames(&json);
    assert_eq!(filenames.len(), 2);
    assert!(filenames.contains(&"keep1.txt".to_string()));
    assert!(filenames.contains(&"keep2.txt".to_string()));
}

#[test]
fn test_exclude_file_combined_with_exclude_flag() {
    let dir = TempDir::new().unwrap();
    let exclude_dir = TempDir::new().unwrap();

    let exclude_file = exclude_dir.path().join(".dupscanignore");
    let mut f = std::fs::File::create(&exclude_file).unwrap();
    writeln!(f, "# From exclude file:").unwrap();
    writeln!(f, "*.log").unwrap();
    writeln!(f).unwrap();
    writeln!(f, "cache").unwrap();

    create_file(dir.path(), "keep1.txt", b"keep this");
    create_file(dir.path(), "keep2.txt", b"keep this");
    create_file(dir.path(), "skip.log", b"excluded by file");
    create_file(dir.path(), "skip.bak", b"excluded by flag");
    create_file(dir.path(), "cache/data.bin", b"excluded by file");

    let exclude_file = exclude_file.to_str().unwrap();
    let json = scan_json(
        dir.path(),
        &["--exclude-file", exclude_file, "-e", "*.bak"],
    );

    assert_eq!(json["stats"]["files_hashed"], 2);

    let filenames = get_all_filenames(&json);
    assert_eq!(filenames.len(), 2);
    assert!(filenames.contains(&"keep1.txt".to_string()));
    assert!(filenames.contains(&"keep2.txt".to_string()));
}

#[test]
fn test_invalid_pattern_is_usage_error() {
    let dir = TempDir::new().unwrap();

    common::dupscan()
        .arg("--search_path")
        .arg(dir.path())
        .arg("-e")
        .arg("a[")
        .assert()
        .code(2);
}
