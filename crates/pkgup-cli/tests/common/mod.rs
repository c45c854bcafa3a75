//! Shared fixtures for pkgup CLI tests.

#![allow(dead_code)]

use std::fs;
use tempfile::TempDir;

/// A package directory populated with `files` (path, contents).
pub fn package(files: &[(&str, &str)]) -> TempDir {
    let temp = TempDir::new().expect("create temp dir");
    for (path, contents) in files {
        let path = temp.path().join(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(&path, contents).expect("write fixture");
    }
    temp
}
