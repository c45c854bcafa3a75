//! Shared test utilities for pkgup-bundler integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use pkgup_bundler::{
    CompileRequest, Compiler, EmittedFile, NativeRuntime, ResolveOptions, Result, Runtime,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
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

pub fn native_runtime() -> Arc<dyn Runtime> {
    Arc::new(NativeRuntime::new())
}

pub fn resolve_options(dir: &Path) -> ResolveOptions {
    ResolveOptions {
        cwd: Some(dir.to_path_buf()),
        ..ResolveOptions::default()
    }
}

pub fn read(dir: &Path, relative: &str) -> String {
    fs::read_to_string(dir.join(relative))
        .unwrap_or_else(|e| panic!("failed to read {relative}: {e}"))
}

/// Emits `// <source>` for every input under the plan's output name.
#[derive(Debug, Default)]
pub struct EchoCompiler;

#[async_trait]
impl Compiler for EchoCompiler {
    async fn compile(&self, request: CompileRequest) -> Result<Vec<EmittedFile>> {
        let mut files = Vec::new();
        for source in &request.inputs {
            for name in request.naming.names_for(source) {
                let filename = request
                    .naming
                    .relative_to_dist(&name)
                    .unwrap_or(&name)
                    .to_string();
                files.push(EmittedFile::new(filename, format!("// {source}\n")));
            }
        }
        Ok(files)
    }
}

pub fn echo() -> Arc<dyn Compiler> {
    Arc::new(EchoCompiler)
}
