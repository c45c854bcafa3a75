//! The compiler capability.
//!
//! A [`Compiler`] turns one [`BuildPlan`] into emitted files. pkgup ships two:
//! [`RolldownCompiler`] for module plans and [`DeclarationCompiler`] for the
//! declaration plan. Tests substitute their own.

pub mod declarations;
pub mod rolldown;

pub use declarations::DeclarationCompiler;
pub use rolldown::RolldownCompiler;

use async_trait::async_trait;
use indexmap::IndexSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::Result;
use crate::manifest::Externals;
use crate::plan::{BuildPlan, OutputNaming, PlanKind};

/// Options shared by every compile request of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Package root; plan inputs are relative to it.
    pub cwd: PathBuf,
    /// Absolute destination directory.
    pub out_dir: PathBuf,
    pub sourcemap: bool,
    pub minify: bool,
    /// Manifest version, substituted for `__VERSION__`.
    pub version: Option<String>,
    /// Target Node.js rather than the browser.
    pub node_platform: bool,
}

impl CompileOptions {
    pub fn new(cwd: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            out_dir: out_dir.into(),
            sourcemap: false,
            minify: false,
            version: None,
            node_platform: true,
        }
    }
}

/// Everything a compiler needs for one plan.
#[derive(Debug, Clone)]
pub struct CompileRequest {
    pub kind: PlanKind,
    pub inputs: IndexSet<String>,
    pub naming: OutputNaming,
    pub externals: Arc<Externals>,
    pub options: Arc<CompileOptions>,
}

impl CompileRequest {
    pub fn from_plan(plan: &BuildPlan, options: Arc<CompileOptions>) -> Self {
        Self {
            kind: plan.kind,
            inputs: plan.inputs.clone(),
            naming: plan.naming.clone(),
            externals: Arc::clone(&plan.externals),
            options,
        }
    }
}

/// A file produced by a compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedFile {
    /// Path relative to the destination directory (`bin/cli.js`).
    pub filename: String,
    pub contents: Vec<u8>,
}

impl EmittedFile {
    pub fn new(filename: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            contents: contents.into(),
        }
    }
}

/// Bundling or declaration engine.
#[async_trait]
pub trait Compiler: Send + Sync + std::fmt::Debug {
    async fn compile(&self, request: CompileRequest) -> Result<Vec<EmittedFile>>;
}
