//! Build npm packages from the entry points their `package.json` declares.
//!
//! pkgup reads `main`, `module`, `types`, `bin` and `exports`, maps every
//! output path back to a source file under the source directory, groups the
//! resulting entries into build plans and compiles them with Rolldown (module
//! plans) and OXC isolated declarations (the declaration plan).
//!
//! ```text
//! package.json ─▶ entry ─▶ plan ─▶ orchestrator ─▶ dist/
//!                  │                   │
//!               runtime            compiler (rolldown / declarations)
//! ```
//!
//! Everything up to [`plan::plan_builds`] is pure resolution and runs
//! through [`resolve`]. It fails before the destination directory is touched.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pkgup_bundler::{
//!     DeclarationCompiler, NativeRuntime, Orchestrator, ResolveOptions, RolldownCompiler,
//!     resolve,
//! };
//!
//! # async fn example() -> pkgup_bundler::Result<()> {
//! let runtime = Arc::new(NativeRuntime::new());
//! let resolution = resolve(runtime.clone(), &ResolveOptions::default()).await?;
//! let orchestrator = Orchestrator::new(
//!     Arc::new(RolldownCompiler::new()),
//!     Arc::new(DeclarationCompiler::new(runtime)),
//!     Arc::new(resolution.compile_options()),
//! );
//! orchestrator.run(&resolution.plans).await?;
//! # Ok(())
//! # }
//! ```

pub mod compiler;
pub mod diagnostics;
pub mod entry;
pub mod manifest;
pub mod orchestrator;
pub mod output;
pub mod plan;
pub mod plugins;
pub mod runtime;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub mod logging;

#[cfg(feature = "logging")]
pub use logging::{LogLevel, init_logging};

pub use compiler::{
    CompileOptions, CompileRequest, Compiler, DeclarationCompiler, EmittedFile, RolldownCompiler,
};
pub use diagnostics::{DiagnosticKind, DiagnosticSeverity, ExtractedDiagnostic};
pub use entry::{
    DEFAULT_DIST_DIR, DEFAULT_SRC_DIR, EntryFormat, EntryPoint, EntryRegistry, Layout,
    ManifestField, Provenance, Registration, SourceLocator, normalize_path,
};
pub use manifest::{Externals, PackageJson, PackageType};
pub use orchestrator::{BuildReport, Orchestrator, PlanReport};
pub use plan::{BuildPlan, ModuleFormat, OutputExtension, OutputNaming, PlanKind, plan_builds};
pub use runtime::{FileMetadata, NativeRuntime, Runtime, RuntimeError, RuntimeResult};

#[cfg(any(test, feature = "test-utils"))]
pub use runtime::MemoryRuntime;

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Error types for pkgup-bundler operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No usable `package.json`.
    #[error("Invalid package.json at {}: {reason}", path.display())]
    ManifestInvalid { path: PathBuf, reason: String },

    /// No source file maps to a declared output.
    #[error("Could not find a source file for {output}")]
    SourceNotFound { output: String },

    /// A manual entry outside the source directory.
    #[error("Entry {path} is not inside the source directory {src_dir}")]
    PathOutsideSource { path: String, src_dir: String },

    /// A manual entry whose extension has no output counterpart.
    #[error("Cannot determine the output for {path}")]
    UnresolvableOutputKind { path: String },

    /// The compiler reported errors.
    #[error("Build failed: {}", format_diagnostics(.0))]
    Bundling(Vec<ExtractedDiagnostic>),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Output path escaping the destination directory.
    #[error("Invalid output path: {0}")]
    InvalidOutputPath(String),

    #[error("Write failure: {0}")]
    WriteFailure(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Result type alias for pkgup-bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a bundling error from a Rolldown error batch.
    pub fn from_rolldown_batch(error: &dyn std::fmt::Debug) -> Self {
        Error::Bundling(diagnostics::extract_from_rolldown_error(error))
    }

    /// Diagnostics of a [`Error::Bundling`], empty for anything else.
    pub fn diagnostics(&self) -> &[ExtractedDiagnostic] {
        match self {
            Error::Bundling(diagnostics) => diagnostics,
            _ => &[],
        }
    }
}

fn format_diagnostics(diagnostics: &[ExtractedDiagnostic]) -> String {
    match diagnostics {
        [] => "unknown error".to_string(),
        [single] => single.to_string(),
        many => format!("{} errors", many.len()),
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::ManifestInvalid { .. } => "MANIFEST_INVALID",
            Error::SourceNotFound { .. } => "SOURCE_NOT_FOUND",
            Error::PathOutsideSource { .. } => "PATH_OUTSIDE_SOURCE",
            Error::UnresolvableOutputKind { .. } => "UNRESOLVABLE_OUTPUT_KIND",
            Error::Bundling(_) => "BUNDLING_FAULT",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::InvalidOutputPath(_) => "INVALID_OUTPUT_PATH",
            Error::WriteFailure(_) => "WRITE_FAILURE",
            Error::Io(_) => "IO_ERROR",
            Error::Runtime(_) => "RUNTIME_ERROR",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::ManifestInvalid { .. } => Some(Box::new(
                "Run pkgup from a directory containing a valid package.json.",
            )),
            Error::SourceNotFound { output } => Some(Box::new(format!(
                "Create a source file for {output} under the source directory, \
                 e.g. with the same path and a .ts extension."
            ))),
            Error::PathOutsideSource { src_dir, .. } => Some(Box::new(format!(
                "Entries passed on the command line must live under {src_dir}."
            ))),
            Error::UnresolvableOutputKind { .. } => Some(Box::new(
                "Entries must be .ts, .tsx, .mts, .cts, .js, .jsx, .mjs or .cjs files.",
            )),
            Error::InvalidOutputPath(_) => Some(Box::new(
                "Outputs must stay inside the destination directory.",
            )),
            Error::WriteFailure(_) => Some(Box::new("Check disk space and permissions.")),
            Error::Bundling(diagnostics) => match diagnostics.as_slice() {
                [single] => single
                    .help
                    .as_ref()
                    .map(|help| Box::new(help.clone()) as Box<dyn std::fmt::Display>),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Inputs to [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Working directory; the runtime's when `None`.
    pub cwd: Option<PathBuf>,
    pub src_dir: String,
    pub dist_dir: String,
    /// Source files to build in addition to the manifest's entries.
    pub entries: Vec<String>,
    pub sourcemap: bool,
    pub minify: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            cwd: None,
            src_dir: DEFAULT_SRC_DIR.to_string(),
            dist_dir: DEFAULT_DIST_DIR.to_string(),
            entries: Vec::new(),
            sourcemap: false,
            minify: false,
        }
    }
}

/// Everything known before the first file is compiled.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub manifest: PackageJson,
    pub layout: Layout,
    pub registry: EntryRegistry,
    pub plans: Vec<BuildPlan>,
    sourcemap: bool,
    minify: bool,
}

impl Resolution {
    /// Options every plan of this build compiles with.
    pub fn compile_options(&self) -> CompileOptions {
        let mut options = CompileOptions::new(self.layout.cwd.clone(), self.layout.dist_path());
        options.sourcemap = self.sourcemap;
        options.minify = self.minify;
        options.version = self.manifest.version.clone();
        options
    }
}

/// Find the manifest, resolve every entry to its source and plan the build.
///
/// # Errors
///
/// [`Error::ManifestInvalid`], [`Error::SourceNotFound`],
/// [`Error::PathOutsideSource`] and [`Error::UnresolvableOutputKind`].
pub async fn resolve(runtime: Arc<dyn Runtime>, options: &ResolveOptions) -> Result<Resolution> {
    let cwd = match &options.cwd {
        Some(cwd) => cwd.clone(),
        None => runtime.get_cwd()?,
    };

    let manifest = PackageJson::find_from_dir(runtime.as_ref(), &cwd).await?;
    let layout = Layout::new(cwd.clone(), &options.src_dir, &options.dist_dir);
    debug!(
        manifest = %manifest.path.display(),
        src_dir = %layout.src_dir,
        dist_dir = %layout.dist_dir,
        "Resolving entries"
    );

    let registrations = Registration::sequence(&manifest, &options.entries, &layout)?;
    let locator = SourceLocator::new(Arc::clone(&runtime), cwd);
    let registry = EntryRegistry::merge(registrations)
        .resolve_sources(&locator, runtime.as_ref(), &layout)
        .await?;

    let plans = plan_builds(&registry, Arc::new(manifest.externals()), &layout)?;
    info!(entries = registry.len(), plans = plans.len(), "Resolved build");

    Ok(Resolution {
        manifest,
        layout,
        registry,
        plans,
        sourcemap: options.sourcemap,
        minify: options.minify,
    })
}
