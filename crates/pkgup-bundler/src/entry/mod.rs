//! Entry-point resolution.
//!
//! Turns the entry declarations of a `package.json` (`main`, `module`,
//! `types`, `bin`, `exports`) plus any manually supplied sources into a
//! deduplicated set of [`EntryPoint`]s keyed by output path.
//!
//! ```text
//! package.json ──▶ Registration::sequence ──▶ EntryRegistry::merge
//!                                                   │
//!                           SourceLocator::locate ◀─┘ (fills `source`)
//! ```

pub mod exports;
pub mod locate;
pub mod path;
pub mod registry;

pub use exports::{ExportRecord, ExportsField, parse_exports};
pub use locate::{OutputKind, SourceLocator, output_for_source};
pub use path::normalize_path;
pub use registry::{EntryRegistry, Registration, infer_format};

use path_clean::PathClean;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

/// Default source directory.
pub const DEFAULT_SRC_DIR: &str = "./src/";
/// Default destination directory.
pub const DEFAULT_DIST_DIR: &str = "./dist/";

/// Where sources live and outputs go, relative to the package root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layout {
    /// Package root that relative paths are taken from.
    pub cwd: PathBuf,
    /// Normalized with a trailing slash (`./src/`).
    pub src_dir: String,
    /// Normalized with a trailing slash (`./dist/`).
    pub dist_dir: String,
}

impl Layout {
    pub fn new(cwd: impl Into<PathBuf>, src_dir: &str, dist_dir: &str) -> Self {
        Self {
            cwd: cwd.into(),
            src_dir: normalize_path(src_dir, true),
            dist_dir: normalize_path(dist_dir, true),
        }
    }

    /// Absolute destination directory.
    pub fn dist_path(&self) -> PathBuf {
        self.cwd.join(&self.dist_dir).clean()
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(".", DEFAULT_SRC_DIR, DEFAULT_DIST_DIR)
    }
}

/// Module format of an entry output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntryFormat {
    /// ECMAScript module output (`import`/`export`).
    #[serde(rename = "esm")]
    EcmaScriptModule,
    /// CommonJS output (`require`/`module.exports`).
    #[serde(rename = "cjs")]
    CommonJs,
    /// TypeScript declaration output.
    #[serde(rename = "dts")]
    TypeDeclaration,
}

impl EntryFormat {
    pub fn is_declaration(self) -> bool {
        matches!(self, EntryFormat::TypeDeclaration)
    }
}

impl fmt::Display for EntryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryFormat::EcmaScriptModule => write!(f, "esm"),
            EntryFormat::CommonJs => write!(f, "cjs"),
            EntryFormat::TypeDeclaration => write!(f, "dts"),
        }
    }
}

/// Manifest field an entry was declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManifestField {
    Main,
    Module,
    Types,
    Bin,
    Exports,
    /// Added on the command line rather than in the manifest.
    Manual,
}

impl ManifestField {
    fn as_str(self) -> &'static str {
        match self {
            ManifestField::Main => "main",
            ManifestField::Module => "module",
            ManifestField::Types => "types",
            ManifestField::Bin => "bin",
            ManifestField::Exports => "exports",
            ManifestField::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Where an entry was declared, e.g. `exports.node.import` or `bin.tool`.
///
/// Rendered with `.key` for object keys and `[i]` for array positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Provenance {
    field: ManifestField,
    segments: Vec<Segment>,
}

impl Provenance {
    /// Provenance rooted at a manifest field.
    pub fn field(field: ManifestField) -> Self {
        Self {
            field,
            segments: Vec::new(),
        }
    }

    pub fn manual() -> Self {
        Self::field(ManifestField::Manual)
    }

    /// Descend into an object key.
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.segments.push(Segment::Key(key.into()));
        next
    }

    /// Descend into an array position.
    pub fn index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.segments.push(Segment::Index(index));
        next
    }

    pub fn manifest_field(&self) -> ManifestField {
        self.field
    }

    /// True when the entry came from the `bin` field.
    pub fn is_bin(&self) -> bool {
        self.field == ManifestField::Bin
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field.as_str())?;
        for segment in &self.segments {
            match segment {
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl Serialize for Provenance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A single build target, unique by `output` within a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryPoint {
    pub format: EntryFormat,
    pub provenance: Provenance,
    /// Source file the output is built from, `None` until resolved.
    pub source: Option<String>,
    /// Normalized output path (`./dist/index.js`).
    pub output: String,
    /// Set when a `bin` declaration reached this output.
    pub executable: bool,
    /// Platform condition (`node`) the output was declared under.
    pub condition: Option<String>,
}

impl EntryPoint {
    pub fn new(format: EntryFormat, provenance: Provenance, output: impl Into<String>) -> Self {
        let executable = provenance.is_bin();
        Self {
            format,
            provenance,
            source: None,
            output: normalize_path(&output.into(), false),
            executable,
            condition: None,
        }
    }

    pub fn with_condition(mut self, condition: Option<String>) -> Self {
        self.condition = condition;
        self
    }
}
