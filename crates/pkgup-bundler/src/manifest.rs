//! `package.json` model.
//!
//! Only the fields that declare entry points or dependencies are modelled;
//! everything else in the manifest is ignored.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::entry::{EntryFormat, ExportsField};
use crate::runtime::Runtime;
use crate::{Error, Result};

/// Maximum allowed size for package.json files (10MB)
const MAX_PACKAGE_JSON_SIZE: u64 = 10 * 1024 * 1024;

const MANIFEST_FILE: &str = "package.json";

/// The `type` field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    #[default]
    CommonJs,
    Module,
}

impl PackageType {
    /// Format for outputs whose extension does not decide it.
    pub fn default_format(self) -> EntryFormat {
        match self {
            PackageType::CommonJs => EntryFormat::CommonJs,
            PackageType::Module => EntryFormat::EcmaScriptModule,
        }
    }
}

/// The `bin` field: one executable named after the package, or a map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bin {
    Single(String),
    Map(IndexMap<String, String>),
}

/// Parsed package.json structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageJson {
    pub name: Option<String>,
    pub version: Option<String>,
    #[serde(default, rename = "type")]
    pub package_type: PackageType,
    pub main: Option<String>,
    pub module: Option<String>,
    pub types: Option<String>,
    /// Older spelling of `types`, read only when `types` is absent.
    pub typings: Option<String>,
    pub bin: Option<Bin>,
    pub exports: Option<ExportsField>,
    #[serde(default)]
    pub dependencies: IndexMap<String, String>,
    #[serde(default, rename = "peerDependencies")]
    pub peer_dependencies: IndexMap<String, String>,
    #[serde(default, rename = "optionalDependencies")]
    pub optional_dependencies: IndexMap<String, String>,
    /// File path this was loaded from
    #[serde(skip)]
    pub path: PathBuf,
}

impl PackageJson {
    /// Parse manifest text. `path` is only used for error reporting.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let mut pkg: PackageJson =
            serde_json::from_str(content).map_err(|e| Error::ManifestInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        pkg.path = path.to_path_buf();
        Ok(pkg)
    }

    /// Load package.json from a specific path using the provided runtime.
    pub async fn from_path(runtime: &dyn Runtime, path: &Path) -> Result<Self> {
        let invalid = |reason: String| Error::ManifestInvalid {
            path: path.to_path_buf(),
            reason,
        };

        let metadata = runtime
            .metadata(path)
            .await
            .map_err(|e| invalid(format!("cannot read metadata: {e}")))?;

        if metadata.size > MAX_PACKAGE_JSON_SIZE {
            return Err(invalid(format!(
                "exceeds maximum size of {}MB",
                MAX_PACKAGE_JSON_SIZE / 1024 / 1024
            )));
        }

        let content_bytes = runtime
            .read_file(path)
            .await
            .map_err(|e| invalid(format!("failed to read: {e}")))?;

        let content = String::from_utf8(content_bytes)
            .map_err(|e| invalid(format!("contains invalid UTF-8: {e}")))?;

        Self::parse(&content, path)
    }

    /// Find and load package.json starting from a directory.
    ///
    /// Searches upward through parent directories until package.json is found
    /// or the filesystem root is reached.
    pub async fn find_from_dir(runtime: &dyn Runtime, start_dir: &Path) -> Result<Self> {
        let mut current = start_dir.to_path_buf();

        loop {
            let package_json_path = current.join(MANIFEST_FILE);

            if runtime.exists(&package_json_path) {
                debug!(path = %package_json_path.display(), "found package.json");
                return Self::from_path(runtime, &package_json_path).await;
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => {
                    return Err(Error::ManifestInvalid {
                        path: start_dir.join(MANIFEST_FILE),
                        reason: "no package.json found in directory tree".to_string(),
                    });
                }
            }
        }
    }

    /// Declaration output, from `types` or else `typings`.
    pub fn types_path(&self) -> Option<&str> {
        self.types.as_deref().or(self.typings.as_deref())
    }

    /// Directory containing the manifest.
    pub fn root(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Package names that are never bundled.
    pub fn externals(&self) -> Externals {
        Externals::new(
            self.peer_dependencies
                .keys()
                .chain(self.dependencies.keys())
                .chain(self.optional_dependencies.keys())
                .cloned(),
        )
    }
}

/// Dependency names that stay external, matched exactly or as `name/` prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Externals {
    names: IndexSet<String>,
}

impl Externals {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }

    /// True for `name` itself and for any `name/...` subpath import.
    pub fn is_external(&self, specifier: &str) -> bool {
        self.names.contains(specifier)
            || self.names.iter().any(|name| {
                specifier
                    .strip_prefix(name.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
