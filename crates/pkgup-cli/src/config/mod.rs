//! Configuration for pkgup with multi-source loading.
//!
//! Merges settings from CLI args, environment variables and a config file.
//! Priority: CLI > Environment > File > Defaults

mod defaults;
mod loading;
mod validation;

use pkgup_bundler::ResolveOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use defaults::*;

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "pkgup.config.json";

/// Prefix of environment variables read into the configuration.
pub const ENV_PREFIX: &str = "PKGUP_";

/// pkgup configuration - loaded from pkgup.config.json, `PKGUP_*` or CLI args.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PkgupConfig {
    /// Directory holding the sources
    #[serde(default = "default_src_dir")]
    pub src_dir: String,

    /// Destination directory
    #[serde(default = "default_out_dir")]
    pub out_dir: String,

    /// Write source maps next to built modules
    #[serde(default)]
    pub sourcemap: bool,

    /// Minify built modules
    #[serde(default)]
    pub minify: bool,

    /// Working directory, relative to where pkgup was started
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
}

impl Default for PkgupConfig {
    fn default() -> Self {
        Self {
            src_dir: default_src_dir(),
            out_dir: default_out_dir(),
            sourcemap: false,
            minify: false,
            cwd: None,
        }
    }
}

impl PkgupConfig {
    /// Directory the package is built from.
    pub fn working_dir(&self, launch_dir: &Path) -> PathBuf {
        match &self.cwd {
            Some(cwd) => launch_dir.join(cwd),
            None => launch_dir.to_path_buf(),
        }
    }

    /// Options for [`pkgup_bundler::resolve`], with `entries` added manually.
    pub fn resolve_options(&self, entries: &[String], launch_dir: &Path) -> ResolveOptions {
        ResolveOptions {
            cwd: Some(self.working_dir(launch_dir)),
            src_dir: self.src_dir.clone(),
            dist_dir: self.out_dir.clone(),
            entries: entries.to_vec(),
            sourcemap: self.sourcemap,
            minify: self.minify,
        }
    }
}
