//! Shared utilities for command implementations.

use crate::cli::ProjectArgs;
use crate::config::PkgupConfig;
use crate::error::{BuildError, CliError, Result, ResultExt};
use pkgup_bundler::{NativeRuntime, Resolution, Runtime};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A package whose entries have been resolved and planned.
#[derive(Debug)]
pub struct Project {
    pub config: PkgupConfig,
    /// Directory the package is built from.
    pub cwd: PathBuf,
    pub resolution: Resolution,
}

/// Get the current working directory.
pub fn get_cwd() -> Result<PathBuf> {
    std::env::current_dir().map_err(|e| {
        CliError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to get current directory: {}", e),
        ))
    })
}

pub fn runtime() -> Arc<dyn Runtime> {
    Arc::new(NativeRuntime::new())
}

/// Load configuration, then resolve and plan the package.
///
/// Nothing is written; every configuration error surfaces here.
pub async fn resolve_project(args: &ProjectArgs, launch_dir: &Path) -> Result<Project> {
    let config = PkgupConfig::load(args, launch_dir)?;
    let cwd = config.working_dir(launch_dir);
    if !cwd.is_dir() {
        return Err(BuildError::CwdNotFound(cwd).into());
    }

    let options = config.resolve_options(&args.entries, launch_dir);
    tracing::debug!(?options, "Resolving package");
    let resolution = pkgup_bundler::resolve(runtime(), &options)
        .await
        .map_err(|source| CliError::Bundle {
            cwd: cwd.clone(),
            source,
        })?;

    Ok(Project {
        config,
        cwd,
        resolution,
    })
}

/// Ensure an output directory exists, creating it if necessary.
pub fn ensure_output_dir(out_dir: &Path) -> Result<()> {
    if !out_dir.exists() {
        fs::create_dir_all(out_dir)
            .context(format!("Failed to create {}", out_dir.display()))?;
    } else if !out_dir.is_dir() {
        return Err(BuildError::OutputNotDirectory(out_dir.to_path_buf()).into());
    }

    Ok(())
}
