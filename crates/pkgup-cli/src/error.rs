//! Error handling for the pkgup CLI.
//!
//! [`CliError`] is what every command returns. Configuration problems and
//! build problems get their own enums so their messages can carry a hint;
//! errors raised by the bundler library are kept intact so their diagnostics
//! can be rendered with source excerpts.
//!
//! # Example
//!
//! ```rust,no_run
//! use pkgup_cli::error::{Result, ResultExt};
//! use std::path::Path;
//!
//! fn create_out_dir(path: &Path) -> Result<()> {
//!     std::fs::create_dir_all(path).context(format!("Failed to create {}", path.display()))
//! }
//! ```

mod miette;

pub use self::miette::{bundler_error_to_miette, cli_error_to_miette};

use std::path::PathBuf;
use thiserror::Error;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Errors from the bundler library, rendered through its diagnostics.
    #[error(transparent)]
    Bundler(#[from] pkgup_bundler::Error),

    /// A bundler error from a build rooted at `cwd`.
    #[error("{source}")]
    Bundle {
        cwd: PathBuf,
        source: pkgup_bundler::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file is missing.
    #[error("Config file not found: {}\n\nHint: Create a pkgup.config.json file or fix the --config path", .0.display())]
    NotFound(PathBuf),

    /// The merged configuration could not be extracted.
    #[error("Invalid configuration: {0}\n\nHint: Check pkgup.config.json and PKGUP_* variables for unknown fields or wrong types")]
    Extract(String),

    #[error("Missing required field: {field}\n\nHint: {hint}")]
    MissingField { field: String, hint: String },

    #[error("Conflicting options: {0}\n\nHint: These options cannot be used together")]
    ConflictingOptions(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Extract(err.to_string())
    }
}

/// Errors from the build command itself, outside the bundler.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The working directory given with `--cwd` or `cwd` does not exist.
    #[error("Working directory not found: {}\n\nHint: Check the --cwd argument or the 'cwd' field", .0.display())]
    CwdNotFound(PathBuf),

    /// The output directory exists but is a file.
    #[error("Output path is not a directory: {}\n\nHint: Remove the file or choose another --out-dir", .0.display())]
    OutputNotDirectory(PathBuf),

    /// The manifest declares nothing to build.
    #[error("Nothing to build in {}\n\nHint: Declare main, module, types, bin or exports in package.json, or pass entry files", .0.display())]
    NoEntries(PathBuf),
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Extension trait for adding context to `Result` types.
pub trait ResultExt<T> {
    /// Prefix the error message.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}: {}", msg, err))
        })
    }
}
