//! Miette diagnostic conversion for CLI errors.

use crate::error::CliError;
use miette::{Diagnostic, Report};
use pkgup_bundler::diagnostics::{DiagnosticError, to_diagnostic_error};
use std::path::Path;

/// Several compiler diagnostics reported together.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("Build failed with {} errors", .related.len())]
#[diagnostic(code(BUNDLING_FAULT))]
struct BundlingErrors {
    #[related]
    related: Vec<DiagnosticError>,
}

/// Convert a CliError to a miette Report.
///
/// Bundler diagnostics are rendered with excerpts of the files they point
/// at, read relative to the build's working directory.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Bundle { cwd, source } => bundler_error_to_miette(source, &cwd),
        CliError::Bundler(source) => {
            let cwd = std::env::current_dir().unwrap_or_default();
            bundler_error_to_miette(source, &cwd)
        }
        other => miette::miette!("{}", other),
    }
}

/// Convert a pkgup-bundler Error to a miette Report.
pub fn bundler_error_to_miette(err: pkgup_bundler::Error, cwd: &Path) -> Report {
    match err {
        pkgup_bundler::Error::Bundling(diagnostics) if !diagnostics.is_empty() => {
            let mut errors: Vec<DiagnosticError> = diagnostics
                .into_iter()
                .map(|diag| to_diagnostic_error(diag, cwd))
                .collect();
            if errors.len() == 1 {
                Report::new(errors.remove(0))
            } else {
                Report::new(BundlingErrors { related: errors })
            }
        }
        other => Report::new(other),
    }
}
