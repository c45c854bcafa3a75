//! Output path to source path mapping.
//!
//! An output such as `./dist/bin/cli.js` is traced back to its source by
//! swapping the destination directory for the source directory and probing
//! candidate extensions in a fixed precedence order.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::path::{normalize_path, strip_dir};
use crate::runtime::Runtime;
use crate::{Error, Result};

/// Output file kinds recognised by their suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    Js,
    Mjs,
    Cjs,
    Dts,
    Dmts,
    Dcts,
}

impl OutputKind {
    /// Suffix match order, longest first.
    const LONGEST_FIRST: [OutputKind; 6] = [
        OutputKind::Dmts,
        OutputKind::Dcts,
        OutputKind::Dts,
        OutputKind::Mjs,
        OutputKind::Cjs,
        OutputKind::Js,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            OutputKind::Js => ".js",
            OutputKind::Mjs => ".mjs",
            OutputKind::Cjs => ".cjs",
            OutputKind::Dts => ".d.ts",
            OutputKind::Dmts => ".d.mts",
            OutputKind::Dcts => ".d.cts",
        }
    }

    /// Source extensions to probe, first match wins.
    pub fn source_candidates(self) -> &'static [&'static str] {
        match self {
            OutputKind::Js => &[".js", ".ts", ".tsx", ".mts", ".cts"],
            OutputKind::Mjs => &[".mjs", ".mts", ".ts", ".tsx", ".js"],
            OutputKind::Cjs => &[".cjs", ".cts", ".ts", ".tsx", ".js"],
            OutputKind::Dts => &[".d.ts", ".d.mts", ".d.cts", ".ts", ".mts", ".cts"],
            OutputKind::Dmts => &[".d.mts", ".mts", ".ts"],
            OutputKind::Dcts => &[".d.cts", ".cts", ".ts"],
        }
    }

    pub fn is_declaration(self) -> bool {
        matches!(self, OutputKind::Dts | OutputKind::Dmts | OutputKind::Dcts)
    }

    /// Split an output path into its kind and the path without the suffix.
    pub fn split(output: &str) -> Option<(OutputKind, &str)> {
        Self::LONGEST_FIRST.iter().find_map(|kind| {
            output
                .strip_suffix(kind.suffix())
                .map(|base| (*kind, base))
        })
    }
}

/// Finds the source file behind an output path.
#[derive(Debug, Clone)]
pub struct SourceLocator {
    runtime: Arc<dyn Runtime>,
    cwd: PathBuf,
}

impl SourceLocator {
    /// Relative candidates are probed against `cwd`.
    pub fn new(runtime: Arc<dyn Runtime>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            runtime,
            cwd: cwd.into(),
        }
    }

    /// Locate the source for `output`.
    ///
    /// Returns the normalized source path (`./src/index.ts`).
    ///
    /// # Errors
    ///
    /// [`Error::SourceNotFound`] when the suffix is unknown, the output is
    /// not under `dist_dir`, or no candidate exists.
    pub async fn locate(&self, output: &str, src_dir: &str, dist_dir: &str) -> Result<String> {
        let output = normalize_path(output, false);
        let src_dir = normalize_path(src_dir, true);
        let dist_dir = normalize_path(dist_dir, true);

        let not_found = || Error::SourceNotFound {
            output: output.clone(),
        };

        let (kind, base) = OutputKind::split(&output).ok_or_else(not_found)?;
        let relative = strip_dir(base, &dist_dir).ok_or_else(not_found)?;

        for extension in kind.source_candidates() {
            let candidate = format!("{src_dir}{relative}{extension}");
            if self.runtime.is_file(&self.probe_path(&candidate)).await {
                debug!(output = %output, source = %candidate, "located entry source");
                return Ok(candidate);
            }
        }

        Err(not_found())
    }

    fn probe_path(&self, candidate: &str) -> PathBuf {
        let path = Path::new(candidate);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}

/// Output path for a manually supplied source file.
///
/// The source must lie under `src_dir`. `.ts`, `.tsx`, `.js` and `.jsx`
/// become `.js`; `.mts`/`.mjs` become `.mjs`; `.cts`/`.cjs` become `.cjs`.
pub fn output_for_source(source: &str, src_dir: &str, dist_dir: &str) -> Result<String> {
    let source = normalize_path(source, false);
    let src_dir = normalize_path(src_dir, true);
    let dist_dir = normalize_path(dist_dir, true);

    let relative = strip_dir(&source, &src_dir).ok_or_else(|| Error::PathOutsideSource {
        path: source.clone(),
        src_dir: src_dir.clone(),
    })?;

    let unresolvable = || Error::UnresolvableOutputKind {
        path: source.clone(),
    };

    // Declaration files have nothing to bundle.
    if OutputKind::split(relative).is_some_and(|(kind, _)| kind.is_declaration()) {
        return Err(unresolvable());
    }

    let (stem, extension) = relative.rsplit_once('.').ok_or_else(unresolvable)?;
    if stem.is_empty() || stem.ends_with('/') {
        return Err(unresolvable());
    }

    let output_extension = match extension {
        "ts" | "tsx" | "js" | "jsx" => ".js",
        "mts" | "mjs" => ".mjs",
        "cts" | "cjs" => ".cjs",
        _ => return Err(unresolvable()),
    };

    Ok(format!("{dist_dir}{stem}{output_extension}"))
}
