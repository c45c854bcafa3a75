//! Render [`ExtractedDiagnostic`] through miette.

use crate::diagnostics::{DiagnosticKind, DiagnosticSeverity, ExtractedDiagnostic};
use miette::{Diagnostic, LabeledSpan, NamedSource, Severity, SourceCode};
use std::fmt;
use std::path::Path;

/// Byte offset of a 1-based line and column.
///
/// Columns count characters, not bytes. Column 0 is treated as 1.
pub fn line_col_to_offset(source: &str, line: u32, column: u32) -> Option<usize> {
    let line_idx = usize::try_from(line).ok()?.checked_sub(1)?;
    let mut offset = 0;
    for (idx, text) in source.split('\n').enumerate() {
        if idx == line_idx {
            let col = usize::try_from(column.saturating_sub(1)).ok()?;
            let col_bytes = text
                .char_indices()
                .nth(col)
                .map_or(text.len(), |(pos, _)| pos);
            return Some(offset + col_bytes);
        }
        offset += text.len() + 1;
    }
    None
}

/// Length of the identifier-like token at `offset`, at least 1.
fn token_length(source: &str, offset: usize) -> usize {
    source
        .get(offset..)
        .and_then(|rest| {
            rest.char_indices()
                .find(|(_, c)| !(c.is_alphanumeric() || *c == '_' || *c == '$'))
                .map(|(pos, _)| pos)
        })
        .unwrap_or(1)
        .max(1)
}

/// A diagnostic with its source file attached.
#[derive(Debug)]
pub struct DiagnosticError {
    diag: ExtractedDiagnostic,
    source_code: Option<NamedSource<String>>,
}

impl DiagnosticError {
    pub fn diagnostic(&self) -> &ExtractedDiagnostic {
        &self.diag
    }
}

impl std::error::Error for DiagnosticError {}

impl fmt::Display for DiagnosticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diag.message)
    }
}

impl Diagnostic for DiagnosticError {
    fn code(&self) -> Option<Box<dyn fmt::Display + '_>> {
        Some(Box::new(format!("pkgup::{}", self.diag.kind)))
    }

    fn severity(&self) -> Option<Severity> {
        Some(match self.diag.severity {
            DiagnosticSeverity::Error => Severity::Error,
            DiagnosticSeverity::Warning => Severity::Warning,
        })
    }

    fn help(&self) -> Option<Box<dyn fmt::Display + '_>> {
        self.diag
            .help
            .as_ref()
            .map(|help| Box::new(help) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.source_code.as_ref().map(|source| source as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let source = self.source_code.as_ref()?.inner();
        let offset = line_col_to_offset(source, self.diag.line?, self.diag.column?)?;
        let label = match self.diag.kind {
            DiagnosticKind::ParseError => "parse error",
            DiagnosticKind::MissingExport => "missing export",
            DiagnosticKind::UnresolvedEntry => "unresolved entry",
            DiagnosticKind::UnresolvedImport => "unresolved import",
            DiagnosticKind::Plugin => "plugin error",
            DiagnosticKind::Transform => "transform error",
            DiagnosticKind::Declaration => "cannot infer declaration",
            DiagnosticKind::Internal | DiagnosticKind::Other => "here",
        };
        Some(Box::new(std::iter::once(LabeledSpan::new(
            Some(label.to_string()),
            offset,
            token_length(source, offset),
        ))))
    }
}

/// Attach the diagnostic's source file, read from disk, for excerpts.
///
/// Relative file names are resolved against `cwd`.
pub fn to_diagnostic_error(diag: ExtractedDiagnostic, cwd: &Path) -> DiagnosticError {
    let source_code = diag.file.as_ref().and_then(|file| {
        let content = std::fs::read_to_string(cwd.join(file)).ok()?;
        Some(NamedSource::new(file, content).with_language("typescript"))
    });
    DiagnosticError { diag, source_code }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_line_col_to_offset() {
        let source = "const a = 1;\nconst b = 2;\n";
        assert_eq!(line_col_to_offset(source, 1, 1), Some(0));
        assert_eq!(line_col_to_offset(source, 2, 7), Some(19));
        assert_eq!(line_col_to_offset(source, 2, 0), Some(13));
        assert_eq!(line_col_to_offset(source, 0, 1), None);
        assert_eq!(line_col_to_offset(source, 9, 1), None);
    }

    #[test]
    fn test_multibyte_columns() {
        let source = "é = x";
        assert_eq!(line_col_to_offset(source, 1, 3), Some(3));
    }

    #[test]
    fn test_label_points_at_token() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("src")).unwrap();
        std::fs::write(temp.path().join("src/index.ts"), "export function run(x) {}\n").unwrap();

        let diag = ExtractedDiagnostic::error(DiagnosticKind::Declaration, "parameter needs a type")
            .with_file("src/index.ts")
            .with_location(1, 21);
        let error = to_diagnostic_error(diag, temp.path());

        assert!(error.source_code().is_some());
        let labels: Vec<_> = error.labels().unwrap().collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].offset(), 20);
        assert_eq!(labels[0].len(), 1);
    }

    #[test]
    fn test_missing_file_has_no_excerpt() {
        let temp = TempDir::new().unwrap();
        let diag = ExtractedDiagnostic::error(DiagnosticKind::Other, "boom").with_file("nope.ts");
        let error = to_diagnostic_error(diag, temp.path());
        assert!(error.source_code().is_none());
        assert!(error.labels().is_none());
        assert_eq!(error.to_string(), "boom");
    }
}
