//! Diagnostic extraction from compiler errors.
//!
//! Rolldown and OXC report failures in their own types. Both are flattened
//! into [`ExtractedDiagnostic`] values so the rest of pkgup (and the CLI's
//! miette renderer) never depends on upstream error shapes.

mod miette;

pub use miette::{DiagnosticError, line_col_to_offset, to_diagnostic_error};

use serde::{Deserialize, Serialize};
use std::fmt;

/// One compiler error or warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDiagnostic {
    pub kind: DiagnosticKind,
    pub severity: DiagnosticSeverity,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub help: Option<String>,
}

impl ExtractedDiagnostic {
    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: DiagnosticSeverity::Error,
            message: message.into(),
            file: None,
            line: None,
            column: None,
            help: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// 1-based line and column.
    pub fn with_location(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for ExtractedDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(file) = &self.file {
            write!(f, " ({file}")?;
            if let (Some(line), Some(column)) = (self.line, self.column) {
                write!(f, ":{line}:{column}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    ParseError,
    MissingExport,
    UnresolvedEntry,
    UnresolvedImport,
    Plugin,
    Transform,
    /// Isolated declaration generation failed.
    Declaration,
    /// A compile task died without reporting.
    Internal,
    Other,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::ParseError => "ParseError",
            DiagnosticKind::MissingExport => "MissingExport",
            DiagnosticKind::UnresolvedEntry => "UnresolvedEntry",
            DiagnosticKind::UnresolvedImport => "UnresolvedImport",
            DiagnosticKind::Plugin => "Plugin",
            DiagnosticKind::Transform => "Transform",
            DiagnosticKind::Declaration => "Declaration",
            DiagnosticKind::Internal => "Internal",
            DiagnosticKind::Other => "Error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

/// Extract diagnostics from a Rolldown error batch.
///
/// Rolldown's diagnostic types are not stable, so this works from their
/// debug rendering.
pub fn extract_from_rolldown_error(error: &dyn fmt::Debug) -> Vec<ExtractedDiagnostic> {
    let rendered = format!("{error:?}");

    let parts: Vec<&str> = rendered
        .split("BuildDiagnostic")
        .map(str::trim)
        .filter(|part| part.len() > 2)
        .collect();

    if parts.len() > 1 {
        parts.into_iter().map(extract_single).collect()
    } else {
        vec![extract_single(&rendered)]
    }
}

fn classify(text: &str) -> DiagnosticKind {
    if text.contains("MissingExport") {
        DiagnosticKind::MissingExport
    } else if text.contains("UnresolvedEntry") {
        DiagnosticKind::UnresolvedEntry
    } else if text.contains("UnresolvedImport") || text.contains("Could not resolve") {
        DiagnosticKind::UnresolvedImport
    } else if text.contains("ParseError") || text.contains("Expected") || text.contains("Unexpected token") {
        DiagnosticKind::ParseError
    } else if text.contains("Plugin") {
        DiagnosticKind::Plugin
    } else if text.contains("Transform") || text.contains("transform") {
        DiagnosticKind::Transform
    } else {
        DiagnosticKind::Other
    }
}

fn extract_single(text: &str) -> ExtractedDiagnostic {
    let severity = if text.contains("Warning") {
        DiagnosticSeverity::Warning
    } else {
        DiagnosticSeverity::Error
    };

    let (file, line, column) = match extract_location(text) {
        Some((file, line, column)) => (Some(file), Some(line), Some(column)),
        None => (extract_file_path(text), None, None),
    };

    ExtractedDiagnostic {
        kind: classify(text),
        severity,
        message: text.to_string(),
        file,
        line,
        column,
        help: extract_help_text(text),
    }
}

const SOURCE_EXTENSIONS: &[&str] = &[".tsx", ".ts", ".mts", ".cts", ".jsx", ".js", ".mjs", ".cjs", ".json"];

fn is_path_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '"' | '\'' | '`' | ',' | '(' | ')' | '[' | ']' | '{' | '}')
}

/// Split `text` into path-like tokens.
fn path_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !is_path_char(c)).filter(|token| !token.is_empty())
}

/// First `file:line:column` triple in `text`.
fn extract_location(text: &str) -> Option<(String, u32, u32)> {
    path_tokens(text).find_map(|token| {
        let mut parts = token.rsplitn(3, ':');
        let column = parts.next()?.parse().ok()?;
        let line = parts.next()?.parse().ok()?;
        let file = parts.next()?;
        SOURCE_EXTENSIONS
            .iter()
            .any(|ext| file.ends_with(ext))
            .then(|| (file.to_string(), line, column))
    })
}

/// First token that looks like a source file path.
fn extract_file_path(text: &str) -> Option<String> {
    path_tokens(text)
        .map(|token| token.trim_end_matches([':', '.', ';']))
        .find(|token| token.contains('/') && SOURCE_EXTENSIONS.iter().any(|ext| token.ends_with(ext)))
        .map(str::to_string)
}

fn extract_help_text(text: &str) -> Option<String> {
    ["help: ", "Help: ", "hint: "].iter().find_map(|marker| {
        let start = text.find(marker)? + marker.len();
        let help = text[start..].lines().next()?.trim().trim_end_matches('"');
        (!help.is_empty()).then(|| help.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_location() {
        let text = "UnresolvedImport { message: \"Could not resolve './missing'\" at /pkg/src/index.ts:3:20 }";
        let diags = extract_from_rolldown_error(&text);
        assert_eq!(diags.len(), 1);
        let diag = &diags[0];
        assert_eq!(diag.kind, DiagnosticKind::UnresolvedImport);
        assert_eq!(diag.file.as_deref(), Some("/pkg/src/index.ts"));
        assert_eq!(diag.line, Some(3));
        assert_eq!(diag.column, Some(20));
        assert_eq!(diag.severity, DiagnosticSeverity::Error);
    }

    #[test]
    fn test_file_without_location() {
        let diag = extract_single("ParseError: Unexpected token in /pkg/src/bad.ts");
        assert_eq!(diag.kind, DiagnosticKind::ParseError);
        assert_eq!(diag.file.as_deref(), Some("/pkg/src/bad.ts"));
        assert_eq!(diag.line, None);
    }

    #[test]
    fn test_help_text() {
        let diag = extract_single("MissingExport \"foo\"\nhelp: did you mean \"bar\"?");
        assert_eq!(diag.kind, DiagnosticKind::MissingExport);
        assert_eq!(diag.help.as_deref(), Some("did you mean \"bar\"?"));
    }

    #[test]
    fn test_batch_is_split() {
        let text = "[BuildDiagnostic { UnresolvedEntry ./src/a.ts }, BuildDiagnostic { UnresolvedEntry ./src/b.ts }]";
        let diags = extract_from_rolldown_error(&text);
        assert_eq!(diags.len(), 2);
        assert!(diags.iter().all(|d| d.kind == DiagnosticKind::UnresolvedEntry));
        assert_eq!(diags[1].file.as_deref(), Some("./src/b.ts"));
    }

    #[test]
    fn test_display() {
        let diag = ExtractedDiagnostic::error(DiagnosticKind::Declaration, "missing return type")
            .with_file("./src/index.ts")
            .with_location(2, 5);
        assert_eq!(
            diag.to_string(),
            "Declaration: missing return type (./src/index.ts:2:5)"
        );
    }
}
