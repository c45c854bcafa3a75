//! Declaration plans through OXC isolated declarations.
//!
//! Each input source is turned into a `.d.ts` file on its own; there is no
//! type checker. Relative imports found in the generated declarations are
//! followed so every declaration file an entry refers to is emitted too.

use async_trait::async_trait;
use indexmap::IndexSet;
use oxc_allocator::Allocator;
use oxc_ast::ast::ModuleDeclaration;
use oxc_codegen::Codegen;
use oxc_isolated_declarations::{IsolatedDeclarations, IsolatedDeclarationsOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;
use path_clean::PathClean;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{CompileRequest, Compiler, EmittedFile};
use crate::diagnostics::{DiagnosticKind, ExtractedDiagnostic};
use crate::entry::{OutputKind, normalize_path};
use crate::plan::PlanKind;
use crate::runtime::Runtime;
use crate::{Error, Result};

/// Emits one declaration file per reachable source.
#[derive(Debug, Clone)]
pub struct DeclarationCompiler {
    runtime: Arc<dyn Runtime>,
    strip_internal: bool,
}

impl DeclarationCompiler {
    pub fn new(runtime: Arc<dyn Runtime>) -> Self {
        Self {
            runtime,
            strip_internal: true,
        }
    }

    /// Drop declarations annotated with `@internal`. On by default.
    pub fn strip_internal(mut self, strip: bool) -> Self {
        self.strip_internal = strip;
        self
    }

    /// First existing source an import specifier refers to.
    async fn resolve_import(&self, cwd: &Path, importer: &str, specifier: &str) -> Option<String> {
        let dir = Path::new(importer).parent()?;
        for candidate in import_candidates(specifier) {
            let relative = dir.join(&candidate).clean();
            if self.runtime.is_file(&cwd.join(&relative)).await {
                return Some(normalize_path(&relative.to_string_lossy(), false));
            }
        }
        None
    }
}

fn is_declaration_source(source: &str) -> bool {
    OutputKind::split(source).is_some_and(|(kind, _)| kind.is_declaration())
}

/// Files a relative specifier may point at, most specific first.
fn import_candidates(specifier: &str) -> Vec<String> {
    let remaps: &[(&str, &[&str])] = &[
        (".js", &[".ts", ".tsx", ".d.ts"]),
        (".mjs", &[".mts", ".d.mts"]),
        (".cjs", &[".cts", ".d.cts"]),
        (".jsx", &[".tsx"]),
    ];
    for (js, replacements) in remaps {
        if let Some(base) = specifier.strip_suffix(js) {
            return replacements.iter().map(|ext| format!("{base}{ext}")).collect();
        }
    }

    if [".ts", ".tsx", ".mts", ".cts"]
        .iter()
        .any(|ext| specifier.ends_with(ext))
    {
        return vec![specifier.to_string()];
    }

    [".ts", ".tsx", ".d.ts", ".mts", ".cts", "/index.ts", "/index.d.ts"]
        .iter()
        .map(|suffix| format!("{specifier}{suffix}"))
        .collect()
}

/// Generate declarations for one TypeScript source.
fn generate_dts(
    source: &str,
    file_path: &str,
    strip_internal: bool,
) -> std::result::Result<String, Vec<ExtractedDiagnostic>> {
    let allocator = Allocator::default();

    let source_type = SourceType::from_path(file_path).map_err(|e| {
        vec![
            ExtractedDiagnostic::error(DiagnosticKind::Declaration, e.to_string())
                .with_file(file_path),
        ]
    })?;

    let to_diagnostics = |kind: DiagnosticKind, errors: Vec<String>| -> Vec<ExtractedDiagnostic> {
        errors
            .into_iter()
            .map(|message| ExtractedDiagnostic::error(kind.clone(), message).with_file(file_path))
            .collect()
    };

    let parsed = Parser::new(&allocator, source, source_type).parse();
    if !parsed.errors.is_empty() {
        let errors = parsed.errors.iter().map(|e| e.to_string()).collect();
        return Err(to_diagnostics(DiagnosticKind::ParseError, errors));
    }

    let options = IsolatedDeclarationsOptions { strip_internal };
    let dts = IsolatedDeclarations::new(&allocator, options).build(&parsed.program);
    if !dts.errors.is_empty() {
        let errors = dts.errors.iter().map(|e| e.to_string()).collect();
        return Err(to_diagnostics(DiagnosticKind::Declaration, errors));
    }

    Ok(Codegen::new().build(&dts.program).code)
}

/// Relative module specifiers imported or re-exported by a declaration file.
fn relative_imports(dts: &str) -> Vec<String> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, dts, SourceType::d_ts()).parse();

    parsed
        .program
        .body
        .iter()
        .filter_map(|stmt| stmt.as_module_declaration())
        .filter_map(|decl| match decl {
            ModuleDeclaration::ImportDeclaration(import) => Some(import.source.value.as_str()),
            ModuleDeclaration::ExportNamedDeclaration(export) => {
                export.source.as_ref().map(|source| source.value.as_str())
            }
            ModuleDeclaration::ExportAllDeclaration(export) => Some(export.source.value.as_str()),
            _ => None,
        })
        .filter(|specifier| specifier.starts_with("./") || specifier.starts_with("../"))
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl Compiler for DeclarationCompiler {
    async fn compile(&self, request: CompileRequest) -> Result<Vec<EmittedFile>> {
        if !matches!(request.kind, PlanKind::Declarations) {
            return Err(Error::InvalidConfig(format!(
                "cannot emit declarations for a {} plan",
                request.kind
            )));
        }

        let cwd = request.options.cwd.as_path();
        let mut seen: IndexSet<String> = request.inputs.clone();
        let mut queue: VecDeque<String> = request.inputs.iter().cloned().collect();
        let mut files = Vec::new();
        let mut diagnostics = Vec::new();

        while let Some(source) = queue.pop_front() {
            let names = request.naming.names_for(&source);
            if names.is_empty() {
                warn!(source = %source, "Skipping declaration outside the source directory");
                continue;
            }

            let bytes = self.runtime.read_file(&cwd.join(&source)).await?;
            let Ok(content) = String::from_utf8(bytes) else {
                diagnostics.push(
                    ExtractedDiagnostic::error(DiagnosticKind::Declaration, "source is not valid UTF-8")
                        .with_file(&source),
                );
                continue;
            };

            let dts = if is_declaration_source(&source) {
                content
            } else {
                match generate_dts(&content, &source, self.strip_internal) {
                    Ok(dts) => dts,
                    Err(errors) => {
                        diagnostics.extend(errors);
                        continue;
                    }
                }
            };

            for specifier in relative_imports(&dts) {
                match self.resolve_import(cwd, &source, &specifier).await {
                    Some(dependency) => {
                        if seen.insert(dependency.clone()) {
                            debug!(from = %source, to = %dependency, "Following declaration import");
                            queue.push_back(dependency);
                        }
                    }
                    None => debug!(from = %source, specifier = %specifier, "Unresolved declaration import"),
                }
            }

            for name in names {
                let filename = request.naming.relative_to_dist(&name).unwrap_or(&name);
                files.push(EmittedFile::new(filename, dts.as_bytes()));
            }
        }

        if diagnostics.is_empty() {
            Ok(files)
        } else {
            Err(Error::Bundling(diagnostics))
        }
    }
}
