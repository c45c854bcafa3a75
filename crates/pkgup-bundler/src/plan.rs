//! Partition resolved entries into build plans.
//!
//! Every module entry lands in the plan for its `(format, extension)` pair;
//! all declaration entries share one plan, which is ordered last.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::entry::{EntryFormat, EntryPoint, EntryRegistry, Layout, OutputKind};
use crate::manifest::Externals;
use crate::{Error, Result};

/// Declaration suffix used when an output does not name one.
pub const DEFAULT_DECLARATION_EXTENSION: &str = ".d.ts";

/// Runtime module format of a module plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
    Esm,
    Cjs,
}

/// File extension of a module plan's outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OutputExtension {
    #[serde(rename = ".js")]
    Js,
    #[serde(rename = ".mjs")]
    Mjs,
    #[serde(rename = ".cjs")]
    Cjs,
}

impl OutputExtension {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputExtension::Js => ".js",
            OutputExtension::Mjs => ".mjs",
            OutputExtension::Cjs => ".cjs",
        }
    }

    fn from_output(output: &str) -> Option<Self> {
        match OutputKind::split(output)?.0 {
            OutputKind::Js => Some(OutputExtension::Js),
            OutputKind::Mjs => Some(OutputExtension::Mjs),
            OutputKind::Cjs => Some(OutputExtension::Cjs),
            _ => None,
        }
    }
}

/// What a plan builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PlanKind {
    Module {
        format: ModuleFormat,
        extension: OutputExtension,
    },
    Declarations,
}

impl fmt::Display for PlanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanKind::Module { format, extension } => {
                let format = match format {
                    ModuleFormat::Esm => "esm",
                    ModuleFormat::Cjs => "cjs",
                };
                write!(f, "{format} ({})", extension.as_str())
            }
            PlanKind::Declarations => write!(f, "declarations"),
        }
    }
}

/// Declaration suffix of an output: everything from the last `.d.`.
///
/// `./dist/index.d.mts` gives `.d.mts`; outputs without one give `.d.ts`.
pub fn declaration_extension(output: &str) -> &str {
    output
        .rfind(".d.")
        .map(|index| &output[index..])
        .unwrap_or(DEFAULT_DECLARATION_EXTENSION)
}

/// Maps a compiled unit's source path to its output path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputNaming {
    src_dir: String,
    dist_dir: String,
    extension: String,
    /// Declaration suffixes requested per entry source.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    overrides: IndexMap<String, IndexSet<String>>,
}

impl OutputNaming {
    /// Naming for a module plan: every unit gets `extension`.
    pub fn module(layout: &Layout, extension: OutputExtension) -> Self {
        Self {
            src_dir: layout.src_dir.clone(),
            dist_dir: layout.dist_dir.clone(),
            extension: extension.as_str().to_string(),
            overrides: IndexMap::new(),
        }
    }

    /// Naming for the declaration plan: units default to `.d.ts`.
    pub fn declarations(layout: &Layout) -> Self {
        Self {
            src_dir: layout.src_dir.clone(),
            dist_dir: layout.dist_dir.clone(),
            extension: DEFAULT_DECLARATION_EXTENSION.to_string(),
            overrides: IndexMap::new(),
        }
    }

    fn request(&mut self, source: &str, extension: &str) {
        self.overrides
            .entry(source.to_string())
            .or_default()
            .insert(extension.to_string());
    }

    /// Source path relative to the source directory, without extension
    /// (`./src/bin/cli.ts` gives `bin/cli`).
    ///
    /// `None` for sources outside the source directory.
    pub fn stem<'a>(&self, source: &'a str) -> Option<&'a str> {
        let relative = source.strip_prefix(self.src_dir.as_str())?;
        let stem = match OutputKind::split(relative) {
            Some((kind, base)) if kind.is_declaration() => base,
            _ => {
                let file_start = relative.rfind('/').map_or(0, |i| i + 1);
                match relative[file_start..].rfind('.') {
                    Some(dot) if dot > 0 => &relative[..file_start + dot],
                    _ => relative,
                }
            }
        };
        Some(stem)
    }

    /// Primary output path for `source`.
    pub fn name_for(&self, source: &str) -> Option<String> {
        self.names_for(source).into_iter().next()
    }

    /// Every output path for `source`.
    ///
    /// Declaration entries may ask for several suffixes from one source
    /// (`index.d.mts` and `index.d.cts` from `index.ts`).
    pub fn names_for(&self, source: &str) -> Vec<String> {
        let Some(stem) = self.stem(source) else {
            return Vec::new();
        };
        match self.overrides.get(source) {
            Some(extensions) => extensions
                .iter()
                .map(|extension| format!("{}{stem}{extension}", self.dist_dir))
                .collect(),
            None => vec![format!("{}{stem}{}", self.dist_dir, self.extension)],
        }
    }

    /// Output path relative to the destination directory.
    pub fn relative_to_dist<'a>(&self, output: &'a str) -> Option<&'a str> {
        output.strip_prefix(self.dist_dir.as_str())
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn src_dir(&self) -> &str {
        &self.src_dir
    }

    pub fn dist_dir(&self) -> &str {
        &self.dist_dir
    }
}

/// One invocation of a compiler.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    #[serde(flatten)]
    pub kind: PlanKind,
    /// Source paths in first-seen order.
    pub inputs: IndexSet<String>,
    pub naming: OutputNaming,
    #[serde(skip)]
    pub externals: Arc<Externals>,
    /// Output paths that get a shebang and mode 0755.
    pub executables: IndexSet<String>,
    pub entries: Vec<EntryPoint>,
}

impl BuildPlan {
    fn new(kind: PlanKind, naming: OutputNaming, externals: Arc<Externals>) -> Self {
        Self {
            kind,
            inputs: IndexSet::new(),
            naming,
            externals,
            executables: IndexSet::new(),
            entries: Vec::new(),
        }
    }

    fn add(&mut self, entry: &EntryPoint, source: &str) {
        self.inputs.insert(source.to_string());
        if entry.executable {
            self.executables.insert(entry.output.clone());
        }
        self.entries.push(entry.clone());
    }

    pub fn is_declarations(&self) -> bool {
        matches!(self.kind, PlanKind::Declarations)
    }

    /// Output paths of the entries this plan covers.
    pub fn outputs(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.output.as_str())
    }
}

/// Partition a resolved registry into plans.
///
/// # Errors
///
/// [`Error::SourceNotFound`] for an entry whose source was never resolved,
/// [`Error::UnresolvableOutputKind`] for a module entry whose output is not
/// `.js`, `.mjs` or `.cjs`.
pub fn plan_builds(
    registry: &EntryRegistry,
    externals: Arc<Externals>,
    layout: &Layout,
) -> Result<Vec<BuildPlan>> {
    let mut modules: IndexMap<PlanKind, BuildPlan> = IndexMap::new();
    let mut declarations: Option<BuildPlan> = None;

    for entry in registry {
        let source = entry.source.as_deref().ok_or_else(|| Error::SourceNotFound {
            output: entry.output.clone(),
        })?;

        let format = match entry.format {
            EntryFormat::TypeDeclaration => {
                let plan = declarations.get_or_insert_with(|| {
                    BuildPlan::new(
                        PlanKind::Declarations,
                        OutputNaming::declarations(layout),
                        Arc::clone(&externals),
                    )
                });
                plan.naming
                    .request(source, declaration_extension(&entry.output));
                plan.add(entry, source);
                continue;
            }
            EntryFormat::EcmaScriptModule => ModuleFormat::Esm,
            EntryFormat::CommonJs => ModuleFormat::Cjs,
        };

        let extension = OutputExtension::from_output(&entry.output).ok_or_else(|| {
            Error::UnresolvableOutputKind {
                path: entry.output.clone(),
            }
        })?;
        let kind = PlanKind::Module { format, extension };

        modules
            .entry(kind)
            .or_insert_with(|| {
                BuildPlan::new(
                    kind,
                    OutputNaming::module(layout, extension),
                    Arc::clone(&externals),
                )
            })
            .add(entry, source);
    }

    Ok(modules.into_values().chain(declarations).collect())
}
