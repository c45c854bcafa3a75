//! Ordered, last-write-wins merge of entry declarations.
//!
//! The manifest fields are registered in a fixed order (`main`, `module`,
//! `types`, `bin`, `exports`, then manual entries). Two registrations with
//! the same output collapse into one entry whose fields come from the later
//! one, except `executable`, which stays set once a `bin` declaration has
//! reached the output.

use indexmap::IndexMap;
use tracing::debug;

use super::exports::parse_exports;
use super::locate::{OutputKind, SourceLocator, output_for_source};
use super::path::normalize_under;
use super::{EntryFormat, EntryPoint, Layout, ManifestField, Provenance};
use crate::manifest::{Bin, PackageJson};
use crate::runtime::Runtime;
use crate::{Error, Result};

/// Infer the format of an output path.
///
/// `.mjs` is always ESM, `.cjs` always CommonJS, `.d.ts`/`.d.mts`/`.d.cts`
/// always declarations; anything else takes `default`.
pub fn infer_format(path: &str, default: EntryFormat) -> EntryFormat {
    match OutputKind::split(path) {
        Some((OutputKind::Mjs, _)) => EntryFormat::EcmaScriptModule,
        Some((OutputKind::Cjs, _)) => EntryFormat::CommonJs,
        Some((kind, _)) if kind.is_declaration() => EntryFormat::TypeDeclaration,
        _ => default,
    }
}

fn non_empty(path: Option<&str>) -> Option<&str> {
    path.filter(|path| !path.is_empty())
}

/// One entry declaration, in registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    entry: EntryPoint,
}

impl Registration {
    pub fn new(entry: EntryPoint) -> Self {
        Self { entry }
    }

    pub fn entry(&self) -> &EntryPoint {
        &self.entry
    }

    /// Every declaration of `manifest` followed by the `manual` sources.
    ///
    /// # Errors
    ///
    /// Manual sources outside the source directory or with an extension
    /// that maps to no output kind.
    pub fn sequence(
        manifest: &PackageJson,
        manual: &[String],
        layout: &Layout,
    ) -> Result<Vec<Registration>> {
        let default = manifest.package_type.default_format();
        let mut sequence = Vec::new();
        let mut push = |entry: EntryPoint| sequence.push(Registration::new(entry));

        // Empty strings declare nothing.
        if let Some(main) = non_empty(manifest.main.as_deref()) {
            push(EntryPoint::new(
                infer_format(main, default),
                Provenance::field(ManifestField::Main),
                main,
            ));
        }

        if let Some(module) = non_empty(manifest.module.as_deref()) {
            push(EntryPoint::new(
                infer_format(module, default),
                Provenance::field(ManifestField::Module),
                module,
            ));
        }

        if let Some(types) = non_empty(manifest.types_path()) {
            push(EntryPoint::new(
                EntryFormat::TypeDeclaration,
                Provenance::field(ManifestField::Types),
                types,
            ));
        }

        match &manifest.bin {
            Some(Bin::Single(path)) if !path.is_empty() => push(EntryPoint::new(
                infer_format(path, default),
                Provenance::field(ManifestField::Bin),
                path.as_str(),
            )),
            Some(Bin::Single(_)) => {}
            Some(Bin::Map(map)) => {
                let bin = Provenance::field(ManifestField::Bin);
                for (name, path) in map.iter().filter(|(_, path)| !path.is_empty()) {
                    push(EntryPoint::new(
                        infer_format(path, default),
                        bin.key(name.as_str()),
                        path.as_str(),
                    ));
                }
            }
            None => {}
        }

        if let Some(exports) = &manifest.exports {
            for record in parse_exports(exports, Provenance::field(ManifestField::Exports), default)
            {
                push(
                    EntryPoint::new(record.format, record.provenance, record.output)
                        .with_condition(record.condition),
                );
            }
        }

        for source in manual {
            let source = normalize_under(source, &layout.cwd);
            let output = output_for_source(&source, &layout.src_dir, &layout.dist_dir)?;
            let mut entry = EntryPoint::new(
                infer_format(&output, default),
                Provenance::manual(),
                output,
            );
            entry.source = Some(source);
            push(entry);
        }

        Ok(sequence)
    }
}

/// Immutable snapshot of merged entries keyed by normalized output path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryRegistry {
    entries: IndexMap<String, EntryPoint>,
}

impl EntryRegistry {
    /// Merge registrations in order; later ones overwrite earlier ones with
    /// the same output.
    pub fn merge(registrations: impl IntoIterator<Item = Registration>) -> Self {
        let mut entries: IndexMap<String, EntryPoint> = IndexMap::new();

        for Registration { entry } in registrations {
            match entries.get_mut(&entry.output) {
                Some(existing) => {
                    debug!(
                        output = %entry.output,
                        from = %existing.provenance,
                        to = %entry.provenance,
                        "entry overwritten by later declaration"
                    );
                    let executable = existing.executable || entry.executable;
                    *existing = EntryPoint {
                        executable,
                        ..entry
                    };
                }
                None => {
                    entries.insert(entry.output.clone(), entry);
                }
            }
        }

        Self { entries }
    }

    pub fn get(&self, output: &str) -> Option<&EntryPoint> {
        self.entries.get(output)
    }

    /// Entries in first-registration order.
    pub fn entries(&self) -> impl Iterator<Item = &EntryPoint> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fill in the source of every entry.
    ///
    /// Manifest entries are located by probing; manual entries already name
    /// their source, which only has to exist.
    ///
    /// # Errors
    ///
    /// [`Error::SourceNotFound`] for the first entry without a source.
    pub async fn resolve_sources(
        self,
        locator: &SourceLocator,
        runtime: &dyn Runtime,
        layout: &Layout,
    ) -> Result<Self> {
        let mut entries = self.entries;

        for entry in entries.values_mut() {
            match &entry.source {
                Some(source) => {
                    let path = layout.cwd.join(source);
                    if !runtime.is_file(&path).await {
                        return Err(Error::SourceNotFound {
                            output: entry.output.clone(),
                        });
                    }
                }
                None => {
                    let source = locator
                        .locate(&entry.output, &layout.src_dir, &layout.dist_dir)
                        .await?;
                    entry.source = Some(source);
                }
            }
        }

        Ok(Self { entries })
    }
}

impl<'a> IntoIterator for &'a EntryRegistry {
    type Item = &'a EntryPoint;
    type IntoIter = indexmap::map::Values<'a, String, EntryPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}
