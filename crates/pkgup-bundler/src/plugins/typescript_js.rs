//! Resolve TypeScript-style `.js` specifiers to the `.ts` file on disk.
//!
//! TypeScript sources import `./util.js` while the file next to them is
//! `./util.ts`. Rolldown would fail to find it, so relative imports with a
//! JavaScript extension are retried with the matching TypeScript extension.

use rolldown_plugin::{HookResolveIdArgs, HookResolveIdOutput, HookResolveIdReturn, Plugin, PluginContext};
use path_clean::PathClean;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

use super::registry::{PkgupPlugin, PluginPhase};

const REMAPS: &[(&str, &str)] = &[(".js", ".ts"), (".mjs", ".mts"), (".cjs", ".cts"), (".jsx", ".tsx")];

/// The TypeScript spelling of a relative JavaScript specifier.
pub(crate) fn ts_specifier(specifier: &str) -> Option<String> {
    if !(specifier.starts_with("./") || specifier.starts_with("../")) {
        return None;
    }
    REMAPS.iter().find_map(|(js, ts)| {
        specifier
            .strip_suffix(js)
            .map(|stem| format!("{stem}{ts}"))
    })
}

/// Path of the TypeScript file `specifier` refers to from `importer`.
fn ts_candidate(specifier: &str, importer: &str) -> Option<PathBuf> {
    let candidate = ts_specifier(specifier)?;
    let dir = Path::new(importer).parent()?;
    Some(dir.join(candidate).clean())
}

async fn existing_file(path: PathBuf) -> Option<PathBuf> {
    match tokio::fs::metadata(&path).await {
        Ok(metadata) if metadata.is_file() => Some(path),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptJsPlugin;

impl TypeScriptJsPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for TypeScriptJsPlugin {
    fn name(&self) -> Cow<'static, str> {
        "pkgup:typescript-js".into()
    }

    fn register_hook_usage(&self) -> rolldown_plugin::HookUsage {
        rolldown_plugin::HookUsage::ResolveId
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs<'_>,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let candidate = args
            .importer
            .and_then(|importer| ts_candidate(args.specifier, importer));

        async move {
            let resolved = match candidate {
                Some(path) => existing_file(path).await,
                None => None,
            };
            Ok(resolved.map(|path| HookResolveIdOutput {
                id: path.to_string_lossy().into_owned().into(),
                ..Default::default()
            }))
        }
    }
}

impl PkgupPlugin for TypeScriptJsPlugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::Resolve
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ts_specifier() {
        assert_eq!(ts_specifier("./util.js").as_deref(), Some("./util.ts"));
        assert_eq!(ts_specifier("../lib/a.mjs").as_deref(), Some("../lib/a.mts"));
        assert_eq!(ts_specifier("./a.cjs").as_deref(), Some("./a.cts"));
        assert_eq!(ts_specifier("./view.jsx").as_deref(), Some("./view.tsx"));
        assert_eq!(ts_specifier("./util.ts"), None);
        assert_eq!(ts_specifier("lodash/fp.js"), None);
        assert_eq!(ts_specifier("./data.json"), None);
    }

    #[tokio::test]
    async fn test_candidate_must_exist() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("index.ts"), "").unwrap();
        std::fs::write(temp.path().join("util.ts"), "").unwrap();
        std::fs::create_dir(temp.path().join("dir.ts")).unwrap();
        let importer = temp.path().join("index.ts");
        let importer = importer.to_str().unwrap();

        let util = ts_candidate("./util.js", importer).unwrap();
        assert_eq!(util, temp.path().join("util.ts"));
        assert_eq!(existing_file(util).await, Some(temp.path().join("util.ts")));

        let missing = ts_candidate("./missing.js", importer).unwrap();
        assert_eq!(existing_file(missing).await, None);

        let dir = ts_candidate("./dir.js", importer).unwrap();
        assert_eq!(existing_file(dir).await, None);

        assert_eq!(ts_candidate("lodash/fp.js", importer), None);
    }
}
