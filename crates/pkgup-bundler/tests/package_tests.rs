//! End-to-end resolution and build scenarios on real package directories.

mod helpers;

use helpers::{echo, native_runtime, package, read, resolve_options};
use pkgup_bundler::{
    CompileOptions, EntryFormat, Error, ManifestField, ModuleFormat, Orchestrator,
    OutputExtension, PlanKind, resolve,
};
use std::sync::Arc;

#[tokio::test]
async fn main_only_resolves_by_precedence() {
    let dir = package(&[
        ("package.json", r#"{ "name": "a", "main": "./dist/index.js" }"#),
        ("src/index.js", "module.exports = 1;"),
        ("src/index.ts", "export default 1;"),
    ]);

    let resolution = resolve(native_runtime(), &resolve_options(dir.path()))
        .await
        .unwrap();

    let entries: Vec<_> = resolution.registry.entries().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].output, "./dist/index.js");
    assert_eq!(entries[0].source.as_deref(), Some("./src/index.js"));
    assert_eq!(entries[0].format, EntryFormat::CommonJs);
}

#[tokio::test]
async fn import_and_require_at_one_subpath() {
    let dir = package(&[
        (
            "package.json",
            r#"{ "exports": { "./utils": { "import": "./dist/utils.mjs", "require": "./dist/utils.cjs" } } }"#,
        ),
        ("src/utils.ts", "export const x = 1;"),
    ]);

    let resolution = resolve(native_runtime(), &resolve_options(dir.path()))
        .await
        .unwrap();

    let mjs = resolution.registry.get("./dist/utils.mjs").unwrap();
    let cjs = resolution.registry.get("./dist/utils.cjs").unwrap();
    assert_eq!(mjs.format, EntryFormat::EcmaScriptModule);
    assert_eq!(cjs.format, EntryFormat::CommonJs);
    assert_eq!(mjs.source, cjs.source);
    assert_eq!(mjs.provenance.to_string(), "exports./utils.import");

    let kinds: Vec<_> = resolution.plans.iter().map(|plan| plan.kind).collect();
    assert_eq!(
        kinds,
        vec![
            PlanKind::Module {
                format: ModuleFormat::Esm,
                extension: OutputExtension::Mjs
            },
            PlanKind::Module {
                format: ModuleFormat::Cjs,
                extension: OutputExtension::Cjs
            },
        ]
    );
}

#[tokio::test]
async fn bin_and_main_share_one_executable_entry() {
    let dir = package(&[
        (
            "package.json",
            r#"{ "main": "./dist/index.js", "bin": "./dist/index.js" }"#,
        ),
        ("src/index.ts", "console.log(1);"),
    ]);

    let resolution = resolve(native_runtime(), &resolve_options(dir.path()))
        .await
        .unwrap();

    assert_eq!(resolution.registry.len(), 1);
    let entry = resolution.registry.get("./dist/index.js").unwrap();
    assert!(entry.executable);
    assert_eq!(entry.provenance.manifest_field(), ManifestField::Bin);
}

#[tokio::test]
async fn module_package_with_bin_map_builds_executable() {
    let dir = package(&[
        (
            "package.json",
            r#"{ "type": "module", "version": "1.0.0", "main": "./dist/index.js",
                 "bin": { "tool": "./dist/cli.js" } }"#,
        ),
        ("src/index.ts", "export const x = 1;"),
        ("src/cli.ts", "console.log('hi');"),
    ]);

    let resolution = resolve(native_runtime(), &resolve_options(dir.path()))
        .await
        .unwrap();

    assert_eq!(resolution.plans.len(), 1);
    assert!(
        resolution
            .registry
            .entries()
            .all(|entry| entry.format == EntryFormat::EcmaScriptModule)
    );

    let orchestrator = Orchestrator::new(echo(), echo(), Arc::new(resolution.compile_options()));
    let report = orchestrator.run(&resolution.plans).await.unwrap();

    assert_eq!(report.file_count(), 2);
    assert_eq!(
        read(dir.path(), "dist/cli.js"),
        "#!/usr/bin/env node\n// ./src/cli.ts\n"
    );
    assert_eq!(read(dir.path(), "dist/index.js"), "// ./src/index.ts\n");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(dir.path().join("dist/cli.js"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}

#[tokio::test]
async fn types_and_import_from_one_source() {
    let dir = package(&[
        (
            "package.json",
            r#"{ "exports": { ".": { "types": "./dist/index.d.ts", "import": "./dist/index.js" } } }"#,
        ),
        ("src/index.ts", "export const x: number = 1;"),
    ]);

    let resolution = resolve(native_runtime(), &resolve_options(dir.path()))
        .await
        .unwrap();

    let entries: Vec<_> = resolution.registry.entries().collect();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.source.as_deref() == Some("./src/index.ts")));
    assert_eq!(resolution.plans.len(), 2);
    assert!(resolution.plans[1].is_declarations());

    let orchestrator = Orchestrator::new(echo(), echo(), Arc::new(resolution.compile_options()));
    orchestrator.run(&resolution.plans).await.unwrap();
    assert_eq!(read(dir.path(), "dist/index.d.ts"), "// ./src/index.ts\n");
}

#[tokio::test]
async fn missing_source_fails_before_output_is_touched() {
    let dir = package(&[
        (
            "package.json",
            r#"{ "main": "./dist/index.js", "module": "./dist/missing.mjs" }"#,
        ),
        ("src/index.ts", "export {};"),
        ("dist/index.js", "stale"),
    ]);

    let err = resolve(native_runtime(), &resolve_options(dir.path()))
        .await
        .unwrap_err();

    assert!(matches!(&err, Error::SourceNotFound { output } if output == "./dist/missing.mjs"));
    assert_eq!(read(dir.path(), "dist/index.js"), "stale");
}

#[tokio::test]
async fn manual_entries_join_manifest_entries() {
    let dir = package(&[
        ("package.json", r#"{ "type": "module" }"#),
        ("src/extra/tool.ts", "export {};"),
    ]);
    let mut options = resolve_options(dir.path());
    options.entries = vec!["src/extra/tool.ts".to_string()];

    let resolution = resolve(native_runtime(), &options).await.unwrap();

    let entry = resolution.registry.get("./dist/extra/tool.js").unwrap();
    assert_eq!(entry.source.as_deref(), Some("./src/extra/tool.ts"));
    assert_eq!(entry.provenance.manifest_field(), ManifestField::Manual);
}

#[tokio::test]
async fn manual_entry_outside_source_dir() {
    let dir = package(&[("package.json", "{}"), ("lib/tool.ts", "export {};")]);
    let mut options = resolve_options(dir.path());
    options.entries = vec!["lib/tool.ts".to_string()];

    let err = resolve(native_runtime(), &options).await.unwrap_err();
    assert!(matches!(err, Error::PathOutsideSource { .. }));
}

#[tokio::test]
async fn manifest_found_in_parent_directory() {
    let dir = package(&[
        ("package.json", r#"{ "main": "./dist/index.js" }"#),
        ("packages/inner/src/index.ts", "export {};"),
    ]);
    let inner = dir.path().join("packages/inner");

    let resolution = resolve(native_runtime(), &resolve_options(&inner))
        .await
        .unwrap();

    assert_eq!(resolution.manifest.path, dir.path().join("package.json"));
    let options: CompileOptions = resolution.compile_options();
    assert_eq!(options.out_dir, inner.join("dist"));
}

#[tokio::test]
async fn invalid_manifest() {
    let dir = package(&[("package.json", "{ not json")]);
    let err = resolve(native_runtime(), &resolve_options(dir.path()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ManifestInvalid { .. }));
}
