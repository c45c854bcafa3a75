//! Module plans through Rolldown.

use async_trait::async_trait;
use rolldown::{
    BundlerBuilder, BundlerOptions, InputItem, OutputFormat, Platform, RawMinifyOptions,
    ResolveOptions, SourceMapType,
};
use rolldown_common::Output;
use std::sync::Arc;
use tracing::debug;

use super::{CompileRequest, Compiler, EmittedFile};
use crate::plan::{ModuleFormat, PlanKind};
use crate::plugins::{
    ExternalsPlugin, NodeBuiltinsPlugin, PluginRegistry, StripHashbangPlugin, TypeScriptJsPlugin,
    VersionPlugin,
};
use crate::{Error, Result};

/// Bundles one module plan: every input becomes a named entry chunk, shared
/// code goes to `[name]-[hash]` chunks.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolldownCompiler;

impl RolldownCompiler {
    pub fn new() -> Self {
        Self
    }
}

fn input_items(request: &CompileRequest) -> Result<Vec<InputItem>> {
    request
        .inputs
        .iter()
        .map(|source| {
            let name = request.naming.stem(source).ok_or_else(|| Error::PathOutsideSource {
                path: source.clone(),
                src_dir: request.naming.src_dir().to_string(),
            })?;
            Ok(InputItem {
                name: Some(name.to_string()),
                import: source.clone(),
            })
        })
        .collect()
}

fn configure_options(request: &CompileRequest, format: ModuleFormat) -> Result<BundlerOptions> {
    let options = &request.options;
    let extension = request.naming.extension();

    let format = match format {
        ModuleFormat::Esm => OutputFormat::Esm,
        ModuleFormat::Cjs => OutputFormat::Cjs,
    };
    let platform = if options.node_platform {
        Platform::Node
    } else {
        Platform::Browser
    };
    let main_fields = if options.node_platform {
        vec!["module".to_string(), "main".to_string()]
    } else {
        vec!["browser".to_string(), "module".to_string(), "main".to_string()]
    };

    Ok(BundlerOptions {
        input: Some(input_items(request)?),
        cwd: Some(options.cwd.clone()),
        dir: Some(options.out_dir.to_string_lossy().into_owned()),
        format: Some(format),
        platform: Some(platform),
        entry_filenames: Some(format!("[name]{extension}").into()),
        chunk_filenames: Some(format!("[name]-[hash]{extension}").into()),
        sourcemap: options.sourcemap.then_some(SourceMapType::File),
        minify: options.minify.then(|| RawMinifyOptions::from(true)),
        resolve: Some(ResolveOptions {
            main_fields: Some(main_fields),
            extensions: Some(
                [".ts", ".tsx", ".mts", ".cts", ".js", ".jsx", ".mjs", ".cjs", ".json"]
                    .map(str::to_string)
                    .to_vec(),
            ),
            ..Default::default()
        }),
        ..Default::default()
    })
}

#[async_trait]
impl Compiler for RolldownCompiler {
    async fn compile(&self, request: CompileRequest) -> Result<Vec<EmittedFile>> {
        let PlanKind::Module { format, .. } = request.kind else {
            return Err(Error::InvalidConfig(format!(
                "rolldown cannot compile a {} plan",
                request.kind
            )));
        };

        let options = configure_options(&request, format)?;

        let mut registry = PluginRegistry::new();
        registry.add(NodeBuiltinsPlugin);
        registry.add(ExternalsPlugin::new(Arc::clone(&request.externals)));
        registry.add(TypeScriptJsPlugin::new());
        registry.add(StripHashbangPlugin);
        registry.add(VersionPlugin::new(request.options.version.clone()));

        debug!(
            plan = %request.kind,
            inputs = request.inputs.len(),
            plugins = registry.len(),
            "Starting rolldown"
        );

        let mut bundler = BundlerBuilder::default()
            .with_options(options)
            .with_plugins(registry.into_rolldown_plugins())
            .build()
            .map_err(|e| Error::from_rolldown_batch(&e))?;

        let bundle = bundler
            .generate()
            .await
            .map_err(|e| Error::from_rolldown_batch(&e))?;

        let files = bundle
            .assets
            .iter()
            .map(|output| match output {
                Output::Chunk(chunk) => {
                    EmittedFile::new(chunk.filename.as_str(), chunk.code.as_bytes())
                }
                Output::Asset(asset) => {
                    EmittedFile::new(asset.filename.as_str(), asset.source.as_bytes())
                }
            })
            .collect();

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompileOptions;
    use crate::entry::Layout;
    use crate::manifest::Externals;
    use crate::plan::{OutputExtension, OutputNaming};
    use indexmap::IndexSet;

    fn request(kind: PlanKind, inputs: &[&str]) -> CompileRequest {
        let layout = Layout::default();
        CompileRequest {
            kind,
            inputs: inputs.iter().map(|s| s.to_string()).collect::<IndexSet<_>>(),
            naming: OutputNaming::module(&layout, OutputExtension::Mjs),
            externals: Arc::new(Externals::default()),
            options: Arc::new(CompileOptions::new("/pkg", "/pkg/dist")),
        }
    }

    #[test]
    fn test_inputs_named_by_stem() {
        let kind = PlanKind::Module {
            format: ModuleFormat::Esm,
            extension: OutputExtension::Mjs,
        };
        let request = request(kind, &["./src/index.ts", "./src/bin/cli.ts"]);
        let options = configure_options(&request, ModuleFormat::Esm).unwrap();

        let names: Vec<_> = options
            .input
            .unwrap()
            .into_iter()
            .map(|item| (item.name.unwrap(), item.import))
            .collect();
        assert_eq!(
            names,
            vec![
                ("index".to_string(), "./src/index.ts".to_string()),
                ("bin/cli".to_string(), "./src/bin/cli.ts".to_string()),
            ]
        );
        assert!(options.sourcemap.is_none());
        assert!(options.minify.is_none());
    }

    #[test]
    fn test_input_outside_source_dir() {
        let kind = PlanKind::Module {
            format: ModuleFormat::Cjs,
            extension: OutputExtension::Mjs,
        };
        let request = request(kind, &["./lib/index.ts"]);
        assert!(matches!(
            configure_options(&request, ModuleFormat::Cjs),
            Err(Error::PathOutsideSource { .. })
        ));
    }

    #[tokio::test]
    async fn test_rejects_declaration_plan() {
        let request = request(PlanKind::Declarations, &["./src/index.ts"]);
        let result = RolldownCompiler::new().compile(request).await;
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
