//! Run build plans and write their output.
//!
//! Plans run concurrently on a `JoinSet`, bounded by a semaphore. Stale
//! outputs are removed before the first plan starts. A failing plan does not
//! cancel the others; failures are reported together once every plan has
//! finished, and files already written stay in place.

use indexmap::IndexSet;
use path_clean::PathClean;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::compiler::{CompileOptions, CompileRequest, Compiler, EmittedFile};
use crate::diagnostics::{DiagnosticKind, ExtractedDiagnostic};
use crate::output::{make_executable, remove_stale, with_shebang, write_files};
use crate::plan::{BuildPlan, PlanKind};
use crate::{Error, Result};

/// What one plan produced.
#[derive(Debug, Clone)]
pub struct PlanReport {
    pub kind: PlanKind,
    /// Written files, absolute.
    pub files: Vec<PathBuf>,
    /// Written files that were made executable.
    pub executables: Vec<PathBuf>,
    pub duration: Duration,
}

/// Outcome of a successful build.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// In plan order.
    pub plans: Vec<PlanReport>,
    /// Stale files removed before building.
    pub removed: usize,
}

impl BuildReport {
    pub fn file_count(&self) -> usize {
        self.plans.iter().map(|plan| plan.files.len()).sum()
    }
}

/// Dispatches plans to their compiler and writes the results.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    modules: Arc<dyn Compiler>,
    declarations: Arc<dyn Compiler>,
    options: Arc<CompileOptions>,
    max_parallel: usize,
}

impl Orchestrator {
    pub fn new(
        modules: Arc<dyn Compiler>,
        declarations: Arc<dyn Compiler>,
        options: Arc<CompileOptions>,
    ) -> Self {
        Self {
            modules,
            declarations,
            options,
            max_parallel: num_cpus::get().min(8),
        }
    }

    /// Limit how many plans compile at once.
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    /// Build every plan. See the module docs for the failure semantics.
    pub async fn run(&self, plans: &[BuildPlan]) -> Result<BuildReport> {
        let removed = self.remove_stale_outputs(plans).await?;

        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let mut join_set = JoinSet::new();

        for (index, plan) in plans.iter().enumerate() {
            let compiler = if plan.is_declarations() {
                Arc::clone(&self.declarations)
            } else {
                Arc::clone(&self.modules)
            };
            let request = CompileRequest::from_plan(plan, Arc::clone(&self.options));
            let executables: IndexSet<String> = plan
                .executables
                .iter()
                .filter_map(|output| plan.naming.relative_to_dist(output))
                .map(str::to_string)
                .collect();
            let out_dir = self.options.out_dir.clone();
            let semaphore = Arc::clone(&semaphore);

            join_set.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => run_plan(compiler, request, executables, out_dir).await,
                    Err(e) => Err(internal_error(format!("build queue closed: {e}"))),
                };
                (index, result)
            });
        }

        let mut reports: Vec<Option<PlanReport>> = vec![None; plans.len()];
        let mut failures = Vec::new();

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, Ok(report))) => reports[index] = Some(report),
                Ok((index, Err(error))) => {
                    debug!(plan = %plans[index].kind, error = %error, "Plan failed");
                    failures.push(error);
                }
                Err(join_error) => {
                    failures.push(internal_error(format!("build task panicked: {join_error}")));
                }
            }
        }

        if !failures.is_empty() {
            return Err(combine_failures(failures));
        }

        Ok(BuildReport {
            plans: reports.into_iter().flatten().collect(),
            removed,
        })
    }

    async fn remove_stale_outputs(&self, plans: &[BuildPlan]) -> Result<usize> {
        let cwd = self.options.cwd.clone();
        let outputs: IndexSet<PathBuf> = plans
            .iter()
            .flat_map(|plan| plan.outputs())
            .map(|output| cwd.join(output).clean())
            .collect();

        tokio::task::spawn_blocking(move || remove_stale(outputs.iter().map(PathBuf::as_path)))
            .await
            .map_err(|e| internal_error(format!("stale output removal panicked: {e}")))?
    }
}

async fn run_plan(
    compiler: Arc<dyn Compiler>,
    request: CompileRequest,
    executables: IndexSet<String>,
    out_dir: PathBuf,
) -> Result<PlanReport> {
    let kind = request.kind;
    let started = Instant::now();
    info!(plan = %kind, inputs = request.inputs.len(), "Building");

    let files: Vec<EmittedFile> = compiler
        .compile(request)
        .await?
        .into_iter()
        .map(|mut file| {
            if executables.contains(&file.filename) {
                file.contents = with_shebang(file.contents);
            }
            file
        })
        .collect();

    let (files, executables) = tokio::task::spawn_blocking(move || {
        let written = write_files(&out_dir, &files)?;
        let mut made_executable = Vec::new();
        for (file, path) in files.iter().zip(&written) {
            if executables.contains(&file.filename) {
                make_executable(path)?;
                made_executable.push(path.clone());
            }
        }
        Ok::<_, Error>((written, made_executable))
    })
    .await
    .map_err(|e| internal_error(format!("output writer panicked: {e}")))??;

    let duration = started.elapsed();
    info!(plan = %kind, files = files.len(), elapsed_ms = duration.as_millis() as u64, "Built");

    Ok(PlanReport {
        kind,
        files,
        executables,
        duration,
    })
}

fn internal_error(message: String) -> Error {
    Error::Bundling(vec![
        ExtractedDiagnostic::error(DiagnosticKind::Internal, message)
            .with_help("This is a bug in pkgup. Please report it."),
    ])
}

/// One failure is returned as is; several are flattened into one
/// [`Error::Bundling`].
fn combine_failures(mut failures: Vec<Error>) -> Error {
    if failures.len() == 1 {
        if let Some(error) = failures.pop() {
            return error;
        }
    }

    let diagnostics = failures
        .into_iter()
        .flat_map(|error| match error {
            Error::Bundling(diagnostics) => diagnostics,
            other => vec![ExtractedDiagnostic::error(DiagnosticKind::Other, other.to_string())],
        })
        .collect();
    Error::Bundling(diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{EntryFormat, EntryPoint, EntryRegistry, Layout, ManifestField, Provenance, Registration};
    use crate::manifest::Externals;
    use crate::plan::plan_builds;
    use async_trait::async_trait;
    use std::fs;
    use tempfile::TempDir;

    /// Emits one file per input named after the plan's naming, or fails.
    #[derive(Debug)]
    struct FakeCompiler {
        body: &'static str,
        fail: bool,
    }

    #[async_trait]
    impl Compiler for FakeCompiler {
        async fn compile(&self, request: CompileRequest) -> Result<Vec<EmittedFile>> {
            if self.fail {
                return Err(Error::Bundling(vec![
                    ExtractedDiagnostic::error(DiagnosticKind::Transform, "boom")
                        .with_file(request.inputs[0].clone()),
                ]));
            }
            Ok(request
                .inputs
                .iter()
                .flat_map(|source| request.naming.names_for(source))
                .map(|name| {
                    let filename = request.naming.relative_to_dist(&name).unwrap_or(&name).to_string();
                    EmittedFile::new(filename, self.body)
                })
                .collect())
        }
    }

    fn fake(body: &'static str) -> Arc<dyn Compiler> {
        Arc::new(FakeCompiler { body, fail: false })
    }

    fn failing() -> Arc<dyn Compiler> {
        Arc::new(FakeCompiler { body: "", fail: true })
    }

    fn plans(temp: &TempDir, entries: &[(EntryFormat, ManifestField, &str, &str)]) -> Vec<BuildPlan> {
        let registry = EntryRegistry::merge(entries.iter().map(|(format, field, output, source)| {
            let mut entry = EntryPoint::new(*format, Provenance::field(*field), *output);
            entry.source = Some(source.to_string());
            Registration::new(entry)
        }));
        let layout = Layout::new(temp.path(), "./src", "./dist");
        plan_builds(&registry, Arc::new(Externals::default()), &layout).unwrap()
    }

    fn options(temp: &TempDir) -> Arc<CompileOptions> {
        Arc::new(CompileOptions::new(temp.path(), temp.path().join("dist")))
    }

    #[tokio::test]
    async fn test_executable_gets_shebang_and_mode() {
        let temp = TempDir::new().unwrap();
        let plans = plans(
            &temp,
            &[
                (EntryFormat::EcmaScriptModule, ManifestField::Main, "./dist/index.js", "./src/index.ts"),
                (EntryFormat::EcmaScriptModule, ManifestField::Bin, "./dist/cli.js", "./src/cli.ts"),
            ],
        );
        let orchestrator = Orchestrator::new(fake("run();\n"), fake(""), options(&temp));

        let report = orchestrator.run(&plans).await.unwrap();

        assert_eq!(report.plans.len(), 1);
        assert_eq!(report.file_count(), 2);
        let cli = temp.path().join("dist/cli.js");
        assert_eq!(report.plans[0].executables, vec![cli.clone()]);
        assert_eq!(
            fs::read_to_string(&cli).unwrap(),
            "#!/usr/bin/env node\nrun();\n"
        );
        assert_eq!(
            fs::read_to_string(temp.path().join("dist/index.js")).unwrap(),
            "run();\n"
        );

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&cli).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[tokio::test]
    async fn test_existing_shebang_is_kept() {
        let temp = TempDir::new().unwrap();
        let plans = plans(
            &temp,
            &[(EntryFormat::CommonJs, ManifestField::Bin, "./dist/cli.js", "./src/cli.ts")],
        );
        let orchestrator = Orchestrator::new(fake("#!/usr/bin/env -S node --no-warnings\nrun();\n"), fake(""), options(&temp));

        orchestrator.run(&plans).await.unwrap();

        assert_eq!(
            fs::read_to_string(temp.path().join("dist/cli.js")).unwrap(),
            "#!/usr/bin/env -S node --no-warnings\nrun();\n"
        );
    }

    #[tokio::test]
    async fn test_stale_outputs_removed_before_build() {
        let temp = TempDir::new().unwrap();
        let dist = temp.path().join("dist");
        fs::create_dir_all(&dist).unwrap();
        fs::write(dist.join("index.js.map"), "{}").unwrap();
        fs::write(dist.join("unrelated.txt"), "keep").unwrap();

        let plans = plans(
            &temp,
            &[(EntryFormat::CommonJs, ManifestField::Main, "./dist/index.js", "./src/index.ts")],
        );
        let orchestrator = Orchestrator::new(fake("module.exports = 1;\n"), fake(""), options(&temp));

        let report = orchestrator.run(&plans).await.unwrap();

        assert_eq!(report.removed, 1);
        assert!(!dist.join("index.js.map").exists());
        assert!(dist.join("unrelated.txt").exists());
        assert!(dist.join("index.js").exists());
    }

    #[tokio::test]
    async fn test_declarations_go_through_declaration_compiler() {
        let temp = TempDir::new().unwrap();
        let plans = plans(
            &temp,
            &[
                (EntryFormat::TypeDeclaration, ManifestField::Types, "./dist/index.d.ts", "./src/index.ts"),
                (EntryFormat::EcmaScriptModule, ManifestField::Module, "./dist/index.mjs", "./src/index.ts"),
            ],
        );
        let orchestrator = Orchestrator::new(fake("export {};\n"), fake("export declare const x: 1;\n"), options(&temp));

        let report = orchestrator.run(&plans).await.unwrap();

        assert_eq!(report.plans.len(), 2);
        assert_eq!(report.plans[1].kind, PlanKind::Declarations);
        assert_eq!(
            fs::read_to_string(temp.path().join("dist/index.d.ts")).unwrap(),
            "export declare const x: 1;\n"
        );
        assert_eq!(
            fs::read_to_string(temp.path().join("dist/index.mjs")).unwrap(),
            "export {};\n"
        );
    }

    #[tokio::test]
    async fn test_failure_reported_after_other_plans_finish() {
        let temp = TempDir::new().unwrap();
        let plans = plans(
            &temp,
            &[
                (EntryFormat::TypeDeclaration, ManifestField::Types, "./dist/index.d.ts", "./src/index.ts"),
                (EntryFormat::EcmaScriptModule, ManifestField::Module, "./dist/index.mjs", "./src/index.ts"),
            ],
        );
        let orchestrator = Orchestrator::new(failing(), fake("export {};\n"), options(&temp)).with_max_parallel(1);

        let err = orchestrator.run(&plans).await.unwrap_err();

        let Error::Bundling(diagnostics) = err else {
            panic!("expected bundling error, got {err:?}");
        };
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "boom");
        assert!(temp.path().join("dist/index.d.ts").exists());
    }

    #[tokio::test]
    async fn test_failures_are_flattened() {
        let temp = TempDir::new().unwrap();
        let plans = plans(
            &temp,
            &[
                (EntryFormat::CommonJs, ManifestField::Main, "./dist/index.js", "./src/index.ts"),
                (EntryFormat::EcmaScriptModule, ManifestField::Module, "./dist/index.mjs", "./src/index.ts"),
            ],
        );
        let orchestrator = Orchestrator::new(failing(), fake(""), options(&temp));

        let Err(Error::Bundling(diagnostics)) = orchestrator.run(&plans).await else {
            panic!("expected bundling error");
        };
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_combine_single_failure_kept() {
        let error = combine_failures(vec![Error::InvalidOutputPath("x".to_string())]);
        assert!(matches!(error, Error::InvalidOutputPath(_)));
    }
}
