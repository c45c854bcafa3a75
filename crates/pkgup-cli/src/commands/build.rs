//! Build command implementation.
//!
//! Implements `pkgup build`: resolve the package, run every plan and report
//! what was written.

use crate::cli::BuildArgs;
use crate::commands::utils::{self, Project};
use crate::error::{BuildError, CliError, Result};
use crate::ui;
use pkgup_bundler::{BuildReport, DeclarationCompiler, Orchestrator, RolldownCompiler};
use std::sync::Arc;
use std::time::Instant;

/// Execute the build command.
///
/// # Build Process
///
/// 1. Load and validate configuration (CLI > Env > File > Defaults)
/// 2. Resolve every declared entry to its source and plan the build
/// 3. Run the plans, replacing stale outputs
/// 4. Display build summary
///
/// # Errors
///
/// Configuration and resolution errors are returned before anything is
/// written; compiler diagnostics come back as [`CliError::Bundle`].
pub async fn execute(args: BuildArgs) -> Result<()> {
    let start_time = Instant::now();
    let launch_dir = utils::get_cwd()?;

    let project = utils::resolve_project(&args.project, &launch_dir).await?;
    let report = build(&project).await?;

    ui::print_build_summary(&report, &project.cwd);
    ui::success(&format!(
        "Build completed in {}",
        ui::format_duration(start_time.elapsed())
    ));

    Ok(())
}

/// Run every plan of a resolved project.
pub async fn build(project: &Project) -> Result<BuildReport> {
    let resolution = &project.resolution;
    if resolution.plans.is_empty() {
        return Err(BuildError::NoEntries(resolution.manifest.path.clone()).into());
    }

    let dist = resolution.layout.dist_path();
    utils::ensure_output_dir(&dist)?;

    tracing::info!(
        entries = resolution.registry.len(),
        plans = resolution.plans.len(),
        out_dir = %dist.display(),
        "Building"
    );

    let orchestrator = Orchestrator::new(
        Arc::new(RolldownCompiler::new()),
        Arc::new(DeclarationCompiler::new(utils::runtime())),
        Arc::new(resolution.compile_options()),
    );

    let spinner = ui::Spinner::new(&format!("Building {} entries...", resolution.registry.len()));
    match orchestrator.run(&resolution.plans).await {
        Ok(report) => {
            spinner.clear();
            Ok(report)
        }
        Err(source) => {
            spinner.fail("Build failed");
            Err(CliError::Bundle {
                cwd: project.cwd.clone(),
                source,
            })
        }
    }
}
