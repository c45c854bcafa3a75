//! Plan command implementation.
//!
//! `pkgup plan` resolves the package like `build` does and prints the plans
//! it would run. Nothing is written.

use crate::cli::PlanArgs;
use crate::commands::utils;
use crate::error::Result;
use crate::ui;
use pkgup_bundler::BuildPlan;

/// Execute the plan command.
pub async fn execute(args: PlanArgs) -> Result<()> {
    let launch_dir = utils::get_cwd()?;
    let project = utils::resolve_project(&args.project, &launch_dir).await?;
    let plans = &project.resolution.plans;

    if args.json {
        println!("{}", render_json(plans)?);
        return Ok(());
    }

    if plans.is_empty() {
        ui::warning("Nothing to build");
        return Ok(());
    }
    println!("{}", render_text(plans));
    Ok(())
}

/// Plans as a pretty-printed JSON array.
pub fn render_json(plans: &[BuildPlan]) -> Result<String> {
    Ok(serde_json::to_string_pretty(plans)?)
}

/// Plans as indented text, one block per plan.
pub fn render_text(plans: &[BuildPlan]) -> String {
    plans
        .iter()
        .enumerate()
        .map(|(index, plan)| ui::format_plan(index, plan))
        .collect::<Vec<_>>()
        .join("\n\n")
}
