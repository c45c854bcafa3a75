//! pkgup - build a package from the entry points its package.json declares.
//!
//! Parses arguments, installs logging and dispatches to the command.

use clap::Parser;
use miette::Result;
use pkgup_cli::{cli, commands, error, logger, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color, args.quiet);

    let result = match args.command() {
        cli::Command::Build(build_args) => commands::build_execute(build_args).await,
        cli::Command::Plan(plan_args) => commands::plan_execute(plan_args).await,
    };

    result.map_err(error::cli_error_to_miette)
}
