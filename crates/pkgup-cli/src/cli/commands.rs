use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::cli::validation::parse_dir;

/// Available pkgup subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build every entry point declared by package.json
    ///
    /// Removes the outputs it is about to produce, bundles modules with
    /// Rolldown, emits declarations and makes `bin` outputs executable.
    Build(BuildArgs),

    /// Print the build plans without writing anything
    ///
    /// Resolves every entry to its source file and shows how the build
    /// would be split into compiler invocations.
    Plan(PlanArgs),
}

/// Options shared by every command that resolves a package.
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Extra source files to build
    ///
    /// Each must live under the source directory; its output path mirrors
    /// the source path under the destination directory.
    ///
    /// Examples:
    ///   pkgup build src/worker.ts
    ///   pkgup build src/bin/tool.ts src/extra.ts
    #[arg(value_name = "ENTRY")]
    pub entries: Vec<String>,

    /// Configuration file (default: pkgup.config.json in the working directory)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the sources (default: ./src)
    #[arg(long, value_name = "DIR", value_parser = parse_dir)]
    pub src_dir: Option<String>,

    /// Destination directory for built files (default: ./dist)
    #[arg(short = 'd', long, value_name = "DIR", value_parser = parse_dir)]
    pub out_dir: Option<String>,

    /// Write .map files next to built modules
    #[arg(long)]
    pub sourcemap: bool,

    /// Minify built modules
    #[arg(short = 'm', long)]
    pub minify: bool,

    /// Working directory (default: current directory)
    ///
    /// package.json is looked up here and in its ancestors.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,
}

/// Arguments for the build command
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

/// Arguments for the plan command
#[derive(Args, Debug, Clone, Default)]
pub struct PlanArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Print the plans as JSON
    #[arg(long)]
    pub json: bool,
}
