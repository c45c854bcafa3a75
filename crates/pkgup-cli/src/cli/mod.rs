//! Command-line interface definition for pkgup.
//!
//! # Command Structure
//!
//! - `pkgup build` - Build every entry point the package declares (default)
//! - `pkgup plan` - Resolve entries and print the build plans without writing

mod commands;
mod validation;

use clap::Parser;

pub use commands::{BuildArgs, Command, PlanArgs, ProjectArgs};
pub use validation::parse_dir;

/// pkgup - build a package from its package.json
#[derive(Parser, Debug)]
#[command(
    name = "pkgup",
    version,
    about = "Build a package from the entry points its package.json declares",
    long_about = "pkgup reads main, module, types, bin and exports from package.json,\n\
                  finds the source file behind every declared output and bundles them\n\
                  with Rolldown, emitting TypeScript declarations alongside."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute; `build` when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The subcommand to run, defaulting to `build`.
    pub fn command(self) -> Command {
        self.command
            .unwrap_or_else(|| Command::Build(BuildArgs::default()))
    }
}
