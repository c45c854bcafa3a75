//! Command implementations for the pkgup CLI.
//!
//! - [`build`] - Build every declared entry point
//! - [`plan`] - Print the build plans without writing
//!
//! Each command provides an `execute` function that takes the parsed
//! command arguments and returns a Result.

pub mod build;
pub mod plan;
pub mod utils;

pub use build::execute as build_execute;
pub use plan::execute as plan_execute;
