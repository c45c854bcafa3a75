//! pkgup CLI - build a package from the entry points its package.json declares.
//!
//! This crate is the command-line front end of [`pkgup_bundler`]. It loads
//! configuration, resolves the package and either runs the build or prints
//! the plans it would run.
//!
//! # Architecture
//!
//! - [`cli`] - Argument definitions (clap derive)
//! - [`config`] - `pkgup.config.json`, `PKGUP_*` and flag layering (figment)
//! - [`commands`] - `build` and `plan`
//! - [`error`] - Error types with hints, rendered through miette
//! - [`logger`] - tracing subscriber setup
//! - [`ui`] - Status messages and summaries on stderr

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{BuildError, CliError, ConfigError, Result, ResultExt};
