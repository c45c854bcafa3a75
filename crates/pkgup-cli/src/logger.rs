//! Logging infrastructure for the pkgup CLI.
//!
//! The bundler library only emits `tracing` events; this module installs the
//! subscriber that prints them.
//!
//! # Example
//!
//! ```rust,no_run
//! use pkgup_cli::logger::init_logger;
//! use tracing::info;
//!
//! init_logger(false, false, false);
//! info!("Starting build");
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used for `--verbose`.
pub const VERBOSE_FILTER: &str = "pkgup=debug,pkgup_bundler=debug,pkgup_cli=debug";

/// Filter used for `--quiet`.
pub const QUIET_FILTER: &str = "error";

/// Filter used when neither flag nor `RUST_LOG` is given.
pub const DEFAULT_FILTER: &str = "pkgup=info,pkgup_bundler=info,pkgup_cli=info";

/// Pick the filter directives for the given flags.
///
/// `--verbose` wins over `--quiet`; `RUST_LOG` only applies when neither is set.
pub fn filter_directives(verbose: bool, quiet: bool) -> Option<&'static str> {
    if verbose {
        Some(VERBOSE_FILTER)
    } else if quiet {
        Some(QUIET_FILTER)
    } else {
        None
    }
}

/// Initialize the tracing subscriber.
///
/// Should be called once, before any logging occurs. A second call is a no-op.
///
/// # Verbosity Levels
///
/// 1. `--verbose`: DEBUG for pkgup crates
/// 2. `--quiet`: errors only
/// 3. `RUST_LOG` environment variable
/// 4. Default: INFO for pkgup crates
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = match filter_directives(verbose, quiet) {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    };
    init_logger_with_filter(filter, no_color);
}

/// Initialize logger with a custom environment filter.
pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives() {
        assert_eq!(filter_directives(true, false), Some(VERBOSE_FILTER));
        assert_eq!(filter_directives(false, true), Some(QUIET_FILTER));
        assert_eq!(filter_directives(true, true), Some(VERBOSE_FILTER));
        assert_eq!(filter_directives(false, false), None);
    }

    #[test]
    fn test_init_logger_twice() {
        init_logger(false, true, true);
        init_logger(true, false, true);
    }
}
