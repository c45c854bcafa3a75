//! Terminal UI utilities for status messages and build summaries.
//!
//! Everything here writes to stderr so that `pkgup plan --json` keeps stdout
//! machine-readable.
//!
//! # Examples
//!
//! ```no_run
//! use pkgup_cli::ui;
//!
//! ui::init_colors(false, false);
//! let spinner = ui::Spinner::new("Resolving entries...");
//! spinner.finish("Resolved 3 entries");
//! ui::success("Build successful");
//! ```

mod format;
mod messages;
mod spinner;

use std::sync::atomic::{AtomicBool, Ordering};

pub use format::{format_duration, format_plan, format_size, print_build_summary};
pub use messages::{debug, error, info, success, warning};
pub use spinner::Spinner;

static QUIET: AtomicBool = AtomicBool::new(false);
static COLOR: AtomicBool = AtomicBool::new(true);

/// Whether non-error output is suppressed.
pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Whether status output is colored.
pub fn colors_enabled() -> bool {
    COLOR.load(Ordering::Relaxed)
}

/// Check if running in a CI environment.
pub fn is_ci() -> bool {
    std::env::var("CI").is_ok()
        || std::env::var("GITHUB_ACTIONS").is_ok()
        || std::env::var("GITLAB_CI").is_ok()
        || std::env::var("CIRCLECI").is_ok()
        || std::env::var("TRAVIS").is_ok()
}

/// Check if color output should be enabled.
///
/// Respects NO_COLOR and FORCE_COLOR, falls back to terminal detection.
pub fn should_use_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    console::user_attended_stderr()
}

/// Initialize output settings from the global flags.
///
/// Should be called once, early in main.
pub fn init_colors(no_color: bool, quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
    let colors = !no_color && should_use_color();
    COLOR.store(colors, Ordering::Relaxed);
    console::set_colors_enabled_stderr(colors);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_ci_does_not_panic() {
        let _ = is_ci();
    }

    #[test]
    fn test_init_colors_no_color() {
        init_colors(true, false);
        assert!(!is_quiet());
        assert!(!colors_enabled());
    }
}
