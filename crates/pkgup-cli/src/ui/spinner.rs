//! Spinner shown while a build runs.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;

/// Simple spinner for tasks without known duration.
///
/// Hidden when stderr is not a terminal, in CI and in quiet mode.
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    /// Create and start a new spinner.
    pub fn new(message: &str) -> Self {
        if super::is_quiet() || super::is_ci() || !console::user_attended_stderr() {
            return Self {
                pb: ProgressBar::hidden(),
            };
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .tick_strings(&["◐", "◓", "◑", "◒", "●"]),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// Update spinner message while it's running.
    pub fn set_message(&self, message: &str) {
        self.pb.set_message(message.to_string());
    }

    /// Finish spinner with a green checkmark.
    pub fn finish(&self, message: &str) {
        self.pb
            .finish_with_message(format!("{} {}", "✓".green(), message));
    }

    /// Finish spinner with a red X.
    pub fn fail(&self, message: &str) {
        self.pb
            .finish_with_message(format!("{} {}", "✗".red(), message));
    }

    /// Remove the spinner without a final message.
    pub fn clear(&self) {
        self.pb.finish_and_clear();
    }
}
