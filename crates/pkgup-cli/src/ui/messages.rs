//! Status message functions for terminal output.

use owo_colors::OwoColorize;

fn emit(symbol: String, message: String, plain_symbol: &str, plain_message: &str) {
    if super::colors_enabled() {
        eprintln!("{symbol} {message}");
    } else {
        eprintln!("{plain_symbol} {plain_message}");
    }
}

/// Print a success message to stderr.
pub fn success(message: &str) {
    if super::is_quiet() {
        return;
    }
    emit("✓".green().bold().to_string(), message.to_string(), "✓", message);
}

/// Print an info message to stderr.
pub fn info(message: &str) {
    if super::is_quiet() {
        return;
    }
    emit("ℹ".blue().bold().to_string(), message.to_string(), "ℹ", message);
}

/// Print a warning message to stderr.
pub fn warning(message: &str) {
    if super::is_quiet() {
        return;
    }
    emit(
        "⚠".yellow().bold().to_string(),
        message.yellow().to_string(),
        "⚠",
        message,
    );
}

/// Print an error message to stderr. Shown even in quiet mode.
pub fn error(message: &str) {
    emit(
        "✗".red().bold().to_string(),
        message.red().to_string(),
        "✗",
        message,
    );
}

/// Print a debug message to stderr (only if RUST_LOG is set).
pub fn debug(message: &str) {
    if std::env::var("RUST_LOG").is_ok() {
        emit(
            "◆".dimmed().to_string(),
            message.dimmed().to_string(),
            "◆",
            message,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_messages() {
        success("Success message");
        info("Info message");
        warning("Warning message");
        error("Error message");
        debug("Debug message");
    }
}
