//! Formatting utilities for sizes, durations, plans and build summaries.

use console::Term;
use owo_colors::OwoColorize;
use pkgup_bundler::{BuildPlan, BuildReport};
use std::path::Path;
use std::time::Duration;

/// Format file size in human-readable format.
///
/// # Examples
///
/// ```
/// use pkgup_cli::ui::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(500), "500 B");
/// assert_eq!(format_size(1024), "1.00 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit_idx = 0;
    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Format duration in human-readable format.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use pkgup_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Render one plan for `pkgup plan`.
///
/// The first line names the plan; each following line maps a source to an
/// output, marking executables.
pub fn format_plan(index: usize, plan: &BuildPlan) -> String {
    let mut out = format!("Plan {}: {}", index + 1, plan.kind);
    for entry in &plan.entries {
        let source = entry.source.as_deref().unwrap_or("?");
        out.push_str(&format!("\n  {} -> {}", source, entry.output));
        if entry.executable {
            out.push_str(" (executable)");
        }
    }
    out
}

/// Print the files a build wrote, with sizes, to stderr.
///
/// Paths are shown relative to `root` when possible.
pub fn print_build_summary(report: &BuildReport, root: &Path) {
    if super::is_quiet() {
        return;
    }

    let width = (Term::stderr().size().1 as usize).min(80);
    eprintln!("\n{}", "Build Summary".bold().underline());
    eprintln!("{}", "─".repeat(width));

    let mut total_size = 0;
    for plan in &report.plans {
        eprintln!(
            "  {} {}",
            plan.kind.to_string().bright_white().bold(),
            format!("({})", format_duration(plan.duration)).dimmed()
        );
        for file in &plan.files {
            let size = std::fs::metadata(file).map(|meta| meta.len()).unwrap_or(0);
            total_size += size;
            let name = file.strip_prefix(root).unwrap_or(file).display().to_string();
            let marker = if plan.executables.contains(file) {
                " *"
            } else {
                ""
            };
            eprintln!(
                "    {} {}{} {}",
                "▸".blue(),
                name,
                marker,
                format_size(size).dimmed()
            );
        }
    }

    eprintln!("{}", "─".repeat(width));
    eprintln!(
        "  {} {} files, {}",
        "Total:".bold(),
        report.file_count(),
        format_size(total_size).green()
    );
    if report.removed > 0 {
        eprintln!("  Removed {} stale files", report.removed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgup_bundler::PlanReport;
    use pkgup_bundler::PlanKind;
    use std::path::PathBuf;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1_572_864), "1.50 MB");
        assert_eq!(format_size(2_147_483_648), "2.00 GB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(0)), "0ms");
        assert_eq!(format_duration(Duration::from_millis(999)), "999ms");
        assert_eq!(format_duration(Duration::from_millis(1000)), "1.00s");
        assert_eq!(format_duration(Duration::from_secs(60)), "1m 0s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "61m 1s");
    }

    #[test]
    fn test_print_build_summary() {
        let report = BuildReport {
            plans: vec![PlanReport {
                kind: PlanKind::Declarations,
                files: vec![PathBuf::from("/pkg/dist/index.d.ts")],
                executables: vec![],
                duration: Duration::from_millis(12),
            }],
            removed: 1,
        };

        print_build_summary(&report, Path::new("/pkg"));
        print_build_summary(&BuildReport::default(), Path::new("/pkg"));
    }
}
