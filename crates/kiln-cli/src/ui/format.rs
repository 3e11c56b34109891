//! Formatting utilities for sizes, durations, and build summaries.

use std::time::Duration;

use console::Term;
use kiln_pipeline::{BuildReport, OutputKind};
use owo_colors::OwoColorize;

use super::colors_enabled;

/// Format file size in human-readable format.
///
/// ```
/// use kiln_cli::ui::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(500), "500 B");
/// assert_eq!(format_size(1024), "1.00 KB");
/// assert_eq!(format_size(1_048_576), "1.00 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Format duration in human-readable format.
///
/// ```
/// use std::time::Duration;
/// use kiln_cli::ui::format_duration;
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

fn kind_label(kind: OutputKind) -> &'static str {
    match kind {
        OutputKind::Entry => "entry",
        OutputKind::SourceMap => "map",
        OutputKind::Stylesheet => "css",
        OutputKind::Html => "html",
        OutputKind::Asset => "asset",
        OutputKind::Favicon => "icon",
    }
}

/// Plain summary rows: `(kind, path, size)` for every emitted file.
pub fn summary_lines(report: &BuildReport) -> Vec<(&'static str, String, String)> {
    report
        .emitted
        .iter()
        .map(|file| (kind_label(file.kind), file.path.clone(), format_size(file.size)))
        .collect()
}

/// Print every emitted file with its size, then the totals.
pub fn print_build_summary(report: &BuildReport) {
    let width = (Term::stderr().size().1 as usize).min(80);
    let rule = "─".repeat(width);
    let colored = colors_enabled();

    if colored {
        eprintln!("\n{}", "Build Summary".bold().underline());
    } else {
        eprintln!("\nBuild Summary");
    }
    eprintln!("{rule}");

    for (kind, path, size) in summary_lines(report) {
        if colored {
            eprintln!(
                "  {} {:<6} {} {}",
                "▸".blue(),
                kind.dimmed(),
                path.bright_white().bold(),
                size.dimmed()
            );
        } else {
            eprintln!("  ▸ {kind:<6} {path} {size}");
        }
    }

    eprintln!("{rule}");

    let total = format!(
        "{} file(s), {} in {}",
        report.emitted.len(),
        format_size(report.total_size()),
        format_duration(report.duration)
    );
    if colored {
        eprintln!("  {} {}", "Total:".bold(), total.green());
    } else {
        eprintln!("  Total: {total}");
    }
}
