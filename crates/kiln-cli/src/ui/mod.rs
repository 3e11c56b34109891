//! Terminal output: status lines, size and duration formatting, and the
//! build summary.
//!
//! Everything here writes to stderr so that stdout stays free for the
//! routing table printed by `kiln check`.
//!
//! ```no_run
//! use kiln_cli::ui;
//!
//! ui::init_colors(false);
//! ui::success("Build complete");
//! ui::warning("1 source file matched no rule");
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

mod format;
mod messages;

pub use format::{format_duration, format_size, print_build_summary, summary_lines};
pub use messages::{error, info, success, warning};

static COLORS: AtomicBool = AtomicBool::new(true);

/// Check if color output should be enabled.
///
/// `NO_COLOR` wins over `FORCE_COLOR`; otherwise colors follow whether a
/// user is attached to stderr.
pub fn should_use_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    console::user_attended_stderr()
}

/// Decide once whether status lines are colored. `--no-color` always wins.
pub fn init_colors(no_color: bool) {
    let enabled = !no_color && should_use_color();
    COLORS.store(enabled, Ordering::Relaxed);
    console::set_colors_enabled_stderr(enabled);
}

pub(crate) fn colors_enabled() -> bool {
    COLORS.load(Ordering::Relaxed)
}
