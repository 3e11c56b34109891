//! `kiln build`: load configuration, run one build and report.

use kiln_config::{ConfigOverrides, UnhandledPolicy};
use kiln_pipeline::BuildReport;

use crate::cli::BuildArgs;
use crate::commands::utils;
use crate::error::{BuildError, Result};
use crate::ui;

/// Execute the build command.
///
/// Configuration, resolution, clean and write errors abort with their own
/// diagnostic. Per-file failures are reported after every other output has
/// been written, and turn into a non-zero exit.
pub async fn execute(args: BuildArgs) -> Result<()> {
    let overrides = ConfigOverrides {
        mode: args.mode.clone(),
        unhandled: args.strict.then_some(UnhandledPolicy::Error),
        dev: None,
    };
    let project = utils::load_project(&args.project, &overrides)?;

    ui::info(&format!(
        "Building {} ({} mode)",
        project.root.display(),
        project.mode
    ));

    let report = utils::run_build(&project).await?;
    finish(&report)
}

/// Print the summary and turn failures into an error.
pub fn finish(report: &BuildReport) -> Result<()> {
    ui::print_build_summary(report);

    if !report.unhandled.is_empty() {
        ui::warning(&format!(
            "{} source file(s) matched no rule and were skipped",
            report.unhandled.len()
        ));
    }
    for hint in &report.hints {
        ui::warning(&format!(
            "{} is {} (limit {})",
            hint.path,
            ui::format_size(hint.size),
            ui::format_size(hint.limit)
        ));
    }

    if !report.is_success() {
        ui::error(&format!("{} file(s) failed", report.failures.len()));
        return Err(BuildError::Failed(report.failures.clone()).into());
    }

    ui::success(&format!(
        "Build completed in {}",
        ui::format_duration(report.duration)
    ));
    Ok(())
}
