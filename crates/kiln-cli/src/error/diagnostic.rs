//! Conversion from CLI errors to miette reports.

use miette::Report;

use crate::error::{BuildError, CliError};

pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Build(e) => build_error_to_miette(e),
        _ => miette::miette!("{}", err),
    }
}

pub fn build_error_to_miette(err: BuildError) -> Report {
    match err {
        BuildError::Failed(failures) => {
            let listing = failures
                .iter()
                .map(|f| format!("  {f}"))
                .collect::<Vec<_>>()
                .join("\n");
            miette::miette!(
                help = "Outputs of the other files were written",
                "{} file(s) failed to build:\n{}",
                failures.len(),
                listing
            )
        }
        _ => miette::miette!("{}", err),
    }
}
