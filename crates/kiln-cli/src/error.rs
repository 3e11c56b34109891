//! Error types for the kiln CLI.
//!
//! Configuration and pipeline errors are wrapped with enough context for a
//! useful terminal diagnostic. Messages carry a `Hint:` line where the fix is
//! obvious.

use std::path::PathBuf;

use kiln_config::ConfigError;
use kiln_pipeline::{FileFailure, PipelineError};
use thiserror::Error;

mod diagnostic;

pub use diagnostic::{build_error_to_miette, cli_error_to_miette};

/// Result type alias for CLI operations.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file or descriptor is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Build failed: {0}")]
    Build(#[from] BuildError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server error: {0}\n\nHint: Is another process already using the port? Try --port")]
    Server(String),

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

/// Failures that happen once the descriptor has been accepted.
#[derive(Error, Debug)]
pub enum BuildError {
    /// One or more units failed; every other output was still written
    #[error("{} file(s) failed to build:\n{}", .0.len(), list_failures(.0))]
    Failed(Vec<FileFailure>),

    #[error("{} source file(s) matched no rule:\n{}\n\nHint: Add a rule for them or run without --strict", .0.len(), list_paths(.0))]
    UnhandledAssets(Vec<PathBuf>),

    #[error("invalid output path: {0}\n\nHint: Output templates must stay inside the output directory")]
    InvalidOutputPath(String),

    #[error("failed to clean {}: {source}", .path.display())]
    Clean {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn list_failures(failures: &[FileFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("  {f}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn list_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("  {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n")
}

impl From<PipelineError> for CliError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Config(e) => CliError::Config(e),
            PipelineError::UnhandledAssets(paths) => {
                CliError::Build(BuildError::UnhandledAssets(paths))
            }
            PipelineError::InvalidOutputPath(path) => {
                CliError::Build(BuildError::InvalidOutputPath(path))
            }
            PipelineError::Clean { path, source } => {
                CliError::Build(BuildError::Clean { path, source })
            }
            PipelineError::Write { path, source } => {
                CliError::Build(BuildError::Write { path, source })
            }
            PipelineError::Io(e) => CliError::Io(e),
        }
    }
}

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;

    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<CliError>,
{
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| CliError::Custom(format!("{}\n\nHint: {}", e.into(), hint)))
    }

    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| CliError::Custom(format!("{}: {}", msg, e.into())))
    }
}
