//! Error types for descriptor resolution, cleaning, transforms and emission.
//!
//! `PipelineError` aborts the invocation. `TransformError` belongs to a single
//! step on a single file and is collected into the build report instead.

use std::io;
use std::path::PathBuf;

use kiln_config::ConfigError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{} source file(s) matched no rule: {}", .0.len(), join_paths(.0))]
    UnhandledAssets(Vec<PathBuf>),

    #[error("failed to clean {}: {source}", .path.display())]
    Clean {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid output path: {0}")]
    InvalidOutputPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Failure of one transform step.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("content is not valid UTF-8")]
    NotUtf8,

    #[error("{0}")]
    Parse(String),

    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("'{command}' exited with {}{}", format_status(.status), format_stderr(.stderr))]
    Command {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("no transform registered as '{0}'")]
    Missing(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

fn format_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "a signal".to_string(),
    }
}

fn format_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}
