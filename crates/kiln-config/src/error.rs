//! Error types for configuration loading, validation and descriptor resolution.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    // Config parsing/loading errors
    #[error("config not found in {}", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid config value for '{field}'{}", .hint.as_ref().map(|h| format!(": {h}")).unwrap_or_default())]
    InvalidValue { field: String, hint: Option<String> },

    #[error("unknown mode '{0}' (expected 'development' or 'production')")]
    UnknownMode(String),

    // Schema validation errors (no filesystem checks)
    #[error("no entries specified")]
    NoEntries,

    #[error("rule '{rule}' is invalid: {message}")]
    InvalidRule { rule: String, message: String },

    #[error("rule '{rule}' uses unknown transform step '{step}'")]
    UnknownStep { rule: String, step: String },

    #[error("invalid filename template '{template}': {message}")]
    InvalidTemplate { template: String, message: String },

    #[error("invalid glob '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },

    // Resolution errors (raised while routing the source listing)
    #[error("{} matches both rule '{first}' and rule '{second}'", .path.display())]
    AmbiguousRule {
        path: PathBuf,
        first: String,
        second: String,
    },

    #[error("'{first}' and '{second}' both emit {}", .path.display())]
    DuplicateOutput {
        path: PathBuf,
        first: String,
        second: String,
    },

    #[error("entry '{name}' not found: {}", .path.display())]
    EntryNotFound { name: String, path: PathBuf },

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        let field = if err.path.is_empty() {
            "config".to_string()
        } else {
            err.path.join(".")
        };
        ConfigError::InvalidValue {
            field,
            hint: Some(err.to_string()),
        }
    }
}
