//! kiln CLI - rule-driven asset pipeline for static sites.
//!
//! The binary is a thin layer over [`kiln_pipeline`]: it loads configuration
//! with [`kiln_config::ConfigDiscovery`], resolves and runs the build, and
//! turns the build report into terminal output and an exit status.
//!
//! # Modules
//!
//! - [`cli`] - clap argument definitions
//! - [`commands`] - `build`, `serve` and `check`
//! - [`dev`] - development server, file watcher and shared build status
//! - [`error`] - CLI error type and miette conversion
//! - [`logger`] - tracing subscriber setup
//! - [`ui`] - status lines and size/duration formatting

pub mod cli;
pub mod commands;
pub mod dev;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{BuildError, CliError, Result, ResultExt};
