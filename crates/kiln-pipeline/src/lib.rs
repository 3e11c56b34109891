//! # kiln-pipeline
//!
//! Turns a [`KilnConfig`](kiln_config::KilnConfig) into files on disk.
//!
//! A build has two halves. [`Descriptor::resolve`] is pure: it routes every
//! source file to a rule, plans every output path and reports every
//! configuration problem. [`Pipeline::run`] then cleans the output
//! directory, runs each file's transform chain in parallel, assembles the
//! extracted stylesheet and the HTML page, and writes the result.
//!
//! ```no_run
//! use kiln_config::{KilnConfig, Mode};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let report = kiln_pipeline::build(Path::new("."), &KilnConfig::default(), Mode::Production)?;
//! for failure in &report.failures {
//!     eprintln!("{failure}");
//! }
//! # Ok(()) }
//! ```

pub mod clean;
pub mod descriptor;
pub mod error;
pub mod executor;
pub mod html_plugin;
pub mod listing;
pub mod matcher;
pub mod report;
pub mod sourcemap;
pub mod transform;
pub mod writer;

pub use clean::{CleanPolicy, CleanReport};
pub use descriptor::{Action, Descriptor, EntryPlan, FaviconPlan, HtmlPlan, Route};
pub use error::{PipelineError, Result, TransformError};
pub use executor::{Pipeline, build};
pub use listing::SourceListing;
pub use report::{BuildReport, EmittedFile, FileFailure, OutputKind, SizeHint};
pub use transform::{Asset, Transform, TransformContext, TransformRegistry};
