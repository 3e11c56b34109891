//! Declarative build descriptor configuration for kiln.
//!
//! Everything a build needs is declared here: entry points, the ordered rule
//! table, output naming, HTML injection, the clean policy and the
//! mode-dependent policy. Nothing in this crate touches the output
//! directory.

pub mod config;
pub mod discovery;
pub mod error;
mod helpers;
pub mod mode;
pub mod options;
pub mod rules;
pub mod template;
pub mod validation;

// Re-export main types
pub use config::*;
pub use error::*;
pub use mode::*;
pub use options::*;
pub use rules::*;
pub use template::{FilenameTemplate, TemplateVars};

// Re-export discovery and validation
pub use discovery::{ConfigDiscovery, ENV_PREFIX, discover};
pub use validation::{ConfigValidator, SchemaValidator, validate_schema};
