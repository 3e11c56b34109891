//! Command implementations.
//!
//! - [`build`] - one build, summary, exit status
//! - [`serve`] - development server with rebuild on change
//! - [`check`] - print the resolved routing table
//!
//! Each command provides an `execute` function that takes its parsed
//! arguments.

pub mod build;
pub mod check;
pub mod serve;
pub(crate) mod utils;

pub use build::execute as build_execute;
pub use check::execute as check_execute;
pub use serve::execute as serve_execute;
