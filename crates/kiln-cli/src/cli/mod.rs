//! Command-line interface definition for kiln.
//!
//! # Command Structure
//!
//! - `kiln build` - run one build and exit
//! - `kiln serve` - build, serve the output and rebuild on change
//! - `kiln check` - resolve the routing table without writing anything

mod commands;
mod tests;

use clap::Parser;

pub use commands::{BuildArgs, CheckArgs, Command, ProjectArgs, ServeArgs};

/// kiln - rule-driven asset pipeline for static sites
#[derive(Parser, Debug)]
#[command(
    name = "kiln",
    version,
    about = "Rule-driven asset pipeline for static sites",
    long_about = "kiln routes every file under the source directory through an ordered\n\
                  rule table, runs each file's transform chain and writes the results,\n\
                  an injected index.html and the extracted stylesheet to the output directory."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    ///
    /// Logs every routed file, each transform step and the clean phase.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}
