use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Available kiln subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the project once
    ///
    /// Cleans the output directory (keeping .git, .gitignore and README.md),
    /// runs every file through its rule's transform chain and writes the
    /// results. Exits non-zero if any file failed.
    Build(BuildArgs),

    /// Build, serve the output directory and rebuild on change
    ///
    /// Only available in development mode.
    Serve(ServeArgs),

    /// Resolve and print the routing table without building
    ///
    /// Shows which rule and transform chain each source file resolves to and
    /// where it will be written. Nothing is cleaned or written.
    Check(CheckArgs),
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Path to the configuration file
    ///
    /// Defaults to kiln.toml, kiln.json or the "kiln" field of package.json
    /// in the project root.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Project root
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Build mode: development or production
    ///
    /// Overrides the "mode" key of the configuration. Defaults to production.
    #[arg(short, long, value_name = "MODE")]
    pub mode: Option<String>,

    /// Fail when a source file matches no rule
    #[arg(long)]
    pub strict: bool,

    #[command(flatten)]
    pub project: ProjectArgs,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Build mode; the server only runs in development
    #[arg(short, long, value_name = "MODE", default_value = "development")]
    pub mode: String,

    /// Port to listen on
    ///
    /// Overrides dev.port from the configuration.
    #[arg(short, long)]
    pub port: Option<u16>,

    #[command(flatten)]
    pub project: ProjectArgs,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[arg(short, long, value_name = "MODE")]
    pub mode: Option<String>,

    /// Print the routing table as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub project: ProjectArgs,
}
