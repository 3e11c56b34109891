//! Output, HTML, CSS, clean, performance and dev server options.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::helpers::*;

/// Where and how bundles are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputOptions {
    /// Output directory, relative to the project root
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Filename template for entry bundles
    #[serde(default = "default_entry_filename")]
    pub filename: String,

    /// Public URL prefix for every emitted file
    #[serde(default = "default_public_path")]
    pub public_path: String,

    /// Filename of the extracted stylesheet
    #[serde(default = "default_stylesheet")]
    pub stylesheet: String,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            filename: default_entry_filename(),
            public_path: default_public_path(),
            stylesheet: default_stylesheet(),
        }
    }
}

impl OutputOptions {
    /// Public URL of an output path (e.g. `app/app.js` → `/app/app.js`).
    pub fn public_url(&self, output: &str) -> String {
        let base = self.public_path.trim_end_matches('/');
        format!("{}/{}", base, output.trim_start_matches('/'))
    }
}

/// Kind of URL an HTML attribute carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A single URL
    Src,
    /// A comma-separated candidate list (`url descriptor, ...`)
    Srcset,
}

/// An HTML attribute whose URLs are rewritten to emitted asset locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlSource {
    pub tag: String,
    pub attribute: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
}

impl HtmlSource {
    fn new(tag: &str, attribute: &str, kind: SourceKind) -> Self {
        Self {
            tag: tag.to_string(),
            attribute: attribute.to_string(),
            kind,
        }
    }
}

pub fn default_html_sources() -> Vec<HtmlSource> {
    vec![
        HtmlSource::new("source", "src-set", SourceKind::Srcset),
        HtmlSource::new("img", "data-src", SourceKind::Src),
        HtmlSource::new("img", "src", SourceKind::Src),
        HtmlSource::new("source", "srcset", SourceKind::Srcset),
        HtmlSource::new("source", "data-srcset", SourceKind::Srcset),
    ]
}

/// HTML template and injection options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlOptions {
    /// Markup template; every entry bundle is injected into it
    #[serde(default = "default_html_template")]
    pub template: Option<PathBuf>,

    /// Output filename for the rendered template (default: "index.html")
    #[serde(default = "default_html_filename")]
    pub filename: String,

    /// `<base href>` inserted into `<head>`
    #[serde(default = "default_html_base")]
    pub base: Option<String>,

    /// Favicon copied to the output root and linked from the template
    #[serde(default = "default_favicon")]
    pub favicon: Option<PathBuf>,

    /// Entries whose name ends with this suffix are injected into `<head>`
    #[serde(default = "default_head_suffix")]
    pub head_suffix: String,

    /// Attributes whose URLs are rewritten
    #[serde(default = "default_html_sources")]
    pub sources: Vec<HtmlSource>,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            template: default_html_template(),
            filename: default_html_filename(),
            base: default_html_base(),
            favicon: default_favicon(),
            head_suffix: default_head_suffix(),
            sources: default_html_sources(),
        }
    }
}

/// CSS processing configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CssOptions {
    /// Browser targets for prefixing, e.g. `chrome = "90"`, `safari = "13.1"`
    #[serde(default)]
    pub targets: IndexMap<String, String>,
}

/// Output directory purge settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanOptions {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Globs (relative to the output directory) that survive a clean
    #[serde(default = "default_clean_keep")]
    pub keep: Vec<String>,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            keep: default_clean_keep(),
        }
    }
}

/// Size warnings for emitted files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceOptions {
    #[serde(default)]
    pub hints: bool,

    #[serde(default = "default_size_limit")]
    pub max_asset_size: u64,

    #[serde(default = "default_size_limit")]
    pub max_entrypoint_size: u64,
}

impl Default for PerformanceOptions {
    fn default() -> Self {
        Self {
            hints: false,
            max_asset_size: default_size_limit(),
            max_entrypoint_size: default_size_limit(),
        }
    }
}

/// Development server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevOptions {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_watch_ignore")]
    pub watch_ignore: Vec<String>,
}

impl Default for DevOptions {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            debounce_ms: default_debounce_ms(),
            watch_ignore: default_watch_ignore(),
        }
    }
}

/// What happens to a source file no rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnhandledPolicy {
    /// Log a warning and skip the file
    #[default]
    Warn,
    /// Abort the build before anything is written
    Error,
    /// Skip the file silently
    Ignore,
}

/// External program used as a transform step.
///
/// The asset is written to the program's stdin and its stdout becomes the new
/// content. `{path}` and `{ext}` in `args` are replaced with the source path
/// and extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandStep {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandStep {
    pub fn new(command: &str, args: &[&str]) -> Self {
        Self {
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Command steps available without any configuration.
pub fn default_command_steps() -> IndexMap<String, CommandStep> {
    let mut steps = IndexMap::new();
    steps.insert(
        "typescript".to_string(),
        CommandStep::new("esbuild", &["--loader={ext}"]),
    );
    steps.insert("less".to_string(), CommandStep::new("lessc", &["-"]));
    steps.insert("sass".to_string(), CommandStep::new("sass", &["--stdin"]));
    steps.insert(
        "sass-indented".to_string(),
        CommandStep::new("sass", &["--stdin", "--indented"]),
    );
    steps
}
