//! Top-level `KilnConfig` structure.
//!
//! For file discovery and layered loading, see the `discovery` module.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result as ConfigResult};
use crate::helpers::default_source_dir;
use crate::mode::Mode;
use crate::options::{
    CleanOptions, CommandStep, CssOptions, DevOptions, HtmlOptions, OutputOptions,
    PerformanceOptions, UnhandledPolicy, default_command_steps,
};
use crate::rules::{AssetRule, TransformRule, default_asset_rules, default_transform_rules};

/// Step names the pipeline provides without configuration.
pub const BUILTIN_STEPS: &[&str] = &["script", "css", "postcss", "extract-css", "html"];

/// An entry point: either a bare path or a table with an `optional` flag.
///
/// A missing optional entry is skipped; a missing required entry fails the
/// build before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntrySpec {
    Path(PathBuf),
    Detailed {
        path: PathBuf,
        #[serde(default)]
        optional: bool,
    },
}

impl EntrySpec {
    pub fn path(&self) -> &Path {
        match self {
            EntrySpec::Path(path) | EntrySpec::Detailed { path, .. } => path,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, EntrySpec::Detailed { optional: true, .. })
    }
}

fn default_entries() -> IndexMap<String, EntrySpec> {
    let mut entries = IndexMap::new();
    entries.insert(
        "app".to_string(),
        EntrySpec::Path(PathBuf::from("src/app/index.js")),
    );
    entries.insert(
        "app_head".to_string(),
        EntrySpec::Detailed {
            path: PathBuf::from("src/app/index_head.js"),
            optional: true,
        },
    );
    entries
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KilnConfig {
    /// Build mode; parsed late so an unknown value is a `ConfigError`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// Directory scanned for source files, relative to the project root
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Named entry points, in injection order
    #[serde(default = "default_entries")]
    pub entries: IndexMap<String, EntrySpec>,

    #[serde(default)]
    pub output: OutputOptions,

    /// Transform rules, tested first, in order
    #[serde(default = "default_transform_rules")]
    pub rules: Vec<TransformRule>,

    /// Asset emission rules, tested after every transform rule, in order
    #[serde(default = "default_asset_rules")]
    pub assets: Vec<AssetRule>,

    /// Command steps added to (or overriding) the defaults
    #[serde(default)]
    pub transforms: IndexMap<String, CommandStep>,

    #[serde(default)]
    pub html: HtmlOptions,

    #[serde(default)]
    pub css: CssOptions,

    #[serde(default)]
    pub clean: CleanOptions,

    #[serde(default)]
    pub performance: PerformanceOptions,

    #[serde(default)]
    pub dev: DevOptions,

    #[serde(default)]
    pub unhandled: UnhandledPolicy,
}

impl Default for KilnConfig {
    fn default() -> Self {
        Self {
            mode: None,
            source_dir: default_source_dir(),
            entries: default_entries(),
            output: OutputOptions::default(),
            rules: default_transform_rules(),
            assets: default_asset_rules(),
            transforms: IndexMap::new(),
            html: HtmlOptions::default(),
            css: CssOptions::default(),
            clean: CleanOptions::default(),
            performance: PerformanceOptions::default(),
            dev: DevOptions::default(),
            unhandled: UnhandledPolicy::default(),
        }
    }
}

impl KilnConfig {
    /// Create from serde_json::Value (for programmatic config)
    ///
    /// # Example
    ///
    /// ```
    /// use kiln_config::KilnConfig;
    /// use serde_json::json;
    /// use std::path::Path;
    ///
    /// let config = KilnConfig::from_value(json!({
    ///     "entries": { "main": "src/main.js" },
    ///     "output": { "dir": "public" }
    /// }))
    /// .unwrap();
    ///
    /// assert_eq!(config.entries["main"].path(), Path::new("src/main.js"));
    /// assert_eq!(config.output.dir, Path::new("public"));
    /// ```
    pub fn from_value(value: Value) -> ConfigResult<Self> {
        serde_json::from_value(value).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            hint: Some(e.to_string()),
        })
    }

    /// Convert to serde_json::Value
    pub fn to_value(&self) -> ConfigResult<Value> {
        serde_json::to_value(self).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            hint: Some(e.to_string()),
        })
    }

    /// Parse the configured mode, defaulting to production.
    pub fn resolved_mode(&self) -> ConfigResult<Mode> {
        match self.mode.as_deref() {
            Some(raw) => raw.parse(),
            None => Ok(Mode::default()),
        }
    }

    /// Default command steps overlaid with the configured ones.
    pub fn command_steps(&self) -> IndexMap<String, CommandStep> {
        let mut steps = default_command_steps();
        for (name, step) in &self.transforms {
            steps.insert(name.clone(), step.clone());
        }
        steps
    }

    /// Every step name a chain may reference.
    pub fn known_steps(&self) -> Vec<String> {
        BUILTIN_STEPS
            .iter()
            .map(|s| s.to_string())
            .chain(self.command_steps().into_keys())
            .collect()
    }
}

/// Values supplied on the command line; they win over every other layer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unhandled: Option<UnhandledPolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev: Option<DevOverrides>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DevOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}
