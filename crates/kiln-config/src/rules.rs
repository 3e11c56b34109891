//! Rule table declarations.
//!
//! Transform rules run a file through an ordered chain of steps. Asset rules
//! copy a file to a templated output path without touching its content.
//! Chains are listed in application order: the first step receives the file
//! contents and each later step receives the previous step's output.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File predicate shared by transform and asset rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTest {
    /// Regex tested against the project-relative path
    pub test: String,

    #[serde(default)]
    pub case_insensitive: bool,

    /// Directories (project-relative) the file must live under
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<PathBuf>,

    /// Regex that rejects an otherwise matching path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
}

impl RuleTest {
    pub fn new(test: &str) -> Self {
        Self {
            test: test.to_string(),
            case_insensitive: false,
            include: Vec::new(),
            exclude: None,
        }
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    pub fn include(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include.push(dir.into());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.exclude = Some(pattern.to_string());
        self
    }

    /// A scoped rule only applies under its include directories.
    pub fn is_scoped(&self) -> bool {
        !self.include.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformRule {
    pub name: String,

    #[serde(flatten)]
    pub matcher: RuleTest,

    /// Step names in application order
    #[serde(rename = "use")]
    pub chain: Vec<String>,

    /// Output template for files that are neither entries, extracted
    /// styles, nor the HTML template. `None` means the rule only feeds
    /// entry bundles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl TransformRule {
    fn new(name: &str, matcher: RuleTest, chain: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            matcher,
            chain: chain.iter().map(|s| s.to_string()).collect(),
            filename: None,
        }
    }

    fn emit(mut self, filename: &str) -> Self {
        self.filename = Some(filename.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRule {
    pub name: String,

    #[serde(flatten)]
    pub matcher: RuleTest,

    /// Output filename template
    pub filename: String,
}

impl AssetRule {
    fn new(name: &str, matcher: RuleTest, filename: &str) -> Self {
        Self {
            name: name.to_string(),
            matcher,
            filename: filename.to_string(),
        }
    }
}

pub fn default_transform_rules() -> Vec<TransformRule> {
    vec![
        TransformRule::new("scripts", RuleTest::new(r"\.(m?js|cjs)$"), &["script"]),
        TransformRule::new(
            "typescript",
            RuleTest::new(r"\.tsx?$").exclude("node_modules"),
            &["typescript", "script"],
        ),
        TransformRule::new(
            "css",
            RuleTest::new(r"\.css$").case_insensitive(),
            &["postcss", "css", "extract-css"],
        ),
        TransformRule::new(
            "less",
            RuleTest::new(r"\.less$").case_insensitive(),
            &["less", "postcss", "css", "extract-css"],
        ),
        TransformRule::new(
            "sass",
            RuleTest::new(r"\.sass$").case_insensitive(),
            &["sass-indented", "postcss", "css", "extract-css"],
        ),
        TransformRule::new(
            "scss",
            RuleTest::new(r"\.scss$").case_insensitive(),
            &["sass", "postcss", "css", "extract-css"],
        ),
        TransformRule::new("html", RuleTest::new(r"\.html$").case_insensitive(), &["html"])
            .emit("[path][name].[ext]"),
    ]
}

pub fn default_asset_rules() -> Vec<AssetRule> {
    vec![
        AssetRule::new(
            "fonts",
            RuleTest::new(r"\.(eot|svg|ttf|woff|woff2)$").include("src/fonts"),
            "acsses/[name].[ext]",
        ),
        AssetRule::new(
            "music",
            RuleTest::new(r"\.(mp3|wav|ogg)$").include("src/media/music"),
            "media/music/[name].[ext]",
        ),
        AssetRule::new(
            "video",
            RuleTest::new(r"\.(mp4|webm|ogv|3GP)$").include("src/media/video"),
            "media/video/[name].[ext]",
        ),
        AssetRule::new(
            "images",
            RuleTest::new(r"\.(svg|png|jpg|jpeg|webp|gif|icon)$").case_insensitive(),
            "[path][name].[ext]",
        ),
    ]
}
