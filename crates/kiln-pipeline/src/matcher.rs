//! Compiled rule table.
//!
//! Transform rules come first, asset rules after them, each group in declared
//! order. Resolution walks this list top to bottom and the first match wins.

use std::path::{Path, PathBuf};

use kiln_config::{ConfigError, FilenameTemplate, KilnConfig, RuleTest};
use path_clean::PathClean;
use regex::{Regex, RegexBuilder};

use crate::listing::slash_path;

#[derive(Debug, Clone)]
pub enum RuleKind {
    Transform {
        chain: Vec<String>,
        filename: Option<FilenameTemplate>,
    },
    Asset {
        filename: FilenameTemplate,
    },
}

#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub name: String,
    test: Regex,
    include: Vec<PathBuf>,
    exclude: Option<Regex>,
    pub kind: RuleKind,
}

impl CompiledRule {
    fn compile(name: &str, matcher: &RuleTest, kind: RuleKind) -> Result<Self, ConfigError> {
        let invalid = |e: regex::Error| ConfigError::InvalidRule {
            rule: name.to_string(),
            message: e.to_string(),
        };
        let test = RegexBuilder::new(&matcher.test)
            .case_insensitive(matcher.case_insensitive)
            .build()
            .map_err(invalid)?;
        let exclude = matcher
            .exclude
            .as_deref()
            .map(|pattern| Regex::new(pattern).map_err(invalid))
            .transpose()?;

        Ok(Self {
            name: name.to_string(),
            test,
            include: matcher.include.iter().map(|dir| dir.clean()).collect(),
            exclude,
            kind,
        })
    }

    /// Compile the full rule list of `config` in resolution order.
    pub fn compile_all(config: &KilnConfig) -> Result<Vec<Self>, ConfigError> {
        let mut rules = Vec::with_capacity(config.rules.len() + config.assets.len());

        for rule in &config.rules {
            let filename = rule
                .filename
                .as_deref()
                .map(FilenameTemplate::parse)
                .transpose()?;
            rules.push(Self::compile(
                &rule.name,
                &rule.matcher,
                RuleKind::Transform {
                    chain: rule.chain.clone(),
                    filename,
                },
            )?);
        }

        for rule in &config.assets {
            rules.push(Self::compile(
                &rule.name,
                &rule.matcher,
                RuleKind::Asset {
                    filename: FilenameTemplate::parse(&rule.filename)?,
                },
            )?);
        }

        Ok(rules)
    }

    /// A scoped rule only applies under its include directories.
    pub fn is_scoped(&self) -> bool {
        !self.include.is_empty()
    }

    pub fn is_asset(&self) -> bool {
        matches!(self.kind, RuleKind::Asset { .. })
    }

    pub fn matches(&self, rel: &Path) -> bool {
        let slashed = slash_path(rel);
        if !self.test.is_match(&slashed) {
            return false;
        }
        if self.is_scoped() && !self.include.iter().any(|dir| rel.starts_with(dir)) {
            return false;
        }
        !self
            .exclude
            .as_ref()
            .is_some_and(|exclude| exclude.is_match(&slashed))
    }
}
