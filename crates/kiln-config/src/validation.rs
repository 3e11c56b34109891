//! Pluggable config validation strategies
//!
//! Schema validation never touches the filesystem. Checks that depend on the
//! source listing (missing entries, ambiguous routes) happen when the
//! descriptor is resolved.

use std::collections::HashSet;

use regex::RegexBuilder;

use crate::config::KilnConfig;
use crate::error::{ConfigError, Result};
use crate::rules::RuleTest;
use crate::template::FilenameTemplate;

/// Trait for pluggable config validation strategies
pub trait ConfigValidator {
    fn validate(&self, config: &KilnConfig) -> Result<()>;
}

/// Schema-only validation (no filesystem checks)
///
/// # Example
///
/// ```
/// use kiln_config::{ConfigValidator, KilnConfig, SchemaValidator};
///
/// SchemaValidator.validate(&KilnConfig::default()).unwrap();
/// ```
pub struct SchemaValidator;

impl ConfigValidator for SchemaValidator {
    fn validate(&self, config: &KilnConfig) -> Result<()> {
        config.resolved_mode()?;

        if config.entries.is_empty() {
            return Err(ConfigError::NoEntries);
        }
        for (name, entry) in &config.entries {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "entries".to_string(),
                    hint: Some("Entry names cannot be empty".to_string()),
                });
            }
            if entry.path().as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("entries.{name}"),
                    hint: Some("Entry path cannot be empty".to_string()),
                });
            }
        }

        let entry_template = FilenameTemplate::parse(&config.output.filename)?;
        if config.entries.len() > 1 && !entry_template.uses_name() {
            return Err(ConfigError::InvalidTemplate {
                template: config.output.filename.clone(),
                message: "multiple entries need [name] in the output filename".to_string(),
            });
        }
        FilenameTemplate::parse(&config.output.stylesheet)?;
        FilenameTemplate::parse(&config.html.filename)?;

        let known_steps: HashSet<String> = config.known_steps().into_iter().collect();
        let mut rule_names = HashSet::new();

        for rule in &config.rules {
            validate_rule_name(&rule.name, &mut rule_names)?;
            compile_test(&rule.name, &rule.matcher)?;
            if rule.chain.is_empty() {
                return Err(ConfigError::InvalidRule {
                    rule: rule.name.clone(),
                    message: "transform chain is empty".to_string(),
                });
            }
            for step in &rule.chain {
                if !known_steps.contains(step) {
                    return Err(ConfigError::UnknownStep {
                        rule: rule.name.clone(),
                        step: step.clone(),
                    });
                }
            }
            if let Some(filename) = &rule.filename {
                FilenameTemplate::parse(filename)?;
            }
        }

        for rule in &config.assets {
            validate_rule_name(&rule.name, &mut rule_names)?;
            compile_test(&rule.name, &rule.matcher)?;
            FilenameTemplate::parse(&rule.filename)?;
        }

        for (name, step) in config.command_steps() {
            if step.command.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("transforms.{name}.command"),
                    hint: Some("Command steps need a program to run".to_string()),
                });
            }
        }

        for pattern in &config.clean.keep {
            glob::Pattern::new(pattern).map_err(|e| ConfigError::InvalidGlob {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
        }

        Ok(())
    }
}

fn validate_rule_name(name: &str, seen: &mut HashSet<String>) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ConfigError::InvalidRule {
            rule: name.to_string(),
            message: "rule name cannot be empty".to_string(),
        });
    }
    if !seen.insert(name.to_string()) {
        return Err(ConfigError::InvalidRule {
            rule: name.to_string(),
            message: "rule names must be unique".to_string(),
        });
    }
    Ok(())
}

fn compile_test(rule: &str, matcher: &RuleTest) -> Result<()> {
    let invalid = |e: regex::Error| ConfigError::InvalidRule {
        rule: rule.to_string(),
        message: e.to_string(),
    };
    RegexBuilder::new(&matcher.test)
        .case_insensitive(matcher.case_insensitive)
        .build()
        .map_err(invalid)?;
    if let Some(exclude) = &matcher.exclude {
        RegexBuilder::new(exclude).build().map_err(invalid)?;
    }
    Ok(())
}

/// Convenience function for schema-only validation
pub fn validate_schema(config: &KilnConfig) -> Result<()> {
    SchemaValidator.validate(config)
}
