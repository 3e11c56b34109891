//! Build descriptor resolution.
//!
//! [`Descriptor::resolve`] is a pure function of the configuration, the mode
//! and a [`SourceListing`]. It routes every listed file to exactly one rule,
//! plans every output path and applies the unhandled-asset policy. Every
//! configuration error surfaces here, before the output directory is touched.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use kiln_config::{
    ConfigError, FilenameTemplate, HtmlSource, KilnConfig, Mode, ModePolicy, OutputOptions,
    PerformanceOptions, SourceMapMode, TemplateVars, UnhandledPolicy,
};
use lightningcss::targets::Browsers;
use path_clean::PathClean;
use serde::Serialize;

use crate::clean::CleanPolicy;
use crate::error::{PipelineError, Result};
use crate::listing::{SourceListing, slash_path};
use crate::matcher::{CompiledRule, RuleKind};
use crate::transform::css::parse_targets;

/// Step that routes a file's result into the extracted stylesheet.
pub const EXTRACT_STEP: &str = "extract-css";

/// What happens to a routed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Action {
    /// Run the chain and emit the result as an entry bundle
    Entry { name: String, output: String },
    /// Run the chain and hand the result to the HTML plugin
    Template { output: String },
    /// Run the chain and emit the result at `output`
    Emit { output: String },
    /// Run the chain and append the result to the extracted stylesheet
    Stylesheet,
    /// Copy the bytes to `output`
    Copy { output: String },
    /// Matched by a rule that only feeds entry bundles; nothing is emitted
    Claimed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub source: PathBuf,
    /// Rule the file resolved to; `None` for entries and templates no rule
    /// matches, which pass through unchanged
    pub rule: Option<String>,
    pub chain: Vec<String>,
    pub action: Action,
}

impl Route {
    /// Whether the executor has work to do for this route.
    pub fn is_unit(&self) -> bool {
        !matches!(self.action, Action::Claimed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryPlan {
    pub name: String,
    pub source: PathBuf,
    pub output: String,
    /// External source map path (production only)
    pub map: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HtmlPlan {
    pub template: PathBuf,
    pub output: String,
    pub base: Option<String>,
    pub head_suffix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaviconPlan {
    pub source: PathBuf,
    pub output: String,
}

/// Fully resolved build for one invocation.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub mode: Mode,
    pub policy: ModePolicy,
    pub root: PathBuf,
    pub out_dir: PathBuf,
    pub output: OutputOptions,
    /// Every routed file, sorted by source path
    pub routes: Vec<Route>,
    /// Entries in declaration order
    pub entries: Vec<EntryPlan>,
    /// Files no rule matched, each listed once
    pub unhandled: Vec<PathBuf>,
    /// Extracted stylesheet output, when any route feeds it
    pub stylesheet: Option<String>,
    pub html: Option<HtmlPlan>,
    pub favicon: Option<FaviconPlan>,
    pub html_sources: Vec<HtmlSource>,
    pub clean: Option<CleanPolicy>,
    pub css_targets: Option<Browsers>,
    pub performance: PerformanceOptions,
    /// Source file → output path for everything emitted under its own name
    emitted: BTreeMap<PathBuf, String>,
    /// Output path → owner, for every planned output
    outputs: BTreeMap<String, String>,
}

impl Descriptor {
    pub fn resolve(config: &KilnConfig, mode: Mode, listing: &SourceListing) -> Result<Self> {
        let policy = mode.policy(&config.dev);
        let rules = CompiledRule::compile_all(config)?;
        let root = listing.root().to_path_buf();
        let out_dir = checked_out_dir(&root, config)?;

        let clean = if config.clean.enabled {
            Some(CleanPolicy::new(&config.clean.keep)?)
        } else {
            None
        };
        let css_targets = parse_targets(&config.css)?;

        let mut plan = Planner::default();
        let mut routes = Vec::new();
        let mut special: HashSet<PathBuf> = HashSet::new();

        // Entries
        if config.entries.is_empty() {
            return Err(ConfigError::NoEntries.into());
        }
        let entry_template = FilenameTemplate::parse(&config.output.filename)?;
        if config.entries.len() > 1 && !entry_template.uses_name() {
            return Err(ConfigError::InvalidTemplate {
                template: config.output.filename.clone(),
                message: "multiple entries need [name] in the output filename".to_string(),
            }
            .into());
        }

        let mut entries = Vec::new();
        for (name, spec) in &config.entries {
            let source = spec.path().clean();
            if !listing.contains(&source) {
                if spec.is_optional() {
                    tracing::debug!("Skipping optional entry '{}': {} not found", name, source.display());
                    continue;
                }
                return Err(ConfigError::EntryNotFound {
                    name: name.clone(),
                    path: source,
                }
                .into());
            }

            let field = format!("entries.{name}");
            let (rule, chain) = transform_route(&rules, &source, &field)?;
            let output = entry_template.render(&TemplateVars::for_entry(name));
            plan.claim(&output, &source)?;
            let map = match policy.source_maps {
                SourceMapMode::External => {
                    let map = format!("{output}.map");
                    plan.claim(&map, &source)?;
                    Some(map)
                }
                SourceMapMode::Inline => None,
            };
            plan.emitted.insert(source.clone(), output.clone());

            routes.push(Route {
                source: source.clone(),
                rule,
                chain,
                action: Action::Entry {
                    name: name.clone(),
                    output: output.clone(),
                },
            });
            entries.push(EntryPlan {
                name: name.clone(),
                source: source.clone(),
                output,
                map,
            });
            special.insert(source);
        }
        if entries.is_empty() {
            return Err(ConfigError::NoEntries.into());
        }

        // HTML template
        let html = match &config.html.template {
            Some(template) => {
                let template = template.clean();
                if !listing.contains(&template) {
                    return Err(ConfigError::InvalidValue {
                        field: "html.template".to_string(),
                        hint: Some(format!("{} does not exist", template.display())),
                    }
                    .into());
                }
                let (rule, chain) = transform_route(&rules, &template, "html.template")?;
                let output = FilenameTemplate::parse(&config.html.filename)?
                    .render(&TemplateVars::from_path(&template));
                plan.claim(&output, &template)?;
                routes.push(Route {
                    source: template.clone(),
                    rule,
                    chain,
                    action: Action::Template {
                        output: output.clone(),
                    },
                });
                special.insert(template.clone());
                Some(HtmlPlan {
                    template,
                    output,
                    base: config.html.base.clone(),
                    head_suffix: config.html.head_suffix.clone(),
                })
            }
            None => None,
        };

        // Favicon
        let favicon = match &config.html.favicon {
            Some(favicon) if html.is_some() => {
                let source = favicon.clean();
                if listing.contains(&source) {
                    let output = source
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_else(|| slash_path(&source));
                    plan.claim(&output, &source)?;
                    plan.emitted.insert(source.clone(), output.clone());
                    Some(FaviconPlan { source, output })
                } else {
                    tracing::warn!("Favicon {} not found, skipping", source.display());
                    None
                }
            }
            _ => None,
        };

        // Everything else in the source tree
        let mut unhandled = Vec::new();
        let mut styles = false;
        for source in listing.files() {
            if special.contains(source) {
                continue;
            }
            let Some(rule) = first_match(&rules, source)? else {
                unhandled.push(source.clone());
                continue;
            };

            let (chain, action) = match &rule.kind {
                RuleKind::Transform { chain, filename } => {
                    let action = if chain.iter().any(|step| step == EXTRACT_STEP) {
                        styles = true;
                        Action::Stylesheet
                    } else if let Some(filename) = filename {
                        let output = filename.render(&TemplateVars::from_path(source));
                        plan.claim(&output, source)?;
                        plan.emitted.insert(source.clone(), output.clone());
                        Action::Emit { output }
                    } else {
                        Action::Claimed
                    };
                    (chain.clone(), action)
                }
                RuleKind::Asset { filename } => {
                    let output = filename.render(&TemplateVars::from_path(source));
                    plan.claim(&output, source)?;
                    plan.emitted.insert(source.clone(), output.clone());
                    (Vec::new(), Action::Copy { output })
                }
            };

            tracing::debug!("{} → rule '{}'", source.display(), rule.name);
            routes.push(Route {
                source: source.clone(),
                rule: Some(rule.name.clone()),
                chain,
                action,
            });
        }

        apply_unhandled_policy(config.unhandled, &unhandled)?;

        let stylesheet = if styles {
            let output = FilenameTemplate::parse(&config.output.stylesheet)?.render(&TemplateVars {
                name: "style".to_string(),
                ext: "css".to_string(),
                path: String::new(),
            });
            plan.claim_named(&output, "extracted stylesheet")?;
            Some(output)
        } else {
            None
        };

        routes.sort_by(|a, b| a.source.cmp(&b.source));

        tracing::info!(
            "Resolved {} routes ({} entries, {} unhandled) for {} mode",
            routes.len(),
            entries.len(),
            unhandled.len(),
            mode
        );

        Ok(Self {
            mode,
            policy,
            root,
            out_dir,
            output: config.output.clone(),
            routes,
            entries,
            unhandled,
            stylesheet,
            html,
            favicon,
            html_sources: config.html.sources.clone(),
            clean,
            css_targets,
            performance: config.performance.clone(),
            emitted: plan.emitted,
            outputs: plan.outputs,
        })
    }

    /// Route for `source`, if it was routed.
    pub fn route(&self, source: &Path) -> Option<&Route> {
        self.routes.iter().find(|route| route.source == source)
    }

    /// Output path a source file is emitted at under its own name.
    pub fn emitted_output(&self, source: &Path) -> Option<&str> {
        self.emitted.get(source).map(String::as_str)
    }

    /// Every planned output path with the source that owns it, sorted.
    pub fn planned_outputs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outputs.iter().map(|(out, owner)| (out.as_str(), owner.as_str()))
    }

    /// Routes the executor turns into work units.
    pub fn units(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().filter(|route| route.is_unit())
    }
}

#[derive(Default)]
struct Planner {
    emitted: BTreeMap<PathBuf, String>,
    outputs: BTreeMap<String, String>,
}

impl Planner {
    fn claim(&mut self, output: &str, source: &Path) -> std::result::Result<(), ConfigError> {
        self.claim_named(output, &slash_path(source))
    }

    fn claim_named(&mut self, output: &str, owner: &str) -> std::result::Result<(), ConfigError> {
        if let Some(first) = self.outputs.get(output) {
            return Err(ConfigError::DuplicateOutput {
                path: PathBuf::from(output),
                first: first.clone(),
                second: owner.to_string(),
            });
        }
        self.outputs.insert(output.to_string(), owner.to_string());
        Ok(())
    }
}

/// First matching rule for `source`, enforcing the ambiguity contract: a
/// later match is only allowed when the first rule is scoped and the later
/// one is not.
fn first_match<'a>(
    rules: &'a [CompiledRule],
    source: &Path,
) -> std::result::Result<Option<&'a CompiledRule>, ConfigError> {
    let mut matching = rules.iter().filter(|rule| rule.matches(source));
    let Some(first) = matching.next() else {
        return Ok(None);
    };
    for second in matching {
        if !(first.is_scoped() && !second.is_scoped()) {
            return Err(ConfigError::AmbiguousRule {
                path: source.to_path_buf(),
                first: first.name.clone(),
                second: second.name.clone(),
            });
        }
    }
    Ok(Some(first))
}

/// Route for files the configuration names directly. They must not resolve
/// to an asset rule; without any match they pass through unchanged.
fn transform_route(
    rules: &[CompiledRule],
    source: &Path,
    field: &str,
) -> std::result::Result<(Option<String>, Vec<String>), ConfigError> {
    match first_match(rules, source)? {
        Some(rule) => match &rule.kind {
            RuleKind::Transform { chain, .. } => Ok((Some(rule.name.clone()), chain.clone())),
            RuleKind::Asset { .. } => Err(ConfigError::InvalidValue {
                field: field.to_string(),
                hint: Some(format!(
                    "{} resolves to asset rule '{}'; it needs a transform rule",
                    source.display(),
                    rule.name
                )),
            }),
        },
        None => Ok((None, Vec::new())),
    }
}

fn apply_unhandled_policy(policy: UnhandledPolicy, unhandled: &[PathBuf]) -> Result<()> {
    if unhandled.is_empty() {
        return Ok(());
    }
    match policy {
        UnhandledPolicy::Error => return Err(PipelineError::UnhandledAssets(unhandled.to_vec())),
        UnhandledPolicy::Warn => {
            for path in unhandled {
                tracing::warn!("No rule matches {}, skipping", path.display());
            }
        }
        UnhandledPolicy::Ignore => {
            for path in unhandled {
                tracing::debug!("No rule matches {}, ignoring", path.display());
            }
        }
    }
    Ok(())
}

/// Absolute output directory, refusing locations a clean would destroy.
fn checked_out_dir(root: &Path, config: &KilnConfig) -> Result<PathBuf> {
    let root = root.clean();
    let out_dir = root.join(&config.output.dir).clean();
    let source_dir = root.join(&config.source_dir).clean();

    if out_dir == root || root.starts_with(&out_dir) {
        return Err(PipelineError::InvalidOutputPath(format!(
            "output directory '{}' contains the project root",
            config.output.dir.display()
        )));
    }
    if source_dir.starts_with(&out_dir) {
        return Err(PipelineError::InvalidOutputPath(format!(
            "output directory '{}' contains the source directory",
            config.output.dir.display()
        )));
    }
    Ok(out_dir)
}
