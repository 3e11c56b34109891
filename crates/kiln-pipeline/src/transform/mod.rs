//! Transform steps and the registry chains are resolved against.
//!
//! A chain is a list of step names in application order. The first step
//! receives the file contents and each later step receives the previous
//! step's output. Steps are looked up by name in a [`TransformRegistry`].

pub mod command;
pub mod css;
pub mod html;
pub mod script;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_config::{ConfigError, HtmlSource, KilnConfig};
use lightningcss::targets::Browsers;
use path_clean::PathClean;

use crate::descriptor::Descriptor;
use crate::error::TransformError;

pub use command::CommandTransform;
pub use css::{CssTransform, ExtractCss};
pub use html::HtmlTransform;
pub use script::ScriptTransform;

/// A text file moving through a transform chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Project-relative source path
    pub source: PathBuf,
    pub content: String,
    /// Set by the extraction step; the result joins the shared stylesheet
    pub extracted: bool,
}

impl Asset {
    pub fn new(source: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
            extracted: false,
        }
    }

    /// Extension of the source file, without the dot.
    pub fn ext(&self) -> &str {
        self.source
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
    }
}

/// Read-only view of the descriptor handed to every step.
#[derive(Clone, Copy)]
pub struct TransformContext<'a> {
    descriptor: &'a Descriptor,
}

impl<'a> TransformContext<'a> {
    pub fn new(descriptor: &'a Descriptor) -> Self {
        Self { descriptor }
    }

    pub fn descriptor(&self) -> &'a Descriptor {
        self.descriptor
    }

    pub fn root(&self) -> &'a Path {
        &self.descriptor.root
    }

    pub fn css_targets(&self) -> Option<Browsers> {
        self.descriptor.css_targets
    }

    pub fn html_sources(&self) -> &'a [HtmlSource] {
        &self.descriptor.html_sources
    }

    /// Public URL for a reference found in `from`, when it points at a file
    /// this build emits. External and absolute references yield `None`.
    pub fn rewrite_url(&self, from: &Path, reference: &str) -> Option<String> {
        let reference = reference.trim();
        if is_external(reference) {
            return None;
        }

        let split = reference.find(['?', '#']).unwrap_or(reference.len());
        let (path, suffix) = reference.split_at(split);
        let dir = from.parent().unwrap_or_else(|| Path::new(""));
        let resolved = dir.join(path).clean();

        match self.descriptor.emitted_output(&resolved) {
            Some(output) => Some(format!("{}{}", self.descriptor.output.public_url(output), suffix)),
            None => {
                tracing::warn!(
                    "{}: reference '{}' does not resolve to an emitted file",
                    from.display(),
                    reference
                );
                None
            }
        }
    }
}

fn is_external(reference: &str) -> bool {
    reference.is_empty()
        || reference.starts_with('#')
        || reference.starts_with('/')
        || reference.contains("://")
        || ["data:", "mailto:", "tel:", "javascript:"]
            .iter()
            .any(|scheme| reference.starts_with(scheme))
}

/// A named step in a transform chain.
pub trait Transform: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, asset: &mut Asset, ctx: &TransformContext<'_>) -> Result<(), TransformError>;

    /// Whether output line N always comes from input line N. Chains made
    /// only of such steps get line-accurate source maps.
    fn preserves_lines(&self) -> bool {
        false
    }
}

/// Step that failed while running a chain.
#[derive(Debug)]
pub struct StepFailure {
    pub step: String,
    pub error: TransformError,
}

#[derive(Clone, Default)]
pub struct TransformRegistry {
    steps: HashMap<String, Arc<dyn Transform>>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the in-process steps.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(ScriptTransform);
        registry.register(CssTransform::print());
        registry.register(CssTransform::prefix());
        registry.register(ExtractCss);
        registry.register(HtmlTransform);
        registry
    }

    /// Built-in steps plus every command step the configuration declares.
    pub fn from_config(config: &KilnConfig) -> Self {
        let mut registry = Self::builtin();
        for (name, step) in config.command_steps() {
            registry.register(CommandTransform::new(name, step));
        }
        registry
    }

    /// Register a step under its own name, replacing any previous one.
    pub fn register<T: Transform + 'static>(&mut self, step: T) {
        self.steps.insert(step.name().to_string(), Arc::new(step));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Transform> {
        self.steps.get(name).map(|step| step.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.steps.contains_key(name)
    }

    /// Every chain in `descriptor` must name registered steps.
    pub fn check(&self, descriptor: &Descriptor) -> Result<(), ConfigError> {
        for route in &descriptor.routes {
            if let Some(step) = route.chain.iter().find(|step| !self.contains(step)) {
                return Err(ConfigError::UnknownStep {
                    rule: route.rule.clone().unwrap_or_default(),
                    step: step.clone(),
                });
            }
        }
        Ok(())
    }

    /// Run `chain` over `asset` in order, stopping at the first failure.
    ///
    /// Returns whether every step preserved lines.
    pub fn run_chain(
        &self,
        chain: &[String],
        asset: &mut Asset,
        ctx: &TransformContext<'_>,
    ) -> Result<bool, StepFailure> {
        let mut preserves_lines = true;
        for name in chain {
            let step = self.get(name).ok_or_else(|| StepFailure {
                step: name.clone(),
                error: TransformError::Missing(name.clone()),
            })?;
            tracing::trace!("{}: applying '{}'", asset.source.display(), name);
            step.apply(asset, ctx).map_err(|error| StepFailure {
                step: name.clone(),
                error,
            })?;
            preserves_lines &= step.preserves_lines();
        }
        Ok(preserves_lines)
    }
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.steps.keys().collect();
        names.sort();
        f.debug_struct("TransformRegistry")
            .field("steps", &names)
            .finish()
    }
}
