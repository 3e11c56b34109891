//! Runs a resolved [`Descriptor`].
//!
//! Order of operations: registry check and output path validation, clean,
//! every unit in parallel, stylesheet and HTML assembly, write, report.
//! Everything that can reject the build happens before the clean step.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Instant;

use kiln_config::{KilnConfig, Mode};
use rayon::prelude::*;

use crate::descriptor::{Action, Descriptor, Route};
use crate::error::{PipelineError, Result, TransformError};
use crate::html_plugin::{self, HtmlInjection};
use crate::listing::{SourceListing, slash_path};
use crate::report::{BuildReport, EmittedFile, FileFailure, OutputKind, size_hints};
use crate::sourcemap;
use crate::transform::{Asset, TransformContext, TransformRegistry};
use crate::writer::{OutputFile, validate_output_path, write_outputs};

/// What one unit produced.
enum UnitOutput {
    Files(Vec<(OutputFile, OutputKind)>),
    Stylesheet(String),
    Template(String),
}

pub struct Pipeline {
    registry: TransformRegistry,
}

impl Pipeline {
    pub fn new(registry: TransformRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TransformRegistry {
        &self.registry
    }

    pub fn run(&self, descriptor: &Descriptor) -> Result<BuildReport> {
        let start = Instant::now();

        self.registry.check(descriptor)?;
        for (output, _) in descriptor.planned_outputs() {
            validate_output_path(&descriptor.out_dir, output)?;
        }

        let clean = match &descriptor.clean {
            Some(policy) => Some(policy.apply(&descriptor.out_dir)?),
            None => {
                fs::create_dir_all(&descriptor.out_dir).map_err(|source| PipelineError::Write {
                    path: descriptor.out_dir.clone(),
                    source,
                })?;
                None
            }
        };

        let ctx = TransformContext::new(descriptor);
        let units: Vec<&Route> = descriptor.units().collect();
        tracing::info!("Running {} units", units.len());

        // Collecting an indexed parallel iterator keeps route order
        let results: Vec<std::result::Result<UnitOutput, FileFailure>> = units
            .par_iter()
            .map(|route| self.run_unit(route, &ctx))
            .collect();

        let mut files: Vec<(OutputFile, OutputKind)> = Vec::new();
        let mut failures = Vec::new();
        let mut styles = Vec::new();
        let mut template = None;

        for result in results {
            match result {
                Ok(UnitOutput::Files(out)) => files.extend(out),
                Ok(UnitOutput::Stylesheet(css)) => styles.push(css),
                Ok(UnitOutput::Template(html)) => template = Some(html),
                Err(failure) => {
                    tracing::error!("{}", failure);
                    failures.push(failure);
                }
            }
        }

        let stylesheet = match &descriptor.stylesheet {
            Some(output) if !styles.is_empty() => {
                files.push((OutputFile::new(output.clone(), styles.concat()), OutputKind::Stylesheet));
                Some(output.as_str())
            }
            _ => None,
        };

        let favicon = match &descriptor.favicon {
            Some(plan) => match fs::read(descriptor.root.join(&plan.source)) {
                Ok(bytes) => {
                    files.push((OutputFile::new(plan.output.clone(), bytes), OutputKind::Favicon));
                    Some(plan.output.as_str())
                }
                Err(e) => {
                    failures.push(FileFailure {
                        path: plan.source.clone(),
                        step: None,
                        message: e.to_string(),
                    });
                    None
                }
            },
            None => None,
        };

        if let (Some(plan), Some(template)) = (&descriptor.html, template) {
            let built: HashSet<&str> = files.iter().map(|(file, _)| file.path.as_str()).collect();
            let mut injection = HtmlInjection {
                base: plan.base.clone(),
                favicon: favicon.map(|output| descriptor.output.public_url(output)),
                stylesheet: stylesheet.map(|output| descriptor.output.public_url(output)),
                ..Default::default()
            };
            for entry in &descriptor.entries {
                if !built.contains(entry.output.as_str()) {
                    continue;
                }
                let url = descriptor.output.public_url(&entry.output);
                if !plan.head_suffix.is_empty() && entry.name.ends_with(&plan.head_suffix) {
                    injection.head_scripts.push(url);
                } else {
                    injection.body_scripts.push(url);
                }
            }
            let html = html_plugin::render(&template, &injection);
            files.push((OutputFile::new(plan.output.clone(), html), OutputKind::Html));
        }

        files.sort_by(|(a, _), (b, _)| a.path.cmp(&b.path));
        let (outputs, kinds): (Vec<OutputFile>, Vec<OutputKind>) = files.into_iter().unzip();
        write_outputs(&descriptor.out_dir, &outputs)?;

        let emitted: Vec<EmittedFile> = outputs
            .into_iter()
            .zip(kinds)
            .map(|(file, kind)| EmittedFile {
                size: file.contents.len() as u64,
                path: file.path,
                kind,
            })
            .collect();
        let hints = size_hints(&emitted, &descriptor.performance);
        failures.sort_by(|a, b| a.path.cmp(&b.path));

        let report = BuildReport {
            mode: descriptor.mode,
            emitted,
            failures,
            unhandled: descriptor.unhandled.clone(),
            clean,
            hints,
            duration: start.elapsed(),
        };

        tracing::info!(
            "Emitted {} files ({} bytes), {} failed",
            report.emitted.len(),
            report.total_size(),
            report.failures.len()
        );
        Ok(report)
    }

    fn run_unit(
        &self,
        route: &Route,
        ctx: &TransformContext<'_>,
    ) -> std::result::Result<UnitOutput, FileFailure> {
        let descriptor = ctx.descriptor();
        let bytes = fs::read(descriptor.root.join(&route.source))
            .map_err(|e| failure(&route.source, None, &TransformError::Io(e)))?;

        if let Action::Copy { output } = &route.action {
            return Ok(UnitOutput::Files(vec![(
                OutputFile::new(output.clone(), bytes),
                OutputKind::Asset,
            )]));
        }

        let original = String::from_utf8(bytes)
            .map_err(|_| failure(&route.source, None, &TransformError::NotUtf8))?;
        let mut asset = Asset::new(route.source.clone(), original.clone());
        let preserves_lines = self
            .registry
            .run_chain(&route.chain, &mut asset, ctx)
            .map_err(|f| failure(&route.source, Some(f.step), &f.error))?;

        let out = match &route.action {
            Action::Entry { output, .. } => {
                let map = sourcemap::build_map(
                    output,
                    &slash_path(&route.source),
                    &original,
                    &asset.content,
                    preserves_lines,
                );
                let bundle =
                    sourcemap::attach(asset.content, output, &map, descriptor.policy.source_maps);
                let mut files = vec![(OutputFile::new(output.clone(), bundle.code), OutputKind::Entry)];
                let map_path = descriptor
                    .entries
                    .iter()
                    .find(|entry| entry.output == *output)
                    .and_then(|entry| entry.map.clone());
                if let (Some(path), Some(map)) = (map_path, bundle.map) {
                    files.push((OutputFile::new(path, map), OutputKind::SourceMap));
                }
                UnitOutput::Files(files)
            }
            Action::Template { .. } => UnitOutput::Template(asset.content),
            Action::Emit { output } => UnitOutput::Files(vec![(
                OutputFile::new(output.clone(), asset.content),
                OutputKind::Asset,
            )]),
            Action::Stylesheet => UnitOutput::Stylesheet(asset.content),
            Action::Copy { .. } | Action::Claimed => UnitOutput::Files(Vec::new()),
        };
        Ok(out)
    }
}

fn failure(path: &Path, step: Option<String>, error: &TransformError) -> FileFailure {
    FileFailure {
        path: path.to_path_buf(),
        step,
        message: error.to_string(),
    }
}

/// Scan, resolve and run in one call, with the registry the configuration
/// implies.
pub fn build(root: &Path, config: &KilnConfig, mode: Mode) -> Result<BuildReport> {
    let listing = SourceListing::for_config(root, config)?;
    let descriptor = Descriptor::resolve(config, mode, &listing)?;
    Pipeline::new(TransformRegistry::from_config(config)).run(&descriptor)
}
