//! Source tree listing.
//!
//! The listing is the only view of the filesystem descriptor resolution gets.
//! Paths are project-relative and sorted, so routing is deterministic.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use kiln_config::KilnConfig;
use path_clean::PathClean;
use walkdir::WalkDir;

use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct SourceListing {
    root: PathBuf,
    files: Vec<PathBuf>,
    /// Files referenced by configuration that live outside the source tree
    extras: BTreeSet<PathBuf>,
}

impl SourceListing {
    /// Walk `source_dir` below `root`, skipping the output directory.
    pub fn scan(root: &Path, source_dir: &Path, out_dir: &Path) -> Result<Self> {
        let source_rel = source_dir.clean();
        let source_abs = root.join(&source_rel).clean();
        let out_abs = root.join(out_dir).clean();
        let mut files = Vec::new();

        if source_abs.is_dir() {
            let walker = WalkDir::new(&source_abs)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| entry.path().clean() != out_abs);

            for entry in walker {
                let entry = entry.map_err(io::Error::from)?;
                if !entry.file_type().is_file() {
                    continue;
                }
                if let Ok(rel) = entry.path().strip_prefix(&source_abs) {
                    files.push(source_rel.join(rel).clean());
                }
            }
        } else {
            tracing::warn!("Source directory {} does not exist", source_abs.display());
        }

        files.sort();
        tracing::debug!("Listed {} source files under {}", files.len(), source_abs.display());

        Ok(Self {
            root: root.to_path_buf(),
            files,
            extras: BTreeSet::new(),
        })
    }

    /// Scan the configured source directory and probe every other file the
    /// configuration names (entries, HTML template, favicon).
    pub fn for_config(root: &Path, config: &KilnConfig) -> Result<Self> {
        let mut listing = Self::scan(root, &config.source_dir, &config.output.dir)?;
        for entry in config.entries.values() {
            listing.probe(entry.path());
        }
        if let Some(template) = &config.html.template {
            listing.probe(template);
        }
        if let Some(favicon) = &config.html.favicon {
            listing.probe(favicon);
        }
        Ok(listing)
    }

    /// Build a listing from known project-relative paths without touching
    /// the filesystem.
    pub fn from_paths<I, P>(root: impl Into<PathBuf>, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut files: Vec<PathBuf> = paths.into_iter().map(|p| p.into().clean()).collect();
        files.sort();
        files.dedup();
        Self {
            root: root.into(),
            files,
            extras: BTreeSet::new(),
        }
    }

    /// Record `rel` if it exists on disk and is not already listed.
    ///
    /// Returns whether the file is now part of the listing.
    pub fn probe(&mut self, rel: &Path) -> bool {
        let rel = rel.clean();
        if self.contains(&rel) {
            return true;
        }
        if self.root.join(&rel).is_file() {
            self.extras.insert(rel);
            true
        } else {
            false
        }
    }

    /// Add an out-of-tree file without checking the filesystem.
    pub fn with_extra(mut self, rel: impl Into<PathBuf>) -> Self {
        let rel = rel.into().clean();
        if !self.contains(&rel) {
            self.extras.insert(rel);
        }
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files found under the source directory, sorted.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn contains(&self, rel: &Path) -> bool {
        self.files.binary_search_by(|f| f.as_path().cmp(rel)).is_ok() || self.extras.contains(rel)
    }

    pub fn len(&self) -> usize {
        self.files.len() + self.extras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `/`-separated form of a relative path, used for rule tests and output
/// names on every platform.
pub fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
