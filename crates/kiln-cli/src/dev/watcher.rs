//! File system watcher with debouncing for `kiln serve`.
//!
//! Watches the source directory recursively and the config file on its own.
//! Hidden files, the output directory and the configured ignore patterns
//! never trigger a rebuild.

use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};

use glob::Pattern;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::{CliError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Modified(PathBuf),
    Created(PathBuf),
    Removed(PathBuf),
}

impl FileChange {
    pub fn path(&self) -> &Path {
        match self {
            FileChange::Modified(p) | FileChange::Created(p) | FileChange::Removed(p) => p,
        }
    }
}

/// Paths that never trigger a rebuild.
#[derive(Debug, Clone)]
pub struct IgnoreSet {
    root: PathBuf,
    patterns: Vec<Pattern>,
    dirs: Vec<PathBuf>,
}

impl IgnoreSet {
    /// `patterns` are globs matched against each path component and against
    /// the root-relative path (`node_modules`, `*.log`, `src/tmp/*`).
    pub fn new(root: PathBuf, patterns: &[String], dirs: Vec<PathBuf>) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| {
                    CliError::InvalidArgument(format!("invalid watch ignore pattern '{p}': {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            root,
            patterns,
            dirs,
        })
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        if self.dirs.iter().any(|dir| path.starts_with(dir)) {
            return true;
        }

        // Only paths inside the project are watched
        let Ok(rel) = path.strip_prefix(&self.root) else {
            return true;
        };

        let rel_str = rel.to_string_lossy().replace('\\', "/");
        if self.patterns.iter().any(|p| p.matches(&rel_str)) {
            return true;
        }

        rel.components().any(|component| {
            let Component::Normal(name) = component else {
                return false;
            };
            let name = name.to_string_lossy();
            name.starts_with('.') || self.patterns.iter().any(|p| p.matches(&name))
        })
    }
}

/// Keeps the notify watcher alive; changes arrive on the paired receiver.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    watched: Vec<PathBuf>,
}

impl FileWatcher {
    /// Watch `dirs` recursively and `files` non-recursively.
    ///
    /// Repeated events for the same path inside `debounce_ms` are dropped.
    pub fn new(
        dirs: Vec<PathBuf>,
        files: Vec<PathBuf>,
        ignore: IgnoreSet,
        debounce_ms: u64,
    ) -> Result<(Self, mpsc::Receiver<FileChange>)> {
        for path in dirs.iter().chain(&files) {
            if !path.exists() {
                return Err(CliError::FileNotFound(path.clone()));
            }
        }

        let (tx, rx) = mpsc::channel(100);
        let debounce = Duration::from_millis(debounce_ms);
        let mut last_event: Option<(PathBuf, Instant)> = None;
        let explicit = files.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("File watcher error: {}", e);
                    return;
                }
            };

            for path in &event.paths {
                if !explicit.contains(path) && ignore.is_ignored(path) {
                    continue;
                }

                let now = Instant::now();
                if let Some((last_path, last_time)) = &last_event {
                    if last_path == path && now.duration_since(*last_time) < debounce {
                        continue;
                    }
                }
                last_event = Some((path.clone(), now));

                let change = match event.kind {
                    EventKind::Create(_) => FileChange::Created(path.clone()),
                    EventKind::Modify(_) => FileChange::Modified(path.clone()),
                    EventKind::Remove(_) => FileChange::Removed(path.clone()),
                    _ => continue,
                };

                // The receiver is gone once the serve loop exits
                let _ = tx.blocking_send(change);
            }
        })?;

        for dir in &dirs {
            watcher.watch(dir, RecursiveMode::Recursive)?;
        }
        for file in &files {
            watcher.watch(file, RecursiveMode::NonRecursive)?;
        }

        let watched = dirs.into_iter().chain(files).collect();
        Ok((
            Self {
                _watcher: watcher,
                watched,
            },
            rx,
        ))
    }

    pub fn watched(&self) -> &[PathBuf] {
        &self.watched
    }
}
