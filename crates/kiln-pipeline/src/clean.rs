//! Output directory purge.
//!
//! Everything under the output directory is deleted except paths matching an
//! exemption glob. An exempt directory keeps its whole subtree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use kiln_config::ConfigError;
use serde::Serialize;

use crate::error::{PipelineError, Result};
use crate::listing::slash_path;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Paths touched by one clean pass, relative to the output directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    pub removed: Vec<PathBuf>,
    pub kept: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct CleanPolicy {
    keep: Vec<Pattern>,
}

impl CleanPolicy {
    pub fn new<S: AsRef<str>>(keep: &[S]) -> std::result::Result<Self, ConfigError> {
        let keep = keep
            .iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Pattern::new(pattern).map_err(|e| ConfigError::InvalidGlob {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { keep })
    }

    pub fn is_exempt(&self, rel: &Path) -> bool {
        let rel = slash_path(rel);
        self.keep
            .iter()
            .any(|pattern| pattern.matches_with(&rel, MATCH_OPTIONS))
    }

    /// Purge `out_dir`, creating it when missing.
    pub fn apply(&self, out_dir: &Path) -> Result<CleanReport> {
        let mut report = CleanReport::default();

        if !out_dir.exists() {
            fs::create_dir_all(out_dir).map_err(|source| PipelineError::Clean {
                path: out_dir.to_path_buf(),
                source,
            })?;
            tracing::debug!("Created output directory {}", out_dir.display());
            return Ok(report);
        }
        if !out_dir.is_dir() {
            return Err(PipelineError::Clean {
                path: out_dir.to_path_buf(),
                source: io::Error::new(io::ErrorKind::AlreadyExists, "not a directory"),
            });
        }

        self.clean_dir(out_dir, out_dir, &mut report)?;
        report.removed.sort();
        report.kept.sort();

        tracing::info!(
            "Cleaned {}: {} removed, {} kept",
            out_dir.display(),
            report.removed.len(),
            report.kept.len()
        );
        Ok(report)
    }

    /// Returns whether `dir` is empty once its contents are processed.
    fn clean_dir(&self, out_dir: &Path, dir: &Path, report: &mut CleanReport) -> Result<bool> {
        let fail = |path: &Path| {
            let path = path.to_path_buf();
            move |source: io::Error| PipelineError::Clean { path, source }
        };

        let mut empty = true;
        for entry in fs::read_dir(dir).map_err(fail(dir))? {
            let entry = entry.map_err(fail(dir))?;
            let path = entry.path();
            let rel = path.strip_prefix(out_dir).unwrap_or(path.as_path()).to_path_buf();

            if self.is_exempt(&rel) {
                tracing::debug!("Keeping {}", rel.display());
                report.kept.push(rel);
                empty = false;
                continue;
            }

            let file_type = entry.file_type().map_err(fail(&path))?;
            if file_type.is_dir() {
                if self.clean_dir(out_dir, &path, report)? {
                    fs::remove_dir(&path).map_err(fail(&path))?;
                    report.removed.push(rel);
                } else {
                    empty = false;
                }
            } else {
                fs::remove_file(&path).map_err(fail(&path))?;
                report.removed.push(rel);
            }
        }
        Ok(empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn policy() -> CleanPolicy {
        CleanPolicy::new(&[".git", ".gitignore", "README.md"]).unwrap()
    }

    #[test]
    fn exemptions_match_relative_paths() {
        let policy = policy();
        assert!(policy.is_exempt(Path::new(".git")));
        assert!(policy.is_exempt(Path::new("README.md")));
        assert!(!policy.is_exempt(Path::new("docs/README.md")));
        assert!(!policy.is_exempt(Path::new("index.html")));
    }

    #[test]
    fn wildcard_exemptions() {
        let policy = CleanPolicy::new(&["*.txt", "keep/**"]).unwrap();
        assert!(policy.is_exempt(Path::new("robots.txt")));
        assert!(!policy.is_exempt(Path::new("nested/robots.txt")));
        assert!(policy.is_exempt(Path::new("keep/a/b.js")));
    }

    #[test]
    fn invalid_glob_is_config_error() {
        let err = CleanPolicy::new(&["[abc"]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidGlob { .. }));
    }

    #[test]
    fn creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("dist");
        let report = policy().apply(&out).unwrap();
        assert!(out.is_dir());
        assert_eq!(report, CleanReport::default());
    }

    #[test]
    fn removes_emptied_directories() {
        let dir = TempDir::new().unwrap();
        let out = dir.path();
        fs::create_dir_all(out.join("app/old")).unwrap();
        fs::write(out.join("app/old/x.js"), "x").unwrap();

        let report = policy().apply(out).unwrap();
        assert!(!out.join("app").exists());
        assert_eq!(
            report.removed,
            vec![
                PathBuf::from("app"),
                PathBuf::from("app/old"),
                PathBuf::from("app/old/x.js")
            ]
        );
    }

    #[test]
    fn file_in_place_of_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("dist");
        fs::write(&out, "not a dir").unwrap();
        assert!(matches!(
            policy().apply(&out),
            Err(PipelineError::Clean { .. })
        ));
    }
}
