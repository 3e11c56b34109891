//! Build report: what was emitted, what failed, what was skipped.

use std::path::PathBuf;
use std::time::Duration;

use kiln_config::{Mode, PerformanceOptions};
use serde::{Serialize, Serializer};

use crate::clean::CleanReport;

/// A unit whose chain failed. Other units are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    /// Project-relative source path
    pub path: PathBuf,
    /// Step that failed, if the failure happened inside a chain
    pub step: Option<String>,
    pub message: String,
}

impl std::fmt::Display for FileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.step {
            Some(step) => write!(f, "{} [{}]: {}", self.path.display(), step, self.message),
            None => write!(f, "{}: {}", self.path.display(), self.message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputKind {
    Entry,
    SourceMap,
    Stylesheet,
    Html,
    Asset,
    Favicon,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmittedFile {
    /// Path relative to the output directory
    pub path: String,
    pub size: u64,
    pub kind: OutputKind,
}

/// An emitted file above its configured size limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeHint {
    pub path: String,
    pub size: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub mode: Mode,
    /// Sorted by path
    pub emitted: Vec<EmittedFile>,
    /// Sorted by path
    pub failures: Vec<FileFailure>,
    pub unhandled: Vec<PathBuf>,
    pub clean: Option<CleanReport>,
    pub hints: Vec<SizeHint>,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.emitted.iter().map(|file| file.size).sum()
    }

    pub fn emitted_of(&self, kind: OutputKind) -> impl Iterator<Item = &EmittedFile> {
        self.emitted.iter().filter(move |file| file.kind == kind)
    }
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Size hints for `emitted`, logged as warnings. Empty unless hints are on.
pub fn size_hints(emitted: &[EmittedFile], performance: &PerformanceOptions) -> Vec<SizeHint> {
    if !performance.hints {
        return Vec::new();
    }

    let mut hints = Vec::new();
    for file in emitted {
        let limit = match file.kind {
            OutputKind::Entry => performance.max_entrypoint_size,
            OutputKind::SourceMap => continue,
            _ => performance.max_asset_size,
        };
        if file.size > limit {
            tracing::warn!(
                "{} is {} bytes, above the recommended limit of {} bytes",
                file.path,
                file.size,
                limit
            );
            hints.push(SizeHint {
                path: file.path.clone(),
                size: file.size,
                limit,
            });
        }
    }
    hints
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, size: u64, kind: OutputKind) -> EmittedFile {
        EmittedFile {
            path: path.to_string(),
            size,
            kind,
        }
    }

    #[test]
    fn hints_are_off_by_default() {
        let emitted = [file("app/app.js", 10_000_000, OutputKind::Entry)];
        assert!(size_hints(&emitted, &PerformanceOptions::default()).is_empty());
    }

    #[test]
    fn hints_use_per_kind_limits() {
        let performance = PerformanceOptions {
            hints: true,
            max_asset_size: 100,
            max_entrypoint_size: 1000,
        };
        let emitted = [
            file("app/app.js", 500, OutputKind::Entry),
            file("app/app.js.map", 5000, OutputKind::SourceMap),
            file("src/img/big.png", 500, OutputKind::Asset),
        ];
        let hints = size_hints(&emitted, &performance);
        assert_eq!(
            hints,
            vec![SizeHint {
                path: "src/img/big.png".to_string(),
                size: 500,
                limit: 100
            }]
        );
    }

    #[test]
    fn failure_display_names_path_and_step() {
        let failure = FileFailure {
            path: PathBuf::from("src/app/index.ts"),
            step: Some("typescript".to_string()),
            message: "'esbuild' exited with status 1".to_string(),
        };
        assert_eq!(
            failure.to_string(),
            "src/app/index.ts [typescript]: 'esbuild' exited with status 1"
        );
    }

    #[test]
    fn report_serializes_duration_as_millis() {
        let report = BuildReport {
            mode: Mode::Production,
            emitted: vec![file("index.html", 10, OutputKind::Html)],
            failures: Vec::new(),
            unhandled: Vec::new(),
            clean: None,
            hints: Vec::new(),
            duration: Duration::from_millis(42),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["duration_ms"], 42);
        assert_eq!(value["emitted"][0]["kind"], "html");
        assert_eq!(report.total_size(), 10);
        assert!(report.is_success());
    }
}
