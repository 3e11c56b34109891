//! Writes build outputs below the output directory.
//!
//! Every output path is validated before anything is written: paths are
//! normalized and must stay inside the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use path_clean::PathClean;

use crate::error::{PipelineError, Result};

/// One file to write, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: String,
    pub contents: Vec<u8>,
}

impl OutputFile {
    pub fn new(path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Write `files` below `out_dir`, creating parent directories as needed.
///
/// Paths are all validated up front, so a traversal attempt writes nothing.
pub fn write_outputs(out_dir: &Path, files: &[OutputFile]) -> Result<Vec<PathBuf>> {
    let targets = files
        .iter()
        .map(|file| validate_output_path(out_dir, &file.path))
        .collect::<Result<Vec<_>>>()?;

    for (target, file) in targets.iter().zip(files) {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| PipelineError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(target, &file.contents).map_err(|source| PipelineError::Write {
            path: target.clone(),
            source,
        })?;
        tracing::trace!("Wrote {} ({} bytes)", target.display(), file.contents.len());
    }

    Ok(targets)
}

/// Resolve `filename` below `base_dir`, rejecting anything that escapes it.
pub fn validate_output_path(base_dir: &Path, filename: &str) -> Result<PathBuf> {
    if filename.contains('\0') {
        return Err(PipelineError::InvalidOutputPath(
            "filename contains null byte".to_string(),
        ));
    }
    if filename.is_empty() {
        return Err(PipelineError::InvalidOutputPath(
            "filename is empty".to_string(),
        ));
    }

    let base_dir = base_dir.clean();
    let full_path = base_dir.join(Path::new(filename).clean()).clean();

    if full_path == base_dir || !full_path.starts_with(&base_dir) {
        return Err(PipelineError::InvalidOutputPath(format!(
            "'{}' escapes output directory '{}' (resolved to '{}')",
            filename,
            base_dir.display(),
            full_path.display()
        )));
    }

    Ok(full_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn accepts_nested_paths() {
        let base = Path::new("/out");
        assert_eq!(
            validate_output_path(base, "app/app.js").unwrap(),
            PathBuf::from("/out/app/app.js")
        );
        assert_eq!(
            validate_output_path(base, "./a/../b.css").unwrap(),
            PathBuf::from("/out/b.css")
        );
    }

    #[test]
    fn rejects_traversal() {
        let base = Path::new("/out");
        for bad in ["../etc/passwd", "a/../../x", "/etc/passwd", ".", "", "a\0b"] {
            assert!(
                matches!(
                    validate_output_path(base, bad),
                    Err(PipelineError::InvalidOutputPath(_))
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn writes_files_and_parents() {
        let dir = TempDir::new().unwrap();
        let written = write_outputs(
            dir.path(),
            &[
                OutputFile::new("app/app.js", "a();\n"),
                OutputFile::new("index.html", "<p></p>"),
            ],
        )
        .unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("app/app.js")).unwrap(),
            "a();\n"
        );
        assert!(dir.path().join("index.html").is_file());
    }

    #[test]
    fn invalid_path_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let err = write_outputs(
            dir.path(),
            &[
                OutputFile::new("ok.js", "ok"),
                OutputFile::new("../escape.js", "bad"),
            ],
        )
        .unwrap_err();

        assert!(matches!(err, PipelineError::InvalidOutputPath(_)));
        assert!(!dir.path().join("ok.js").exists());
    }
}
