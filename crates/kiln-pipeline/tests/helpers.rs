//! Shared fixtures for kiln-pipeline integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use kiln_pipeline::{Asset, Transform, TransformContext, TransformError};
use tempfile::TempDir;
use walkdir::WalkDir;

pub const INDEX_HTML: &str = "<!DOCTYPE html>\n<html>\n<head>\n<title>Site</title>\n</head>\n<body>\n<img src=\"img/logo.png\">\n</body>\n</html>\n";

/// Create a project directory with `files` (path, contents).
pub fn project(files: &[(&str, &[u8])]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (path, contents) in files {
        write(dir.path(), path, contents);
    }
    dir
}

pub fn write(root: &Path, rel: &str, contents: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// The layout the default configuration expects.
pub fn stock_project() -> TempDir {
    project(&[
        ("src/app/index.js", b"document.title = 'kiln';\n"),
        ("src/index.html", INDEX_HTML.as_bytes()),
        ("src/img/logo.png", b"\x89PNG\r\n\x1a\n"),
        ("src/fonts/body.woff2", b"wOF2"),
    ])
}

/// Every file below `dir` with its bytes, keyed by slash path.
pub fn snapshot(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let rel = entry.path().strip_prefix(dir).unwrap();
            let key = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            (key, fs::read(entry.path()).unwrap())
        })
        .collect()
}

pub type Calls = Arc<Mutex<Vec<(String, String)>>>;

/// Appends `[name]` to the content and records (file, step) for each call.
pub struct Recording {
    pub name: &'static str,
    pub calls: Calls,
}

impl Transform for Recording {
    fn name(&self) -> &str {
        self.name
    }

    fn apply(&self, asset: &mut Asset, _ctx: &TransformContext<'_>) -> Result<(), TransformError> {
        asset.content.push_str(&format!("[{}]", self.name));
        self.calls.lock().unwrap().push((
            asset.source.to_string_lossy().replace('\\', "/"),
            self.name.to_string(),
        ));
        Ok(())
    }
}

/// Fails on every file whose path contains `needle`, passes others through.
pub struct FailOn {
    pub name: &'static str,
    pub needle: &'static str,
}

impl Transform for FailOn {
    fn name(&self) -> &str {
        self.name
    }

    fn apply(&self, asset: &mut Asset, _ctx: &TransformContext<'_>) -> Result<(), TransformError> {
        if asset.source.to_string_lossy().contains(self.needle) {
            return Err(TransformError::Parse("unexpected token".to_string()));
        }
        Ok(())
    }
}
