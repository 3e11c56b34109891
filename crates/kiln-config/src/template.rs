//! Output filename templates (`app/[name].js`, `[path][name].[ext]`).

use std::path::Path;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Name,
    Ext,
    Path,
}

/// A parsed filename template.
///
/// Placeholders: `[name]` (entry name or file stem), `[ext]` (extension
/// without the dot) and `[path]` (project-relative directory with a trailing
/// slash, empty at the root).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameTemplate {
    source: String,
    segments: Vec<Segment>,
}

/// Values substituted into a template.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TemplateVars {
    pub name: String,
    pub ext: String,
    pub path: String,
}

impl TemplateVars {
    /// Variables for a project-relative source file.
    pub fn from_path(rel: &Path) -> Self {
        let name = rel
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = rel
            .extension()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir: Vec<String> = rel
            .parent()
            .map(|p| {
                p.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        let path = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir.join("/"))
        };
        Self { name, ext, path }
    }

    /// Variables for an entry bundle.
    pub fn for_entry(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ext: "js".to_string(),
            path: String::new(),
        }
    }
}

impl FilenameTemplate {
    pub fn parse(source: &str) -> Result<Self> {
        let invalid = |message: &str| ConfigError::InvalidTemplate {
            template: source.to_string(),
            message: message.to_string(),
        };

        if source.trim().is_empty() {
            return Err(invalid("template is empty"));
        }
        if source.starts_with('/') || source.starts_with('\\') {
            return Err(invalid("template must be relative to the output directory"));
        }
        if source.split(['/', '\\']).any(|part| part == "..") {
            return Err(invalid("template must not leave the output directory"));
        }

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(open) = rest.find('[') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after
                .find(']')
                .ok_or_else(|| invalid("unterminated '[' placeholder"))?;
            let segment = match &after[..close] {
                "name" => Segment::Name,
                "ext" => Segment::Ext,
                "path" => Segment::Path,
                other => return Err(invalid(&format!("unknown placeholder [{other}]"))),
            };
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(segment);
            rest = &after[close + 1..];
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether distinct names render to distinct outputs.
    pub fn uses_name(&self) -> bool {
        self.segments.contains(&Segment::Name)
    }

    pub fn render(&self, vars: &TemplateVars) -> String {
        let mut out = String::with_capacity(self.source.len() + 16);
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Name => out.push_str(&vars.name),
                Segment::Ext => out.push_str(&vars.ext),
                Segment::Path => out.push_str(&vars.path),
            }
        }
        out
    }
}
