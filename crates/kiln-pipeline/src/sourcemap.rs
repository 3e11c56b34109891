//! Source maps for entry bundles.
//!
//! Bundles whose chain only contained line-preserving steps get an identity
//! line mapping. Others get a map with the original source embedded and no
//! mappings, which is still enough for devtools to show the source file.

use kiln_config::SourceMapMode;
use oxc_sourcemap::{SourceMap, SourceMapBuilder};

/// A bundle with its source map attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedBundle {
    pub code: String,
    /// Contents of the external `.map` file, if the mode asks for one
    pub map: Option<String>,
}

/// Build the map for one bundle.
pub fn build_map(
    file: &str,
    source: &str,
    original: &str,
    code: &str,
    preserves_lines: bool,
) -> SourceMap {
    let mut builder = SourceMapBuilder::default();
    builder.set_file(file);
    let source_id = builder.add_source_and_content(&format!("kiln:///{source}"), original);
    if preserves_lines {
        for line in 0..code.lines().count() as u32 {
            builder.add_token(line, 0, line, 0, Some(source_id), None);
        }
    }
    builder.into_sourcemap()
}

/// Attach `map` to `code` the way `mode` asks for.
///
/// `file` is the bundle's output path; the external map lives next to it.
pub fn attach(mut code: String, file: &str, map: &SourceMap, mode: SourceMapMode) -> MappedBundle {
    if !code.ends_with('\n') {
        code.push('\n');
    }
    match mode {
        SourceMapMode::Inline => {
            code.push_str("//# sourceMappingURL=");
            code.push_str(&map.to_data_url());
            code.push('\n');
            MappedBundle { code, map: None }
        }
        SourceMapMode::External => {
            let name = file.rsplit('/').next().unwrap_or(file);
            code.push_str(&format!("//# sourceMappingURL={name}.map\n"));
            MappedBundle {
                code,
                map: Some(map.to_json_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn json(map: &SourceMap) -> Value {
        serde_json::from_str(&map.to_json_string()).unwrap()
    }

    #[test]
    fn map_embeds_original_source() {
        let map = build_map("app/app.js", "src/app/index.js", "a();\nb();\n", "a();\nb();\n", true);
        let value = json(&map);
        assert_eq!(value["version"], 3);
        assert_eq!(value["file"], "app/app.js");
        assert_eq!(value["sources"][0], "kiln:///src/app/index.js");
        assert_eq!(value["sourcesContent"][0], "a();\nb();\n");
    }

    #[test]
    fn line_preserving_chains_map_every_line_to_itself() {
        let map = build_map("app/app.js", "src/app/index.js", "a();\nb();\nc();\n", "a();\nb();\nc();\n", true);
        let lines: Vec<_> = map
            .get_tokens()
            .map(|token| (token.get_dst_line(), token.get_src_line()))
            .collect();
        assert_eq!(lines, vec![(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn rewritten_chains_have_no_mappings() {
        let map = build_map("app/app.js", "src/app/index.ts", "let a: number;", "let a;\n", false);
        assert_eq!(map.get_tokens().count(), 0);
        assert_eq!(json(&map)["mappings"], "");
    }

    #[test]
    fn inline_mode_embeds_a_data_url() {
        let map = build_map("app/app.js", "src/app/index.js", "a();\n", "a();\n", true);
        let bundle = attach("a();\n".to_string(), "app/app.js", &map, SourceMapMode::Inline);
        assert!(bundle.map.is_none());
        assert!(bundle
            .code
            .starts_with("a();\n//# sourceMappingURL=data:application/json;charset=utf-8;base64,"));
        assert!(bundle.code.ends_with('\n'));
    }

    #[test]
    fn external_mode_references_sibling_file() {
        let map = build_map("app/app.js", "src/app/index.js", "a();", "a();", true);
        let bundle = attach("a();".to_string(), "app/app.js", &map, SourceMapMode::External);
        assert_eq!(bundle.code, "a();\n//# sourceMappingURL=app.js.map\n");
        let value: Value = serde_json::from_str(bundle.map.as_deref().unwrap()).unwrap();
        assert_eq!(value["sources"][0], "kiln:///src/app/index.js");
    }
}
