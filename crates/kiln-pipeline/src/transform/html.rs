//! Rewrites asset references in markup (`img[src]`, `source[srcset]`, ...)
//! to the public URLs of the files this build emits.

use std::sync::LazyLock;

use kiln_config::{HtmlSource, SourceKind};
use regex::{Captures, Regex, RegexBuilder};

use super::{Asset, Transform, TransformContext};
use crate::error::TransformError;

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([A-Za-z][A-Za-z0-9-]*)(\s[^>]*?)?(/?)>").unwrap());

pub struct HtmlTransform;

impl Transform for HtmlTransform {
    fn name(&self) -> &str {
        "html"
    }

    fn apply(&self, asset: &mut Asset, ctx: &TransformContext<'_>) -> Result<(), TransformError> {
        let sources = ctx.html_sources();
        if sources.is_empty() {
            return Ok(());
        }

        let rewritten = TAG.replace_all(&asset.content, |caps: &Captures<'_>| {
            let tag = &caps[1];
            let Some(attrs) = caps.get(2) else {
                return caps[0].to_string();
            };
            let mut attrs = attrs.as_str().to_string();
            for source in sources.iter().filter(|s| s.tag.eq_ignore_ascii_case(tag)) {
                attrs = rewrite_attribute(&attrs, source, asset, ctx);
            }
            format!("<{tag}{attrs}{}>", &caps[3])
        });

        asset.content = rewritten.into_owned();
        Ok(())
    }

    fn preserves_lines(&self) -> bool {
        true
    }
}

fn rewrite_attribute(
    attrs: &str,
    source: &HtmlSource,
    asset: &Asset,
    ctx: &TransformContext<'_>,
) -> String {
    let pattern = format!(
        r#"(\s)({})(\s*=\s*)(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#,
        regex::escape(&source.attribute)
    );
    let Ok(attribute) = RegexBuilder::new(&pattern).case_insensitive(true).build() else {
        return attrs.to_string();
    };

    attribute
        .replace_all(attrs, |caps: &Captures<'_>| {
            let (value, quote) = match (caps.get(4), caps.get(5), caps.get(6)) {
                (Some(v), _, _) => (v.as_str(), "\""),
                (None, Some(v), _) => (v.as_str(), "'"),
                (None, None, Some(v)) => (v.as_str(), ""),
                (None, None, None) => return caps[0].to_string(),
            };
            let rewritten = match source.kind {
                SourceKind::Src => ctx
                    .rewrite_url(&asset.source, value)
                    .unwrap_or_else(|| value.to_string()),
                SourceKind::Srcset => rewrite_srcset(value, asset, ctx),
            };
            format!("{}{}{}{quote}{rewritten}{quote}", &caps[1], &caps[2], &caps[3])
        })
        .into_owned()
}

/// `a.png 1x, b.png 2x` → each candidate URL rewritten, descriptors kept.
fn rewrite_srcset(value: &str, asset: &Asset, ctx: &TransformContext<'_>) -> String {
    srcset_candidates(value)
        .into_iter()
        .map(|(url, descriptor)| {
            let url = ctx
                .rewrite_url(&asset.source, url)
                .unwrap_or_else(|| url.to_string());
            if descriptor.is_empty() {
                url
            } else {
                format!("{url} {descriptor}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Split a srcset into `(url, descriptor)` pairs.
///
/// A URL runs to the next whitespace, so commas inside it (`data:` URLs)
/// stay put. Trailing commas on the URL end the candidate; otherwise the
/// descriptor runs to the next comma.
fn srcset_candidates(value: &str) -> Vec<(&str, &str)> {
    let mut candidates = Vec::new();
    let mut rest = value;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            return candidates;
        }
        let url_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let url = &rest[..url_end];
        rest = &rest[url_end..];

        let bare = url.trim_end_matches(',');
        if bare.len() != url.len() {
            candidates.push((bare, ""));
            continue;
        }
        let descriptor_end = rest.find(',').unwrap_or(rest.len());
        candidates.push((url, rest[..descriptor_end].trim()));
        rest = &rest[descriptor_end..];
    }
}
