//! CSS steps built on lightningcss.
//!
//! `postcss` lowers and prefixes declarations for the configured browser
//! targets. `css` parses and prints the sheet, rewriting `url()` references
//! to the public URLs of emitted assets. `extract-css` marks the result for
//! the shared stylesheet.

use std::sync::LazyLock;

use kiln_config::{ConfigError, CssOptions};
use lightningcss::{
    printer::PrinterOptions,
    stylesheet::{MinifyOptions, ParserOptions, StyleSheet},
    targets::{Browsers, Targets},
};
use regex::{Captures, Regex};

use super::{Asset, Transform, TransformContext};
use crate::error::TransformError;
use crate::listing::slash_path;

static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*(?:"([^"]*)"|'([^']*)'|([^)"'\s]*))\s*\)"#).unwrap()
});

/// Parse `[css.targets]` (`chrome = "90"`, `safari = "13.1"`) into
/// lightningcss browser versions.
pub fn parse_targets(options: &CssOptions) -> Result<Option<Browsers>, ConfigError> {
    if options.targets.is_empty() {
        return Ok(None);
    }

    let mut browsers = Browsers::default();
    for (browser, version) in &options.targets {
        let invalid = |hint: String| ConfigError::InvalidValue {
            field: format!("css.targets.{browser}"),
            hint: Some(hint),
        };
        let parsed = parse_version(version)
            .ok_or_else(|| invalid(format!("'{version}' is not a browser version")))?;
        let slot = match browser.to_ascii_lowercase().as_str() {
            "android" => &mut browsers.android,
            "chrome" => &mut browsers.chrome,
            "edge" => &mut browsers.edge,
            "firefox" => &mut browsers.firefox,
            "ie" => &mut browsers.ie,
            "ios" | "ios_saf" => &mut browsers.ios_saf,
            "opera" => &mut browsers.opera,
            "safari" => &mut browsers.safari,
            "samsung" => &mut browsers.samsung,
            other => return Err(invalid(format!("unknown browser '{other}'"))),
        };
        *slot = Some(parsed);
    }
    Ok(Some(browsers))
}

/// `major[.minor[.patch]]` packed the way lightningcss expects.
fn parse_version(version: &str) -> Option<u32> {
    let mut parts = version.trim().split('.');
    let major: u32 = parts.next()?.parse().ok()?;
    let minor: u32 = parts.next().map(str::parse).transpose().ok()?.unwrap_or(0);
    let patch: u32 = parts.next().map(str::parse).transpose().ok()?.unwrap_or(0);
    if parts.next().is_some() || major > 0xff || minor > 0xff || patch > 0xff {
        return None;
    }
    Some((major << 16) | (minor << 8) | patch)
}

fn targets(ctx: &TransformContext<'_>) -> Targets {
    ctx.css_targets().map(Targets::from).unwrap_or_default()
}

/// lightningcss pass over a stylesheet.
pub struct CssTransform {
    name: &'static str,
    prefix: bool,
}

impl CssTransform {
    /// Parse, print and rewrite `url()` references (`css`).
    pub fn print() -> Self {
        Self {
            name: "css",
            prefix: false,
        }
    }

    /// Lower and prefix for the browser targets (`postcss`).
    pub fn prefix() -> Self {
        Self {
            name: "postcss",
            prefix: true,
        }
    }
}

impl Transform for CssTransform {
    fn name(&self) -> &str {
        self.name
    }

    fn apply(&self, asset: &mut Asset, ctx: &TransformContext<'_>) -> Result<(), TransformError> {
        let filename = slash_path(&asset.source);
        let code = {
            let mut sheet = StyleSheet::parse(
                &asset.content,
                ParserOptions {
                    filename: filename.clone(),
                    ..Default::default()
                },
            )
            .map_err(|e| TransformError::Parse(format!("{filename}: {e}")))?;

            if self.prefix {
                sheet
                    .minify(MinifyOptions {
                        targets: targets(ctx),
                        ..Default::default()
                    })
                    .map_err(|e| TransformError::Parse(format!("{filename}: {e}")))?;
            }

            sheet
                .to_css(PrinterOptions {
                    targets: targets(ctx),
                    ..Default::default()
                })
                .map_err(|e| TransformError::Parse(format!("{filename}: {e}")))?
                .code
        };

        asset.content = if self.prefix {
            code
        } else {
            rewrite_urls(&code, asset, ctx)
        };
        Ok(())
    }
}

fn rewrite_urls(code: &str, asset: &Asset, ctx: &TransformContext<'_>) -> String {
    CSS_URL
        .replace_all(code, |caps: &Captures<'_>| {
            let reference = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or("");
            match ctx.rewrite_url(&asset.source, reference) {
                Some(url) => format!("url(\"{url}\")"),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Marks a stylesheet for extraction into the shared bundle.
pub struct ExtractCss;

impl Transform for ExtractCss {
    fn name(&self) -> &str {
        "extract-css"
    }

    fn apply(&self, asset: &mut Asset, _ctx: &TransformContext<'_>) -> Result<(), TransformError> {
        let trimmed = asset.content.trim_end().len();
        asset.content.truncate(trimmed);
        asset.content.push('\n');
        asset.extracted = true;
        Ok(())
    }

    fn preserves_lines(&self) -> bool {
        true
    }
}
