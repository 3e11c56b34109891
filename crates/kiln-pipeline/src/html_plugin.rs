//! Injects the build's outputs into the HTML template.
//!
//! `<base>` and the favicon link go right after `<head>`, the stylesheet and
//! head scripts right before `</head>`, every other script right before
//! `</body>`. A missing tag falls back to the start (head metadata) or the
//! end (links and scripts) of the document.

use std::sync::LazyLock;

use regex::Regex;

static HEAD_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<head(\s[^>]*)?>").unwrap());
static HEAD_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</head\s*>").unwrap());
static BODY_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</body\s*>").unwrap());

/// Public URLs to inject, in injection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlInjection {
    pub base: Option<String>,
    pub favicon: Option<String>,
    pub stylesheet: Option<String>,
    pub head_scripts: Vec<String>,
    pub body_scripts: Vec<String>,
}

pub fn render(template: &str, injection: &HtmlInjection) -> String {
    let mut html = template.to_string();

    let body_tags = script_tags(&injection.body_scripts);
    if !body_tags.is_empty() {
        insert_before(&mut html, &BODY_CLOSE, &body_tags);
    }

    let mut head_tail = String::new();
    if let Some(href) = &injection.stylesheet {
        head_tail.push_str(&format!("<link href=\"{}\" rel=\"stylesheet\">", escape_attr(href)));
    }
    head_tail.push_str(&script_tags(&injection.head_scripts));
    if !head_tail.is_empty() {
        insert_before(&mut html, &HEAD_CLOSE, &head_tail);
    }

    let mut head_start = String::new();
    if let Some(href) = &injection.base {
        head_start.push_str(&format!("<base href=\"{}\">", escape_attr(href)));
    }
    if let Some(href) = &injection.favicon {
        head_start.push_str(&format!("<link rel=\"icon\" href=\"{}\">", escape_attr(href)));
    }
    if !head_start.is_empty() {
        match HEAD_OPEN.find(&html) {
            Some(open) => html.insert_str(open.end(), &head_start),
            None => html.insert_str(0, &head_start),
        }
    }

    html
}

fn script_tags(scripts: &[String]) -> String {
    scripts
        .iter()
        .map(|src| format!("<script src=\"{}\"></script>", escape_attr(src)))
        .collect()
}

/// Escape a value for a double-quoted attribute.
fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn insert_before(html: &mut String, tag: &Regex, content: &str) {
    match tag.find(html) {
        Some(found) => html.insert_str(found.start(), content),
        None => {
            if !html.is_empty() && !html.ends_with('\n') {
                html.push('\n');
            }
            html.push_str(content);
            html.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "<!DOCTYPE html>\n<html>\n<head>\n<title>Site</title>\n</head>\n<body>\n<main></main>\n</body>\n</html>\n";

    fn injection() -> HtmlInjection {
        HtmlInjection {
            base: Some("/".to_string()),
            favicon: Some("/fav.png".to_string()),
            stylesheet: Some("/style/index.css".to_string()),
            head_scripts: vec!["/app/app_head.js".to_string()],
            body_scripts: vec!["/app/app.js".to_string()],
        }
    }

    #[test]
    fn injects_everything_in_place() {
        let html = render(TEMPLATE, &injection());
        assert_eq!(
            html,
            "<!DOCTYPE html>\n<html>\n<head><base href=\"/\"><link rel=\"icon\" href=\"/fav.png\">\n<title>Site</title>\n\
             <link href=\"/style/index.css\" rel=\"stylesheet\"><script src=\"/app/app_head.js\"></script></head>\n\
             <body>\n<main></main>\n<script src=\"/app/app.js\"></script></body>\n</html>\n"
        );
    }

    #[test]
    fn head_scripts_precede_body_scripts() {
        let html = render(TEMPLATE, &injection());
        let head = html.find("app_head.js").unwrap();
        let body = html.find("/app/app.js").unwrap();
        assert!(head < body);
    }

    #[test]
    fn missing_tags_fall_back_to_document_edges() {
        let html = render(
            "<p>hi</p>",
            &HtmlInjection {
                base: Some("/".to_string()),
                body_scripts: vec!["/app/app.js".to_string()],
                ..Default::default()
            },
        );
        assert_eq!(
            html,
            "<base href=\"/\"><p>hi</p>\n<script src=\"/app/app.js\"></script>\n"
        );
    }

    #[test]
    fn empty_injection_leaves_template_alone() {
        assert_eq!(render(TEMPLATE, &HtmlInjection::default()), TEMPLATE);
    }

    #[test]
    fn head_with_attributes_is_found() {
        let html = render(
            "<head lang=\"en\"></head>",
            &HtmlInjection {
                base: Some("/".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(html, "<head lang=\"en\"><base href=\"/\"></head>");
    }

    #[test]
    fn injected_urls_are_attribute_escaped() {
        let html = render(
            "<head></head>",
            &HtmlInjection {
                base: Some("/a\"b/".to_string()),
                favicon: Some("/fav.png?x=1&y=<2>".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(
            html,
            "<head><base href=\"/a&quot;b/\"><link rel=\"icon\" href=\"/fav.png?x=1&amp;y=&lt;2>\"></head>"
        );
    }
}
