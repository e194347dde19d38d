//! Self-contained render documents for server-side generation.

use crate::css::strip_noise_rules;
use crate::fragment::sanitize_fragment;
use regex::Regex;
use std::sync::LazyLock;

static STYLE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<style\b[^>]*>(.*?)</style\s*>").expect("valid style pattern")
});

/// Wrap one page's markup and stylesheet into a standalone HTML document.
///
/// The stylesheet goes through [`strip_noise_rules`], the same filter the code
/// view uses, so both surfaces always agree on what a page's styling is.
pub fn render_document(html: &str, css: &str) -> String {
    format!(
        "<html><head><style>{}</style></head><body>{}</body></html>",
        strip_noise_rules(css),
        html
    )
}

/// Recover a page's body fragment and stylesheet from a render document
pub fn split_render_document(document: &str) -> (String, String) {
    let css = STYLE_BLOCK
        .captures_iter(document)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|css| !css.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    (sanitize_fragment(document), css)
}
