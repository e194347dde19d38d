//! Structural stripping for body fragments.
//!
//! Canvas output and hand-pasted markup may carry a full document shell. A page
//! only ever stores the inside of `<body>`, so everything that belongs to the
//! document head is filtered out at the text level before parsing.

use crate::error::ParseResult;
use crate::html::{parse_fragment, pretty_html};
use regex::Regex;
use std::sync::LazyLock;

static DOCTYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<!doctype[^>]*>").expect("valid doctype pattern"));

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?html\b[^>]*>").expect("valid html pattern"));

/// Head-only elements, in the order they are removed. Whole `<head>` blocks go first.
static HEAD_ONLY: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?is)<head\b[^>]*>.*?</head\s*>",
        r"(?is)<title\b[^>]*>.*?</title\s*>",
        r"(?is)<script\b[^>]*>.*?</script\s*>",
        r"(?is)<style\b[^>]*>.*?</style\s*>",
        r"(?i)<meta\b[^>]*>",
        r"(?i)<link\b[^>]*>",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid head element pattern"))
    .collect()
});

static BODY_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<body\b[^>]*>(.*)</body\s*>").expect("valid body pattern")
});

static BODY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?body\b[^>]*>").expect("valid body tag pattern"));

/// Reduce markup to a clean body fragment.
///
/// Removes the doctype, `<html>` tags, head blocks and head-only elements, then
/// unwraps `<body>`. Applying it twice gives the same result as applying it once.
pub fn sanitize_fragment(markup: &str) -> String {
    let mut text = DOCTYPE.replace_all(markup, "").into_owned();

    for pattern in HEAD_ONLY.iter() {
        text = pattern.replace_all(&text, "").into_owned();
    }

    if let Some(inner) = BODY_BLOCK.captures(&text).and_then(|c| c.get(1)) {
        text = inner.as_str().to_string();
    }
    text = BODY_TAG.replace_all(&text, "").into_owned();
    text = HTML_TAG.replace_all(&text, "").into_owned();

    text.trim().to_string()
}

/// Sanitize, parse and pretty-print markup for the code view
pub fn format_fragment(markup: &str, indent: &str) -> ParseResult<String> {
    let clean = sanitize_fragment(markup);
    let nodes = parse_fragment(&clean)?;
    Ok(pretty_html(&nodes, indent))
}
