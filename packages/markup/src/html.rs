//! # HTML Fragments
//!
//! The body-only markup a canvas produces, tokenized by html5ever and
//! assembled into a tree without the HTML5 tree builder's error recovery.
//! Unbalanced tags and tokenizer errors fail the parse instead of being
//! repaired, so hand-edited markup either loads exactly as written or not at
//! all.
//!
//! Character references are decoded on the way in and the serializers escape
//! them again on the way out.

use crate::error::{ParseError, ParseResult};
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

/// Elements that never have children or a closing tag
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose content is raw text up to the matching close tag
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Text-only elements that still decode character references
const ESCAPABLE_RAW_TEXT_ELEMENTS: &[&str] = &["textarea", "title"];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    /// `None` for boolean attributes such as `disabled`
    pub value: Option<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Look up an attribute value; boolean attributes yield `Some("")`
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_deref().unwrap_or(""))
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => collect_text(&el.children, out),
            Node::Comment(_) => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

impl Node {
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Node::Text(t) if t.trim().is_empty())
    }
}

/// Parse a body fragment into a node list
pub fn parse_fragment(source: &str) -> ParseResult<Vec<Node>> {
    if source.is_empty() {
        return Ok(Vec::new());
    }

    let input = BufferQueue::default();
    input.push_back(StrTendril::from(source));

    let opts = TokenizerOpts {
        exact_errors: true,
        ..TokenizerOpts::default()
    };
    let tokenizer = Tokenizer::new(FragmentSink::default(), opts);
    let _ = tokenizer.feed(&input);
    tokenizer.end();
    tokenizer.sink.finish()
}

/// Builds the node tree from tokens, keeping the first error it sees
#[derive(Default)]
struct FragmentSink {
    tree: RefCell<TreeState>,
}

#[derive(Default)]
struct TreeState {
    roots: Vec<Node>,
    /// Open elements with the line they were opened on
    open: Vec<(Element, u64)>,
    error: Option<ParseError>,
}

impl TreeState {
    fn children(&mut self) -> &mut Vec<Node> {
        match self.open.last_mut() {
            Some((element, _)) => &mut element.children,
            None => &mut self.roots,
        }
    }

    /// The tokenizer hands text over in chunks; adjacent chunks are one node
    fn push_text(&mut self, text: &str) {
        let children = self.children();
        match children.last_mut() {
            Some(Node::Text(last)) => last.push_str(text),
            _ => children.push(Node::Text(text.to_string())),
        }
    }

    fn start_tag(&mut self, tag: Tag, line: u64) -> TokenSinkResult<()> {
        let mut element = Element::new(tag.name.to_string());
        element.attributes = tag
            .attrs
            .iter()
            .map(|attr| {
                let value = attr.value.to_string();
                Attribute {
                    name: attr.name.local.to_string(),
                    value: (!value.is_empty()).then_some(value),
                }
            })
            .collect();

        if is_void(&element.tag) || tag.self_closing {
            self.children().push(Node::Element(element));
            return TokenSinkResult::Continue;
        }

        let raw = if is_raw_text(&element.tag) {
            Some(RawKind::Rawtext)
        } else if ESCAPABLE_RAW_TEXT_ELEMENTS.contains(&element.tag.as_str()) {
            Some(RawKind::Rcdata)
        } else {
            None
        };
        self.open.push((element, line));

        match raw {
            Some(kind) => TokenSinkResult::RawData(kind),
            None => TokenSinkResult::Continue,
        }
    }

    fn end_tag(&mut self, tag: Tag, line: u64) {
        let name = tag.name.to_string();
        match self.open.pop() {
            Some((element, _)) if element.tag == name => {
                self.children().push(Node::Element(element));
            }
            Some((element, _)) => {
                self.error = Some(ParseError::mismatched(line, element.tag, name));
            }
            None => self.error = Some(ParseError::stray(line, name)),
        }
    }
}

impl TokenSink for FragmentSink {
    type Handle = ();

    fn process_token(&self, token: Token, line_number: u64) -> TokenSinkResult<()> {
        let mut tree = self.tree.borrow_mut();
        if tree.error.is_some() {
            return TokenSinkResult::Continue;
        }

        match token {
            Token::TagToken(tag) => match tag.kind {
                TagKind::StartTag => return tree.start_tag(tag, line_number),
                TagKind::EndTag => tree.end_tag(tag, line_number),
            },
            Token::CharacterTokens(text) => tree.push_text(&text),
            Token::CommentToken(body) => tree.children().push(Node::Comment(body.to_string())),
            Token::ParseError(message) => {
                tree.error = Some(ParseError::invalid_syntax(line_number, message));
            }
            // Doctypes carry no content; a NUL always arrives with its own error
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

impl FragmentSink {
    fn finish(&self) -> ParseResult<Vec<Node>> {
        let mut tree = self.tree.take();
        if let Some(err) = tree.error {
            return Err(err);
        }
        if let Some((element, line)) = tree.open.pop() {
            return Err(ParseError::unclosed(line, element.tag));
        }
        Ok(tree.roots)
    }
}

/// Compact serializer with no added whitespace
pub fn to_html(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(node, false, &mut out);
    }
    out
}

fn write_node(node: &Node, raw_text: bool, out: &mut String) {
    match node {
        Node::Text(text) if raw_text => out.push_str(text),
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::Comment(body) => {
            out.push_str("<!--");
            out.push_str(body);
            out.push_str("-->");
        }
        Node::Element(el) => {
            out.push_str(&open_tag(el));
            if is_void(&el.tag) {
                return;
            }
            let raw = is_raw_text(&el.tag);
            for child in &el.children {
                write_node(child, raw, out);
            }
            out.push_str("</");
            out.push_str(&el.tag);
            out.push('>');
        }
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\u{a0}', "&nbsp;")
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('\u{a0}', "&nbsp;")
}

fn open_tag(el: &Element) -> String {
    let mut tag = format!("<{}", el.tag);
    for attr in &el.attributes {
        tag.push(' ');
        tag.push_str(&attr.name);
        if let Some(value) = &attr.value {
            tag.push_str("=\"");
            tag.push_str(&escape_attribute(value));
            tag.push('"');
        }
    }
    tag.push('>');
    tag
}

/// Pretty-print nodes one block element per line, indented by depth.
///
/// Whitespace is only added where it cannot change what renders: between
/// children of elements that hold nothing but elements. Anything holding
/// text keeps its exact compact form on a single line.
pub fn pretty_html(nodes: &[Node], indent: &str) -> String {
    let mut lines = Vec::new();
    write_pretty(nodes, indent, 0, &mut lines);
    lines.join("\n")
}

fn has_inline_text(nodes: &[Node]) -> bool {
    nodes
        .iter()
        .any(|node| matches!(node, Node::Text(_)) && !node.is_blank_text())
}

fn is_block(el: &Element) -> bool {
    !is_void(&el.tag)
        && !is_raw_text(&el.tag)
        && el.children.iter().any(|c| matches!(c, Node::Element(_)))
        && !has_inline_text(&el.children)
}

fn write_pretty(nodes: &[Node], indent: &str, depth: usize, lines: &mut Vec<String>) {
    let pad = indent.repeat(depth);

    if has_inline_text(nodes) {
        lines.push(format!("{}{}", pad, to_html(nodes)));
        return;
    }

    for node in nodes {
        match node {
            Node::Text(_) => {}
            Node::Comment(body) => lines.push(format!("{}<!--{}-->", pad, body)),
            Node::Element(el) if is_block(el) => {
                lines.push(format!("{}{}", pad, open_tag(el)));
                write_pretty(&el.children, indent, depth + 1, lines);
                lines.push(format!("{}</{}>", pad, el.tag));
            }
            Node::Element(_) => {
                lines.push(format!("{}{}", pad, to_html(std::slice::from_ref(node))));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_element(source: &str) -> Element {
        match parse_fragment(source).unwrap().remove(0) {
            Node::Element(el) => el,
            other => panic!("Expected element, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_nested_elements() {
        let nodes = parse_fragment(r#"<div class="a"><span>hi</span></div>"#).unwrap();
        assert_eq!(nodes.len(), 1);

        let Node::Element(div) = &nodes[0] else {
            panic!("Expected element");
        };
        assert_eq!(div.tag, "div");
        assert_eq!(div.attr("class"), Some("a"));
        assert_eq!(div.text_content(), "hi");
    }

    #[test]
    fn test_parse_attribute_forms() {
        let input = first_element(r#"<input type=text disabled value='x y'>"#);
        assert_eq!(input.attr("type"), Some("text"));
        assert_eq!(input.attr("disabled"), Some(""));
        assert_eq!(input.attributes[1], Attribute::flag("disabled"));
        assert_eq!(input.attr("value"), Some("x y"));
        assert!(input.children.is_empty());
    }

    #[test]
    fn test_void_and_self_closing() {
        let p = first_element("<p>a<br>b<img src=\"x.png\"/><span/></p>");
        assert_eq!(p.children.len(), 5);
        assert_eq!(to_html(&[Node::Element(p)]), "<p>a<br>b<img src=\"x.png\"><span></span></p>");
    }

    #[test]
    fn test_adjacent_text_is_one_node() {
        let p = first_element("<p>Tom &amp; Jerry &lt;3</p>");
        assert_eq!(p.children, vec![Node::Text("Tom & Jerry <3".to_string())]);
    }

    #[test]
    fn test_entities_round_trip() {
        let source = r#"<p title="&quot;a&quot; &amp; b">1 &lt; 2 &amp;&amp; 3 &gt; 2</p>"#;
        let nodes = parse_fragment(source).unwrap();
        assert_eq!(to_html(&nodes), source);
    }

    #[test]
    fn test_lone_angle_bracket_is_error() {
        let err = parse_fragment("<p>1 < 2</p>").unwrap_err();
        assert!(matches!(err, ParseError::InvalidSyntax { line: 1, .. }));
    }

    #[test]
    fn test_uppercase_tags_are_normalized() {
        let nodes = parse_fragment("<DIV Class=\"x\">x</div>").unwrap();
        assert_eq!(to_html(&nodes), "<div class=\"x\">x</div>");
    }

    #[test]
    fn test_raw_text_element() {
        let script = first_element("<script>if (a < b && c) {}</script>");
        assert_eq!(script.text_content(), "if (a < b && c) {}");
        assert_eq!(
            to_html(&[Node::Element(script)]),
            "<script>if (a < b && c) {}</script>"
        );
    }

    #[test]
    fn test_comments_and_doctype() {
        let nodes = parse_fragment("<!DOCTYPE html><!-- note --><p>x</p>").unwrap();
        assert_eq!(nodes[0], Node::Comment(" note ".to_string()));
        assert_eq!(to_html(&nodes), "<!-- note --><p>x</p>");
    }

    #[test]
    fn test_unclosed_element_is_error() {
        let err = parse_fragment("<div>\n<span>x</span>").unwrap_err();
        assert_eq!(err, ParseError::unclosed(1, "div"));
    }

    #[test]
    fn test_mismatched_close_is_error() {
        let err = parse_fragment("<div>\n  <p>x</span>\n</div>").unwrap_err();
        assert_eq!(err, ParseError::mismatched(2, "p", "span"));
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn test_stray_close_is_error() {
        let err = parse_fragment("x</div>").unwrap_err();
        assert_eq!(err, ParseError::stray(1, "div"));
    }

    #[test]
    fn test_unterminated_markup_is_error() {
        for source in [r#"<div class="oops>x</div>"#, "<p>a</p><!-- open", "<div"] {
            let err = parse_fragment(source).unwrap_err();
            assert!(
                matches!(err, ParseError::InvalidSyntax { .. }),
                "{} gave {:?}",
                source,
                err
            );
        }
    }

    #[test]
    fn test_serializer_escapes_quotes() {
        let mut el = Element::new("div");
        el.attributes.push(Attribute::new("title", "say \"hi\""));
        let html = to_html(&[Node::Element(el)]);
        assert_eq!(html, r#"<div title="say &quot;hi&quot;"></div>"#);
    }

    #[test]
    fn test_pretty_html_indents_blocks() {
        let nodes = parse_fragment("<section><h1>Title</h1><p>Body</p><hr></section>").unwrap();
        let pretty = pretty_html(&nodes, "  ");
        assert_eq!(
            pretty,
            "<section>\n  <h1>Title</h1>\n  <p>Body</p>\n  <hr>\n</section>"
        );
    }

    #[test]
    fn test_pretty_html_keeps_text_exact() {
        let nodes = parse_fragment("<div> hello </div>").unwrap();
        assert_eq!(pretty_html(&nodes, "  "), "<div> hello </div>");
    }

    #[test]
    fn test_pretty_html_keeps_mixed_content_on_one_line() {
        let source = "<section><p>Total:<b>$5</b> due</p><ul><li>a</li></ul></section>";
        let pretty = pretty_html(&parse_fragment(source).unwrap(), "  ");
        assert_eq!(
            pretty,
            "<section>\n  <p>Total:<b>$5</b> due</p>\n  <ul>\n    <li>a</li>\n  </ul>\n</section>"
        );

        // Re-parsing the pretty form changes nothing but inter-block whitespace
        let reparsed = parse_fragment(&pretty).unwrap();
        let Node::Element(section) = &reparsed[0] else {
            panic!("Expected element");
        };
        let Node::Element(p) = &section.children[1] else {
            panic!("Expected element");
        };
        assert_eq!(to_html(std::slice::from_ref(&section.children[1])), "<p>Total:<b>$5</b> due</p>");
        assert_eq!(p.text_content(), "Total:$5 due");
    }

    #[test]
    fn test_pretty_html_drops_blank_text() {
        let nodes = parse_fragment("<ul>\n   <li>a</li>\n   <li>b</li>\n</ul>").unwrap();
        assert_eq!(pretty_html(&nodes, "\t"), "<ul>\n\t<li>a</li>\n\t<li>b</li>\n</ul>");
    }
}
