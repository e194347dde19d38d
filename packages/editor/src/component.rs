//! # Component Instances
//!
//! The visual tree a canvas edits. Each instance carries its type, its own
//! style map and either text or nested instances.
//!
//! Instances bake their identity into the markup they serialize to
//! (`data-bp-id`, plus `data-bp-type` for custom kinds), so a page survives a
//! full serialize → hand edit → parse cycle with every placeholder intact.

use blueprint_markup::{to_html, Attribute, Element, Node};
use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ID_ATTR: &str = "data-bp-id";
pub const TYPE_ATTR: &str = "data-bp-type";

/// Kind of a plain element with no registered type
pub const DEFAULT_KIND: &str = "default";

/// Kind of a bare text run between elements
pub const TEXT_NODE_KIND: &str = "textnode";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Content {
    Text(String),
    Children(Vec<Component>),
}

impl Default for Content {
    fn default() -> Self {
        Content::Children(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    pub kind: String,
    pub tag: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub style: BTreeMap<String, String>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub content: Content,
}

impl Component {
    pub fn new(kind: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            kind: kind.into(),
            tag: tag.into(),
            classes: Vec::new(),
            style: BTreeMap::new(),
            attributes: Vec::new(),
            content: Content::default(),
        }
    }

    pub fn text_node(text: impl Into<String>) -> Self {
        Self {
            content: Content::Text(text.into()),
            ..Self::new(TEXT_NODE_KIND, "")
        }
    }

    pub fn children(&self) -> &[Component] {
        match &self.content {
            Content::Children(children) => children,
            Content::Text(_) => &[],
        }
    }

    /// Depth-first search for an instance by id
    pub fn find(&self, id: &str) -> Option<&Component> {
        if self.id == id {
            return Some(self);
        }
        self.children().iter().find_map(|c| c.find(id))
    }

    /// All instances of `kind` in this subtree, depth-first
    pub fn find_kind<'a>(&'a self, kind: &str, found: &mut Vec<&'a Component>) {
        if self.kind == kind {
            found.push(self);
        }
        for child in self.children() {
            child.find_kind(kind, found);
        }
    }

    /// Give this instance and any id-less descendants fresh ids
    pub fn assign_ids(&mut self, ids: &mut IdGenerator) {
        if self.kind != TEXT_NODE_KIND && self.id.is_empty() {
            self.id = ids.new_id();
        }
        if let Content::Children(children) = &mut self.content {
            for child in children {
                child.assign_ids(ids);
            }
        }
    }

    pub fn to_node(&self) -> Node {
        if self.kind == TEXT_NODE_KIND {
            let text = match &self.content {
                Content::Text(text) => text.clone(),
                Content::Children(_) => String::new(),
            };
            return Node::Text(text);
        }

        let mut el = Element::new(self.tag.clone());
        if !self.id.is_empty() {
            el.attributes.push(Attribute::new(ID_ATTR, &self.id));
        }
        if self.kind != DEFAULT_KIND {
            el.attributes.push(Attribute::new(TYPE_ATTR, &self.kind));
        }
        if !self.classes.is_empty() {
            el.attributes.push(Attribute::new("class", self.classes.join(" ")));
        }
        if !self.style.is_empty() {
            el.attributes.push(Attribute::new("style", format_style(&self.style)));
        }
        el.attributes.extend(self.attributes.iter().cloned());

        el.children = match &self.content {
            Content::Text(text) if text.is_empty() => Vec::new(),
            Content::Text(text) => vec![Node::Text(text.clone())],
            Content::Children(children) => children.iter().map(Component::to_node).collect(),
        };
        Node::Element(el)
    }

    pub fn to_html(&self) -> String {
        to_html(&[self.to_node()])
    }

    /// Build instances from parsed markup.
    ///
    /// `is_known` decides whether a `data-bp-type` value names a registered
    /// kind; unknown kinds fall back to [`DEFAULT_KIND`] and keep the attribute
    /// verbatim. Comments are dropped.
    pub fn from_nodes(
        nodes: &[Node],
        ids: &mut IdGenerator,
        is_known: &dyn Fn(&str) -> bool,
    ) -> Vec<Component> {
        let has_elements = nodes.iter().any(|n| matches!(n, Node::Element(_)));

        nodes
            .iter()
            .filter_map(|node| match node {
                Node::Element(el) => Some(Self::from_element(el, ids, is_known)),
                // Indentation between elements is not content
                Node::Text(_) if has_elements && node.is_blank_text() => None,
                Node::Text(text) => Some(Self::text_node(text.clone())),
                Node::Comment(_) => None,
            })
            .collect()
    }

    fn from_element(el: &Element, ids: &mut IdGenerator, is_known: &dyn Fn(&str) -> bool) -> Self {
        let mut component = Component::new(DEFAULT_KIND, el.tag.clone());

        for attr in &el.attributes {
            let value = attr.value.as_deref().unwrap_or("");
            match attr.name.as_str() {
                ID_ATTR => {
                    ids.observe(value);
                    component.id = value.to_string();
                }
                TYPE_ATTR if is_known(value) => component.kind = value.to_string(),
                "class" => {
                    component.classes = value.split_whitespace().map(String::from).collect();
                }
                "style" => component.style = parse_style(value),
                _ => component.attributes.push(attr.clone()),
            }
        }

        if component.id.is_empty() {
            component.id = ids.new_id();
        }

        let text_only = el.children.iter().all(|c| matches!(c, Node::Text(_)));
        component.content = if text_only {
            Content::Text(el.text_content())
        } else {
            Content::Children(Self::from_nodes(&el.children, ids, is_known))
        };
        component
    }
}

/// Advance `ids` past every `data-bp-id` in parsed markup
pub fn observe_markup_ids(nodes: &[Node], ids: &mut IdGenerator) {
    for node in nodes {
        if let Node::Element(el) = node {
            if let Some(id) = el.attr(ID_ATTR) {
                ids.observe(id);
            }
            observe_markup_ids(&el.children, ids);
        }
    }
}

/// Parse an inline `style` attribute into an ordered map
pub fn parse_style(value: &str) -> BTreeMap<String, String> {
    value
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .map(|(property, value)| (property.trim().to_ascii_lowercase(), value.trim().to_string()))
        .filter(|(property, value)| !property.is_empty() && !value.is_empty())
        .collect()
}

pub fn format_style(style: &BTreeMap<String, String>) -> String {
    style
        .iter()
        .map(|(property, value)| format!("{}: {};", property, value))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Generate a stable seed from a blueprint or container identity using CRC32
pub fn id_seed(source: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(source.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential ID generator for component instances
#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: String,
    count: u32,
}

impl IdGenerator {
    pub fn new(source: &str) -> Self {
        Self {
            seed: id_seed(source),
            count: 0,
        }
    }

    /// Generate next sequential ID
    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }

    /// Account for an id that already exists so it is never handed out again
    pub fn observe(&mut self, id: &str) {
        let Some((seed, count)) = id.rsplit_once('-') else {
            return;
        };
        if seed != self.seed {
            return;
        }
        if let Ok(count) = count.parse::<u32>() {
            self.count = self.count.max(count);
        }
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}
