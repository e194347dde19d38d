//! # Component Type Registry
//!
//! The closed vocabulary of insertable blueprint elements. Every custom type
//! ships a default style that keeps its instances visible (dashed border,
//! tinted background, centered content) even when nothing else styles them.
//!
//! Installing into an engine is idempotent: types and palette blocks are
//! checked by name first, so remounting never duplicates palette entries.

use crate::component::{Component, Content};
use crate::engine::CanvasEngine;
use crate::errors::{EditorError, EditorResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Template token the document renderer replaces with the signing date
pub const SIGNING_DATE_TOKEN: &str = "{{signing_date}}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraitKind {
    Text,
}

/// An inline-editable property exposed by a component type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitDef {
    pub name: String,
    pub label: String,
    pub kind: TraitKind,
}

impl TraitDef {
    pub fn label_trait() -> Self {
        Self {
            name: "label".to_string(),
            label: "Label".to_string(),
            kind: TraitKind::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentTypeDef {
    pub name: String,
    /// Palette label
    pub label: String,
    pub tag: String,
    pub classes: Vec<String>,
    pub style: BTreeMap<String, String>,
    pub content: String,
    pub traits: Vec<TraitDef>,
}

impl ComponentTypeDef {
    /// A placeholder type with the shared identifiable look
    pub fn placeholder(name: &str, label: &str, tag: &str, content: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            tag: tag.to_string(),
            classes: vec![format!("bp-{}", name)],
            style: placeholder_style(),
            content: content.to_string(),
            traits: vec![TraitDef::label_trait()],
        }
    }
}

fn placeholder_style() -> BTreeMap<String, String> {
    [
        ("align-items", "center"),
        ("background-color", "#f5f7fa"),
        ("border", "1px dashed #9aa5b1"),
        ("display", "inline-flex"),
        ("justify-content", "center"),
        ("min-height", "32px"),
        ("min-width", "120px"),
        ("padding", "4px 8px"),
    ]
    .iter()
    .map(|(property, value)| (property.to_string(), value.to_string()))
    .collect()
}

/// The domain's component types
pub fn builtin_types() -> Vec<ComponentTypeDef> {
    let mut text_block = ComponentTypeDef::placeholder("text-block", "Text block", "div", "Text");
    text_block.style.insert("display".to_string(), "block".to_string());
    text_block.style.insert("border".to_string(), "1px dotted #9aa5b1".to_string());

    vec![
        ComponentTypeDef::placeholder("signature-placeholder", "Signature", "div", "Signature"),
        ComponentTypeDef::placeholder("initials-placeholder", "Initials", "div", "Initials"),
        ComponentTypeDef::placeholder("date-placeholder", "Signing date", "span", SIGNING_DATE_TOKEN),
        text_block,
    ]
}

/// What [`ComponentRegistry::install`] changed on an engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub registered: Vec<String>,
    pub skipped: Vec<String>,
    pub removed_blocks: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ComponentRegistry {
    types: Vec<ComponentTypeDef>,
    palette_deny_list: Vec<String>,
}

impl ComponentRegistry {
    pub fn new(palette_deny_list: Vec<String>) -> Self {
        Self {
            types: Vec::new(),
            palette_deny_list,
        }
    }

    /// Registry preloaded with [`builtin_types`]
    pub fn with_builtins(palette_deny_list: Vec<String>) -> Self {
        let mut registry = Self::new(palette_deny_list);
        for def in builtin_types() {
            registry.register(def);
        }
        registry
    }

    /// Add a type unless one with the same name exists. Returns whether it was added.
    pub fn register(&mut self, def: ComponentTypeDef) -> bool {
        if self.get(&def.name).is_some() {
            debug!(type_name = %def.name, "Component type already registered");
            return false;
        }
        self.types.push(def);
        true
    }

    pub fn get(&self, name: &str) -> Option<&ComponentTypeDef> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn types(&self) -> &[ComponentTypeDef] {
        &self.types
    }

    /// Register every type with the engine, add palette blocks, and curate the palette
    pub fn install(&self, engine: &mut dyn CanvasEngine) -> InstallReport {
        let mut report = InstallReport::default();

        for def in &self.types {
            if engine.has_component_type(&def.name) {
                report.skipped.push(def.name.clone());
            } else {
                engine.add_component_type(def);
                report.registered.push(def.name.clone());
            }

            if !engine.block_ids().iter().any(|id| id == &def.name) {
                engine.add_block(&def.name, &def.label, &def.name);
            }
        }

        for block in &self.palette_deny_list {
            if engine.remove_block(block) {
                report.removed_blocks.push(block.clone());
            }
        }

        debug!(
            registered = report.registered.len(),
            skipped = report.skipped.len(),
            removed = report.removed_blocks.len(),
            "Installed component types"
        );
        report
    }

    /// Build a fresh, id-less instance from a type's defaults
    pub fn instantiate(&self, kind: &str) -> EditorResult<Component> {
        let def = self
            .get(kind)
            .ok_or_else(|| EditorError::UnknownComponentType(kind.to_string()))?;

        let mut component = Component::new(def.name.clone(), def.tag.clone());
        component.classes = def.classes.clone();
        component.style = def.style.clone();
        component.content = Content::Text(def.content.clone());
        Ok(component)
    }
}
