//! # Headless Canvas Engine
//!
//! An in-memory [`CanvasEngine`] that keeps a component tree per page. It
//! behaves like a browser canvas where it matters to the editor:
//!
//! - its stylesheet output always starts with the box-sizing and body-margin
//!   resets a real canvas injects
//! - replacing content parses first, so bad markup leaves the page untouched
//! - page support is optional, so both page store strategies can run on it

use super::{CanvasEngine, ContainerId, EngineError, EngineFactory, EnginePages};
use crate::component::{observe_markup_ids, Component, IdGenerator};
use crate::registry::ComponentTypeDef;
use crate::snapshot::ProjectSnapshot;
use blueprint_markup::{parse_fragment, strip_noise_rules, to_html, validate_css, Node};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// Rules emitted ahead of every page stylesheet
pub const CANVAS_PREAMBLE: &str = "* { box-sizing: border-box; } body {margin: 0;}";

const ENGINE_NAME: &str = "blueprint-memory";
const PROJECT_VERSION: u32 = 1;
const SINGLE_PAGE_ID: &str = "main";

/// Palette a fresh engine starts with, before curation
const DEFAULT_BLOCKS: &[(&str, &str)] = &[
    ("text", "Text"),
    ("text-basic", "Text section"),
    ("link", "Link"),
    ("image", "Image"),
    ("quote", "Quote"),
    ("map", "Map"),
    ("video", "Video"),
    ("column1", "1 Column"),
    ("column2", "2 Columns"),
    ("column3", "3 Columns"),
    ("column3-7", "2 Columns 3/7"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Live,
    Destroyed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: String,
    pub label: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct EnginePage {
    id: String,
    components: Vec<Component>,
    css: String,
}

impl EnginePage {
    fn blank(id: &str) -> Self {
        Self {
            id: id.to_string(),
            components: Vec::new(),
            css: String::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ProjectData {
    engine: String,
    version: u32,
    active: Option<String>,
    pages: Vec<EnginePage>,
}

/// Counters shared between a factory and the engines it creates
#[derive(Debug, Default)]
pub struct EngineStats {
    created: Cell<u32>,
    initialized: Cell<u32>,
    destroyed: Cell<u32>,
}

impl EngineStats {
    pub fn created(&self) -> u32 {
        self.created.get()
    }

    pub fn initialized(&self) -> u32 {
        self.initialized.get()
    }

    pub fn destroyed(&self) -> u32 {
        self.destroyed.get()
    }

    /// Engines created and not yet destroyed
    pub fn live(&self) -> u32 {
        self.created() - self.destroyed()
    }
}

#[derive(Debug)]
pub struct MemoryEngine {
    native_pages: bool,
    lifecycle: Lifecycle,
    init_failure: Option<EngineError>,
    types: Vec<ComponentTypeDef>,
    blocks: Vec<Block>,
    commands: Vec<String>,
    pages: Vec<EnginePage>,
    active: usize,
    ids: IdGenerator,
    refreshes: u32,
    /// Page whose selection fails, for exercising error paths
    failing_select: Option<String>,
    stats: Rc<EngineStats>,
}

impl MemoryEngine {
    pub fn new(native_pages: bool) -> Self {
        Self::with_stats(native_pages, Rc::new(EngineStats::default()))
    }

    fn with_stats(native_pages: bool, stats: Rc<EngineStats>) -> Self {
        stats.created.set(stats.created.get() + 1);
        let first_page = if native_pages { "page-1" } else { SINGLE_PAGE_ID };

        Self {
            native_pages,
            lifecycle: Lifecycle::Created,
            init_failure: None,
            types: Vec::new(),
            blocks: DEFAULT_BLOCKS
                .iter()
                .map(|(id, label)| Block {
                    id: id.to_string(),
                    label: label.to_string(),
                    kind: "default".to_string(),
                })
                .collect(),
            commands: Vec::new(),
            pages: vec![EnginePage::blank(first_page)],
            active: 0,
            ids: IdGenerator::new(ENGINE_NAME),
            refreshes: 0,
            failing_select: None,
            stats,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Number of times the model was rebuilt after a wholesale replace
    pub fn refresh_count(&self) -> u32 {
        self.refreshes
    }

    /// Make every later native selection of `id` fail
    pub fn fail_selecting(&mut self, id: impl Into<String>) {
        self.failing_select = Some(id.into());
    }

    fn current(&self) -> Option<&EnginePage> {
        self.pages.get(self.active)
    }

    fn current_mut(&mut self) -> Option<&mut EnginePage> {
        self.pages.get_mut(self.active)
    }

    fn parse_components(&mut self, html: &str) -> Result<Vec<Component>, EngineError> {
        let nodes = parse_fragment(html)?;
        let types = &self.types;
        let is_known = |kind: &str| types.iter().any(|t| t.name == kind);
        Ok(Component::from_nodes(&nodes, &mut self.ids, &is_known))
    }
}

impl CanvasEngine for MemoryEngine {
    fn init(&mut self, container: &ContainerId) -> Result<(), EngineError> {
        if let Some(err) = self.init_failure.take() {
            return Err(err);
        }
        self.ids = IdGenerator::new(&container.0);
        self.lifecycle = Lifecycle::Live;
        self.stats.initialized.set(self.stats.initialized.get() + 1);
        Ok(())
    }

    fn destroy(&mut self) {
        if self.lifecycle == Lifecycle::Destroyed {
            return;
        }
        self.lifecycle = Lifecycle::Destroyed;
        self.stats.destroyed.set(self.stats.destroyed.get() + 1);
    }

    fn is_alive(&self) -> bool {
        self.lifecycle == Lifecycle::Live
    }

    fn has_component_type(&self, name: &str) -> bool {
        self.types.iter().any(|t| t.name == name)
    }

    fn add_component_type(&mut self, def: &ComponentTypeDef) {
        self.types.push(def.clone());
    }

    fn block_ids(&self) -> Vec<String> {
        self.blocks.iter().map(|b| b.id.clone()).collect()
    }

    fn add_block(&mut self, id: &str, label: &str, kind: &str) {
        self.blocks.push(Block {
            id: id.to_string(),
            label: label.to_string(),
            kind: kind.to_string(),
        });
    }

    fn remove_block(&mut self, id: &str) -> bool {
        let before = self.blocks.len();
        self.blocks.retain(|b| b.id != id);
        self.blocks.len() != before
    }

    fn has_command(&self, id: &str) -> bool {
        self.commands.iter().any(|c| c == id)
    }

    fn add_command(&mut self, id: &str) {
        self.commands.push(id.to_string());
    }

    fn html(&self) -> String {
        let nodes: Vec<Node> = self
            .current()
            .map(|page| page.components.iter().map(Component::to_node).collect())
            .unwrap_or_default();
        to_html(&nodes)
    }

    fn css(&self) -> String {
        let authored = self.current().map(|page| page.css.as_str()).unwrap_or("");
        if authored.is_empty() {
            CANVAS_PREAMBLE.to_string()
        } else {
            format!("{}{}", CANVAS_PREAMBLE, authored)
        }
    }

    fn set_components(&mut self, html: &str) -> Result<(), EngineError> {
        let components = self.parse_components(html)?;
        let page = self
            .current_mut()
            .ok_or_else(|| EngineError::Internal("no page is active".to_string()))?;
        page.components = components;
        Ok(())
    }

    fn set_style(&mut self, css: &str) -> Result<(), EngineError> {
        validate_css(css).map_err(|err| EngineError::Style(err.to_string()))?;
        let page = self
            .current_mut()
            .ok_or_else(|| EngineError::Internal("no page is active".to_string()))?;
        page.css = strip_noise_rules(css);
        Ok(())
    }

    fn refresh(&mut self) {
        self.refreshes += 1;
    }

    fn components(&self) -> Vec<Component> {
        self.current()
            .map(|page| page.components.clone())
            .unwrap_or_default()
    }

    fn reserve_ids(&mut self, html: &str) -> Result<(), EngineError> {
        let nodes = parse_fragment(html)?;
        observe_markup_ids(&nodes, &mut self.ids);
        Ok(())
    }

    fn append_component(&mut self, mut component: Component) -> String {
        component.assign_ids(&mut self.ids);
        let id = component.id.clone();
        if let Some(page) = self.current_mut() {
            page.components.push(component);
        }
        id
    }

    fn project_data(&self) -> ProjectSnapshot {
        let data = ProjectData {
            engine: ENGINE_NAME.to_string(),
            version: PROJECT_VERSION,
            active: self.current().map(|page| page.id.clone()),
            pages: self.pages.clone(),
        };
        // Plain structs with string keys always serialize
        ProjectSnapshot::from_value(serde_json::to_value(data).unwrap_or_default())
    }

    fn load_project_data(&mut self, snapshot: &ProjectSnapshot) -> Result<(), EngineError> {
        let data: ProjectData = serde_json::from_value(snapshot.as_value().clone())
            .map_err(|e| EngineError::Project(e.to_string()))?;
        if data.engine != ENGINE_NAME {
            return Err(EngineError::Project(format!("unknown engine '{}'", data.engine)));
        }
        if data.pages.is_empty() {
            return Err(EngineError::Project("project has no pages".to_string()));
        }

        let mut pages = data.pages;
        if !self.native_pages {
            // Without page support only the page that was on the canvas survives
            let keep = data
                .active
                .as_deref()
                .and_then(|id| pages.iter().position(|p| p.id == id))
                .unwrap_or(0);
            let mut page = pages.swap_remove(keep);
            page.id = SINGLE_PAGE_ID.to_string();
            pages = vec![page];
        }

        for page in &pages {
            for component in &page.components {
                observe_ids(component, &mut self.ids);
            }
        }
        self.active = data
            .active
            .and_then(|id| pages.iter().position(|p| p.id == id))
            .unwrap_or(0);
        self.pages = pages;
        Ok(())
    }

    fn pages(&mut self) -> Option<&mut dyn EnginePages> {
        if self.native_pages {
            Some(self as &mut dyn EnginePages)
        } else {
            None
        }
    }
}

fn observe_ids(component: &Component, ids: &mut IdGenerator) {
    ids.observe(&component.id);
    for child in component.children() {
        observe_ids(child, ids);
    }
}

impl EnginePages for MemoryEngine {
    fn ids(&self) -> Vec<String> {
        self.pages.iter().map(|p| p.id.clone()).collect()
    }

    fn active(&self) -> Option<String> {
        self.current().map(|p| p.id.clone())
    }

    fn add(&mut self, id: &str) {
        self.pages.push(EnginePage::blank(id));
    }

    fn select(&mut self, id: &str) -> Result<(), EngineError> {
        if self.failing_select.as_deref() == Some(id) {
            return Err(EngineError::Internal(format!("page {} failed to activate", id)));
        }
        self.active = self
            .pages
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| EngineError::UnknownPage(id.to_string()))?;
        Ok(())
    }

    fn remove(&mut self, id: &str) -> bool {
        let Some(index) = self.pages.iter().position(|p| p.id == id) else {
            return false;
        };
        let active_id = EnginePages::active(self);
        self.pages.remove(index);
        // Keep pointing at the same page when a different one was removed
        self.active = active_id
            .and_then(|active| self.pages.iter().position(|p| p.id == active))
            .unwrap_or(0);
        true
    }

    fn move_to(&mut self, id: &str, index: usize) -> Result<(), EngineError> {
        let from = self
            .pages
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| EngineError::UnknownPage(id.to_string()))?;
        let active_id = EnginePages::active(self);
        let page = self.pages.remove(from);
        self.pages.insert(index.min(self.pages.len()), page);
        self.active = active_id
            .and_then(|active| self.pages.iter().position(|p| p.id == active))
            .unwrap_or(0);
        Ok(())
    }
}

/// Creates [`MemoryEngine`]s, optionally failing the next initializations
#[derive(Debug, Default)]
pub struct MemoryEngineFactory {
    native_pages: bool,
    init_failures: RefCell<VecDeque<EngineError>>,
    stats: Rc<EngineStats>,
}

impl MemoryEngineFactory {
    /// Engines without page support
    pub fn new() -> Self {
        Self::default()
    }

    /// Engines with native page support
    pub fn with_native_pages() -> Self {
        Self {
            native_pages: true,
            ..Self::default()
        }
    }

    /// Fail the next initializations with these errors, in order
    pub fn failing_init(self, errors: impl IntoIterator<Item = EngineError>) -> Self {
        self.init_failures.borrow_mut().extend(errors);
        self
    }

    pub fn stats(&self) -> Rc<EngineStats> {
        Rc::clone(&self.stats)
    }
}

impl EngineFactory for MemoryEngineFactory {
    fn create(&self) -> Box<dyn CanvasEngine> {
        let mut engine = MemoryEngine::with_stats(self.native_pages, Rc::clone(&self.stats));
        engine.init_failure = self.init_failures.borrow_mut().pop_front();
        Box::new(engine)
    }
}
