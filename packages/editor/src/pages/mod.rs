//! # Multi-Page Document Store
//!
//! One [`PageStore`] interface, two strategies picked once when a canvas
//! mounts:
//!
//! - [`NativePageStore`] when the engine manages pages itself
//! - [`FallbackPageStore`] when it doesn't, keeping page content on our side
//!
//! Either way a blueprint never ends an operation with zero pages.

mod fallback;
mod native;

pub use fallback::FallbackPageStore;
pub use native::NativePageStore;

use crate::engine::CanvasEngine;
use crate::errors::EditorResult;
use crate::snapshot::ProjectSnapshot;
use blueprint_markup::strip_noise_rules;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageMode {
    Native,
    Fallback,
}

/// One page's body markup and stylesheet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub html: String,
    pub css: String,
}

pub trait PageStore {
    fn mode(&self) -> PageMode;

    /// Page ids in display order
    fn list(&mut self, engine: &mut dyn CanvasEngine) -> Vec<String>;

    fn active(&mut self, engine: &mut dyn CanvasEngine) -> Option<String>;

    /// Append a blank page and make it active. Returns its id.
    fn add(&mut self, engine: &mut dyn CanvasEngine) -> EditorResult<String>;

    fn select(&mut self, engine: &mut dyn CanvasEngine, id: &str) -> EditorResult<()>;

    /// Remove a page. Removing the active page activates the first remaining
    /// one; removing the last page re-seeds a blank one.
    fn delete(&mut self, engine: &mut dyn CanvasEngine, id: &str) -> EditorResult<()>;

    fn move_up(&mut self, engine: &mut dyn CanvasEngine, id: &str) -> EditorResult<()>;

    fn move_down(&mut self, engine: &mut dyn CanvasEngine, id: &str) -> EditorResult<()>;

    /// Every page's content, in order, including unsaved edits on the canvas
    fn contents(&mut self, engine: &mut dyn CanvasEngine) -> EditorResult<Vec<Page>>;
}

/// `page-N` with N starting at the page count + 1 and bumped past any id in use
pub fn next_page_id(existing: &[String]) -> String {
    let mut n = existing.len() + 1;
    loop {
        let candidate = format!("page-{}", n);
        if !existing.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Pick the store strategy by probing the engine for page support
pub fn page_store_for(
    engine: &mut dyn CanvasEngine,
    snapshot: Option<&ProjectSnapshot>,
) -> Box<dyn PageStore> {
    if engine.pages().is_some() {
        debug!("Engine supports pages natively");
        Box::new(NativePageStore::new(engine))
    } else {
        debug!("Engine has no page support; using fallback page store");
        let seeded = snapshot.and_then(ProjectSnapshot::rendered_pages);
        Box::new(FallbackPageStore::new(engine, seeded))
    }
}

/// Read the live canvas content of the current page
pub(crate) fn read_live(engine: &dyn CanvasEngine, id: &str) -> Page {
    Page {
        id: id.to_string(),
        html: engine.html(),
        css: strip_noise_rules(&engine.css()),
    }
}
