use super::{next_page_id, read_live, Page, PageMode, PageStore};
use crate::engine::CanvasEngine;
use crate::errors::{EditorError, EditorResult};
use crate::persistence::RenderedPage;
use blueprint_markup::split_render_document;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Keeps every page's content on our side for engines that only know one
/// canvas. Only the active page lives in the engine; the others wait in
/// `contents` until they're selected.
#[derive(Debug)]
pub struct FallbackPageStore {
    contents: HashMap<String, Page>,
    order: Vec<String>,
    active: String,
}

fn load(engine: &mut dyn CanvasEngine, page: &Page) -> EditorResult<()> {
    engine.set_components(&page.html)?;
    engine.set_style(&page.css)?;
    engine.refresh();
    Ok(())
}

/// Load `next`, putting `current` back on the canvas if that fails
fn load_or_restore(engine: &mut dyn CanvasEngine, next: &Page, current: &Page) -> EditorResult<()> {
    let Err(err) = load(engine, next) else {
        return Ok(());
    };
    if let Err(restore) = load(engine, current) {
        warn!(page = %current.id, error = %restore, "Failed to restore page after load error");
    }
    Err(err)
}

impl FallbackPageStore {
    /// Start from the canvas content, or from render documents a previous save
    /// attached to the snapshot
    pub fn new(engine: &mut dyn CanvasEngine, seeded: Option<Vec<RenderedPage>>) -> Self {
        let pages: Vec<Page> = seeded
            .unwrap_or_default()
            .into_iter()
            .map(|rendered| {
                let (html, css) = split_render_document(&rendered.html);
                Page {
                    id: rendered.page_id,
                    html,
                    css,
                }
            })
            .collect();

        // Only one page is ever on the canvas; the rest still own their ids
        for page in &pages {
            if let Err(err) = engine.reserve_ids(&page.html) {
                warn!(page = %page.id, error = %err, "Could not reserve ids of saved page");
            }
        }

        if let Some(first) = pages.first().cloned() {
            match load(engine, &first) {
                Ok(()) => {
                    debug!(pages = pages.len(), "Restored pages from snapshot");
                    return Self {
                        active: first.id,
                        order: pages.iter().map(|p| p.id.clone()).collect(),
                        contents: pages.into_iter().map(|p| (p.id.clone(), p)).collect(),
                    };
                }
                Err(err) => {
                    warn!(error = %err, "Saved pages could not be restored; starting from canvas")
                }
            }
        }

        let id = next_page_id(&[]);
        let page = read_live(engine, &id);
        Self {
            contents: HashMap::from([(id.clone(), page)]),
            order: vec![id.clone()],
            active: id,
        }
    }

    /// Put `target` on the canvas. With `keep_current`, the outgoing page is
    /// snapshotted first. A failed load puts the outgoing content back.
    fn switch_to(
        &mut self,
        engine: &mut dyn CanvasEngine,
        target: &str,
        keep_current: bool,
    ) -> EditorResult<()> {
        let next = self
            .contents
            .get(target)
            .cloned()
            .ok_or_else(|| EditorError::PageNotFound(target.to_string()))?;

        let current = read_live(engine, &self.active);
        if keep_current {
            self.contents.insert(self.active.clone(), current.clone());
        }

        load_or_restore(engine, &next, &current)?;
        self.active = target.to_string();
        Ok(())
    }

    fn index_of(&self, id: &str) -> EditorResult<usize> {
        self.order
            .iter()
            .position(|p| p == id)
            .ok_or_else(|| EditorError::PageNotFound(id.to_string()))
    }
}

impl PageStore for FallbackPageStore {
    fn mode(&self) -> PageMode {
        PageMode::Fallback
    }

    fn list(&mut self, _engine: &mut dyn CanvasEngine) -> Vec<String> {
        self.order.clone()
    }

    fn active(&mut self, _engine: &mut dyn CanvasEngine) -> Option<String> {
        Some(self.active.clone())
    }

    fn add(&mut self, engine: &mut dyn CanvasEngine) -> EditorResult<String> {
        let id = next_page_id(&self.order);
        self.contents.insert(
            id.clone(),
            Page {
                id: id.clone(),
                ..Page::default()
            },
        );
        self.order.push(id.clone());

        if let Err(err) = self.switch_to(engine, &id, true) {
            self.order.pop();
            self.contents.remove(&id);
            return Err(err);
        }
        debug!(page = %id, "Added page");
        Ok(id)
    }

    fn select(&mut self, engine: &mut dyn CanvasEngine, id: &str) -> EditorResult<()> {
        self.index_of(id)?;
        if id == self.active {
            return Ok(());
        }
        self.switch_to(engine, id, true)
    }

    /// The canvas switches first; the page list only changes once the
    /// replacement page is showing.
    fn delete(&mut self, engine: &mut dyn CanvasEngine, id: &str) -> EditorResult<()> {
        let index = self.index_of(id)?;
        let was_active = id == self.active;

        if self.order.len() == 1 {
            let seed = next_page_id(&[]);
            let blank = Page {
                id: seed.clone(),
                ..Page::default()
            };
            let current = read_live(engine, &self.active);
            load_or_restore(engine, &blank, &current)?;

            self.contents = HashMap::from([(seed.clone(), blank)]);
            self.order = vec![seed.clone()];
            self.active = seed.clone();
            debug!(page = %id, reseeded = %seed, "Deleted last page");
            return Ok(());
        }

        if was_active {
            let next = if index == 0 { 1 } else { 0 };
            let next = self.order[next].clone();
            self.switch_to(engine, &next, false)?;
        }

        self.order.remove(index);
        self.contents.remove(id);
        debug!(page = %id, was_active, "Deleted page");
        Ok(())
    }

    fn move_up(&mut self, _engine: &mut dyn CanvasEngine, id: &str) -> EditorResult<()> {
        let index = self.index_of(id)?;
        if index > 0 {
            self.order.swap(index, index - 1);
        }
        Ok(())
    }

    fn move_down(&mut self, _engine: &mut dyn CanvasEngine, id: &str) -> EditorResult<()> {
        let index = self.index_of(id)?;
        if index + 1 < self.order.len() {
            self.order.swap(index, index + 1);
        }
        Ok(())
    }

    fn contents(&mut self, engine: &mut dyn CanvasEngine) -> EditorResult<Vec<Page>> {
        let live = read_live(engine, &self.active);
        self.contents.insert(self.active.clone(), live);

        self.order
            .iter()
            .map(|id| {
                self.contents
                    .get(id)
                    .cloned()
                    .ok_or_else(|| EditorError::PageNotFound(id.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::memory::MemoryEngine;
    use crate::component::{Component, IdGenerator};
    use crate::engine::{ContainerId, EngineError};
    use blueprint_markup::render_document;

    fn live_engine() -> MemoryEngine {
        let mut engine = MemoryEngine::new(false);
        engine.init(&ContainerId("canvas".to_string())).unwrap();
        engine
    }

    #[test]
    fn test_starts_with_canvas_content() {
        let mut engine = live_engine();
        engine.set_components("<p>hello</p>").unwrap();
        let mut store = FallbackPageStore::new(&mut engine, None);

        assert_eq!(store.list(&mut engine), vec!["page-1"]);
        let pages = store.contents(&mut engine).unwrap();
        assert!(pages[0].html.contains(">hello</p>"));
    }

    #[test]
    fn test_pages_keep_their_content() {
        let mut engine = live_engine();
        let mut store = FallbackPageStore::new(&mut engine, None);
        engine.set_components("<p>one</p>").unwrap();
        engine.set_style("p{color:red}").unwrap();

        store.add(&mut engine).unwrap();
        assert_eq!(engine.html(), "");
        engine.set_components("<p>two</p>").unwrap();

        store.select(&mut engine, "page-1").unwrap();
        assert!(engine.html().contains(">one</p>"));
        assert!(engine.css().ends_with("p{color:red}"));

        store.select(&mut engine, "page-2").unwrap();
        assert!(engine.html().contains(">two</p>"));
    }

    #[test]
    fn test_contents_include_unsaved_edits() {
        let mut engine = live_engine();
        let mut store = FallbackPageStore::new(&mut engine, None);
        store.add(&mut engine).unwrap();
        engine.set_components("<p>draft</p>").unwrap();

        let pages = store.contents(&mut engine).unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages[1].html.contains(">draft</p>"));
    }

    #[test]
    fn test_failed_load_restores_outgoing_page() {
        let mut engine = live_engine();
        let mut store = FallbackPageStore::new(&mut engine, None);
        store.add(&mut engine).unwrap();
        engine.set_components("<p>two</p>").unwrap();

        // Corrupt page-1's stored stylesheet so loading it fails
        store.contents.get_mut("page-1").unwrap().css = "p{".to_string();

        let err = store.select(&mut engine, "page-1").unwrap_err();
        assert!(matches!(err, EditorError::Engine(EngineError::Style(_))));
        assert_eq!(store.active(&mut engine), Some("page-2".to_string()));
        assert!(engine.html().contains(">two</p>"));
    }

    #[test]
    fn test_delete_active_loads_first() {
        let mut engine = live_engine();
        let mut store = FallbackPageStore::new(&mut engine, None);
        engine.set_components("<p>one</p>").unwrap();
        store.add(&mut engine).unwrap();

        store.delete(&mut engine, "page-2").unwrap();
        assert_eq!(store.active(&mut engine), Some("page-1".to_string()));
        assert!(engine.html().contains(">one</p>"));
    }

    #[test]
    fn test_delete_only_page_reseeds_blank() {
        let mut engine = live_engine();
        engine.set_components("<p>gone</p>").unwrap();
        let mut store = FallbackPageStore::new(&mut engine, None);

        store.delete(&mut engine, "page-1").unwrap();
        assert_eq!(store.list(&mut engine), vec!["page-1"]);
        assert_eq!(engine.html(), "");
    }

    #[test]
    fn test_moves_only_reorder() {
        let mut engine = live_engine();
        let mut store = FallbackPageStore::new(&mut engine, None);
        store.add(&mut engine).unwrap();
        store.add(&mut engine).unwrap();

        store.move_up(&mut engine, "page-1").unwrap();
        store.move_down(&mut engine, "page-3").unwrap();
        assert_eq!(store.list(&mut engine), vec!["page-1", "page-2", "page-3"]);

        store.move_down(&mut engine, "page-1").unwrap();
        assert_eq!(store.list(&mut engine), vec!["page-2", "page-1", "page-3"]);
        assert_eq!(store.active(&mut engine), Some("page-3".to_string()));
    }

    #[test]
    fn test_failed_delete_changes_nothing() {
        let mut engine = live_engine();
        let seeded = vec![
            RenderedPage {
                page_id: "page-1".to_string(),
                html: render_document("<p>cover</p>", ""),
            },
            RenderedPage {
                page_id: "page-2".to_string(),
                html: render_document("<p>broken", ""),
            },
        ];
        let mut store = FallbackPageStore::new(&mut engine, Some(seeded));

        assert!(store.delete(&mut engine, "page-1").is_err());
        assert_eq!(store.list(&mut engine), vec!["page-1", "page-2"]);
        assert_eq!(store.active(&mut engine), Some("page-1".to_string()));
        assert!(engine.html().contains(">cover</p>"));
    }

    #[test]
    fn test_seeded_pages_reserve_their_ids() {
        let mut engine = live_engine();
        let seed = IdGenerator::new("canvas").seed().to_string();
        let seeded = vec![
            RenderedPage {
                page_id: "page-1".to_string(),
                html: render_document(&format!(r#"<p data-bp-id="{seed}-1">a</p>"#), ""),
            },
            RenderedPage {
                page_id: "page-2".to_string(),
                html: render_document(&format!(r#"<p data-bp-id="{seed}-2">b</p>"#), ""),
            },
        ];
        let mut store = FallbackPageStore::new(&mut engine, Some(seeded));

        let id = engine.append_component(Component::new("text-block", "div"));
        assert_eq!(id, format!("{}-3", seed));
        assert_eq!(store.list(&mut engine).len(), 2);
    }

    #[test]
    fn test_seeded_from_rendered_pages() {
        let mut engine = live_engine();
        let seeded = vec![
            RenderedPage {
                page_id: "page-1".to_string(),
                html: render_document("<p>cover</p>", ".c{top:0}"),
            },
            RenderedPage {
                page_id: "page-2".to_string(),
                html: render_document("<p>terms</p>", ""),
            },
        ];
        let mut store = FallbackPageStore::new(&mut engine, Some(seeded));

        assert_eq!(store.list(&mut engine), vec!["page-1", "page-2"]);
        assert!(engine.html().contains(">cover</p>"));

        store.select(&mut engine, "page-2").unwrap();
        assert!(engine.html().contains(">terms</p>"));
    }
}
