use super::{next_page_id, read_live, Page, PageMode, PageStore};
use crate::engine::{CanvasEngine, EngineError, EnginePages};
use crate::errors::{EditorError, EditorResult};
use tracing::{debug, warn};

/// Delegates to the engine's own page model
#[derive(Debug, Default)]
pub struct NativePageStore;

fn engine_pages(engine: &mut dyn CanvasEngine) -> EditorResult<&mut dyn EnginePages> {
    engine.pages().ok_or(EditorError::PagesUnsupported)
}

fn not_found(err: EngineError) -> EditorError {
    match err {
        EngineError::UnknownPage(id) => EditorError::PageNotFound(id),
        other => EditorError::Engine(other),
    }
}

impl NativePageStore {
    /// Make sure the engine starts with an active page
    pub fn new(engine: &mut dyn CanvasEngine) -> Self {
        if let Some(pages) = engine.pages() {
            if pages.ids().is_empty() {
                let id = next_page_id(&[]);
                pages.add(&id);
            }
            if pages.active().is_none() {
                if let Some(first) = pages.ids().first() {
                    if let Err(err) = pages.select(first) {
                        warn!(page = %first, error = %err, "Failed to activate first page");
                    }
                }
            }
        }
        Self
    }

    fn index_of(pages: &dyn EnginePages, id: &str) -> EditorResult<usize> {
        pages
            .ids()
            .iter()
            .position(|p| p == id)
            .ok_or_else(|| EditorError::PageNotFound(id.to_string()))
    }
}

fn collect_pages(pages: &[String], engine: &mut dyn CanvasEngine) -> EditorResult<Vec<Page>> {
    let mut contents = Vec::with_capacity(pages.len());
    for id in pages {
        engine_pages(engine)?.select(id).map_err(not_found)?;
        contents.push(read_live(engine, id));
    }
    Ok(contents)
}

impl PageStore for NativePageStore {
    fn mode(&self) -> PageMode {
        PageMode::Native
    }

    fn list(&mut self, engine: &mut dyn CanvasEngine) -> Vec<String> {
        engine.pages().map(|p| p.ids()).unwrap_or_default()
    }

    fn active(&mut self, engine: &mut dyn CanvasEngine) -> Option<String> {
        engine.pages().and_then(|p| p.active())
    }

    fn add(&mut self, engine: &mut dyn CanvasEngine) -> EditorResult<String> {
        let pages = engine_pages(engine)?;
        let id = next_page_id(&pages.ids());
        pages.add(&id);
        pages.select(&id).map_err(not_found)?;
        debug!(page = %id, "Added page");
        Ok(id)
    }

    fn select(&mut self, engine: &mut dyn CanvasEngine, id: &str) -> EditorResult<()> {
        engine_pages(engine)?.select(id).map_err(not_found)
    }

    fn delete(&mut self, engine: &mut dyn CanvasEngine, id: &str) -> EditorResult<()> {
        let pages = engine_pages(engine)?;
        Self::index_of(pages, id)?;
        let was_active = pages.active().as_deref() == Some(id);

        pages.remove(id);
        debug!(page = %id, was_active, "Deleted page");

        let remaining = pages.ids();
        match remaining.first() {
            None => {
                let seed = next_page_id(&[]);
                pages.add(&seed);
                pages.select(&seed).map_err(not_found)?;
                debug!(page = %seed, "Re-seeded blank page");
            }
            Some(first) if was_active => pages.select(first).map_err(not_found)?,
            Some(_) => {}
        }
        Ok(())
    }

    fn move_up(&mut self, engine: &mut dyn CanvasEngine, id: &str) -> EditorResult<()> {
        let pages = engine_pages(engine)?;
        let index = Self::index_of(pages, id)?;
        if index == 0 {
            return Ok(());
        }
        pages.move_to(id, index - 1).map_err(not_found)
    }

    fn move_down(&mut self, engine: &mut dyn CanvasEngine, id: &str) -> EditorResult<()> {
        let pages = engine_pages(engine)?;
        let index = Self::index_of(pages, id)?;
        if index + 1 >= pages.ids().len() {
            return Ok(());
        }
        pages.move_to(id, index + 1).map_err(not_found)
    }

    /// Activates each page in turn, then restores the page that was active
    /// before, whether or not every page could be read.
    fn contents(&mut self, engine: &mut dyn CanvasEngine) -> EditorResult<Vec<Page>> {
        let pages = engine_pages(engine)?;
        let previous = pages.active();
        let order = pages.ids();

        let result = collect_pages(&order, engine);

        if let Some(previous) = previous {
            if let Err(err) = engine_pages(engine).and_then(|p| p.select(&previous).map_err(not_found)) {
                warn!(page = %previous, error = %err, "Failed to restore active page");
            }
        }
        result
    }
}
