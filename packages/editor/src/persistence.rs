//! Save-time assembly: per-page render documents plus the engine snapshot.

use crate::engine::CanvasEngine;
use crate::errors::EditorResult;
use crate::pages::PageStore;
use crate::snapshot::ProjectSnapshot;
use blueprint_markup::render_document;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A page frozen as a standalone HTML document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedPage {
    pub page_id: String,
    pub html: String,
}

/// Everything the external save operation receives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePayload {
    /// Render document of the first page
    pub markup: String,
    pub pages: Vec<RenderedPage>,
    pub snapshot: ProjectSnapshot,
}

pub fn render_pages(
    store: &mut dyn PageStore,
    engine: &mut dyn CanvasEngine,
) -> EditorResult<Vec<RenderedPage>> {
    let pages = store
        .contents(engine)?
        .into_iter()
        .map(|page| RenderedPage {
            html: render_document(&page.html, &page.css),
            page_id: page.id,
        })
        .collect::<Vec<_>>();
    debug!(pages = pages.len(), "Rendered pages");
    Ok(pages)
}

pub fn export_snapshot(
    engine: &dyn CanvasEngine,
    pages: &[RenderedPage],
) -> EditorResult<ProjectSnapshot> {
    let mut snapshot = engine.project_data();
    snapshot.attach_rendered_pages(pages)?;
    Ok(snapshot)
}

pub fn build_payload(
    store: &mut dyn PageStore,
    engine: &mut dyn CanvasEngine,
) -> EditorResult<SavePayload> {
    let pages = render_pages(store, engine)?;
    let snapshot = export_snapshot(engine, &pages)?;
    let markup = pages.first().map(|p| p.html.clone()).unwrap_or_default();

    Ok(SavePayload {
        markup,
        pages,
        snapshot,
    })
}
