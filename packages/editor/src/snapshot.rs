//! Opaque project snapshots.
//!
//! The engine decides what a snapshot contains. The editor only ever adds or
//! reads back the one key it owns, [`RENDERED_PAGES_KEY`].

use crate::errors::{EditorError, EditorResult};
use crate::persistence::RenderedPage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key under which the per-page render documents travel inside a snapshot
pub const RENDERED_PAGES_KEY: &str = "renderedPages";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectSnapshot(Value);

impl ProjectSnapshot {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn from_json(json: &str) -> EditorResult<Self> {
        Ok(Self(serde_json::from_str(json)?))
    }

    pub fn to_json(&self) -> EditorResult<String> {
        Ok(serde_json::to_string(&self.0)?)
    }

    /// Attach render documents, replacing any from an earlier save
    pub fn attach_rendered_pages(&mut self, pages: &[RenderedPage]) -> EditorResult<()> {
        let object = self.0.as_object_mut().ok_or(EditorError::SnapshotShape)?;
        object.insert(RENDERED_PAGES_KEY.to_string(), serde_json::to_value(pages)?);
        Ok(())
    }

    /// Render documents attached by a previous save, if any
    pub fn rendered_pages(&self) -> Option<Vec<RenderedPage>> {
        let pages = self.0.get(RENDERED_PAGES_KEY)?;
        serde_json::from_value(pages.clone()).ok()
    }
}
