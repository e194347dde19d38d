//! # Blueprint
//!
//! The multi-page template being authored, as the session holds it between
//! loads and saves. The live content is on the canvas; this keeps what the
//! backend last confirmed.

use crate::collaborators::LoadedBlueprint;
use crate::host::MountRequest;
use crate::persistence::{RenderedPage, SavePayload};
use crate::snapshot::ProjectSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blueprint {
    pub id: String,
    pub name: String,

    /// Render document of the first page, as last saved
    pub markup: Option<String>,

    pub snapshot: Option<ProjectSnapshot>,

    /// Render documents of every page, as last saved
    #[serde(default)]
    pub pages: Vec<RenderedPage>,

    /// Set when a save in this session succeeded
    pub saved_at: Option<DateTime<Utc>>,
}

impl Blueprint {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            markup: None,
            snapshot: None,
            pages: Vec::new(),
            saved_at: None,
        }
    }

    pub fn from_loaded(id: impl Into<String>, loaded: LoadedBlueprint) -> Self {
        let pages = loaded
            .snapshot
            .as_ref()
            .and_then(ProjectSnapshot::rendered_pages)
            .unwrap_or_default();
        Self {
            id: id.into(),
            name: loaded.name,
            markup: loaded.markup,
            snapshot: loaded.snapshot,
            pages,
            saved_at: None,
        }
    }

    /// Never saved before
    pub fn is_new(&self) -> bool {
        self.markup.is_none() && self.snapshot.is_none()
    }

    pub fn mount_request(&self) -> MountRequest {
        MountRequest {
            markup: self.markup.clone(),
            snapshot: self.snapshot.clone(),
            name: self.name.clone(),
        }
    }

    pub fn record_save(&mut self, payload: &SavePayload) {
        self.markup = Some(payload.markup.clone());
        self.snapshot = Some(payload.snapshot.clone());
        self.pages = payload.pages.clone();
        self.saved_at = Some(Utc::now());
    }
}
