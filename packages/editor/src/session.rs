//! # Editor Session
//!
//! The one place editor failures surface. Lifecycle failures become an
//! [`EditorState`] plus a recorded [`Diagnostic`]; nothing here panics or
//! leaves the caller to deal with a half-mounted canvas. Save failures are
//! still returned, so the caller can keep its saving indicator and retry.

use crate::bridge::SourceView;
use crate::collaborators::Collaborators;
use crate::document::Blueprint;
use crate::engine::{ContainerLocator, EngineFactory};
use crate::errors::{EditorError, EditorResult};
use crate::host::{Canvas, CanvasHost, CanvasSlot, MountOutcome};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::{info, instrument, warn};

/// Label key for the notification shown when edited source is rejected
pub const APPLY_FAILED_LABEL: &str = "editor.apply_failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EditorState {
    /// Waiting for the blueprint; no canvas may be mounted yet
    Loading,
    /// Blueprint loaded, canvas not mounted
    Loaded,
    Ready,
    /// Mounting failed; the editor stays up but has no canvas
    Unavailable,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Load,
    Mount,
    Apply,
    Save,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Mount => "mount",
            Stage::Apply => "apply",
            Stage::Save => "save",
        };
        f.write_str(name)
    }
}

/// A failure kept for the host application's diagnostics view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub stage: Stage,
    pub message: String,
    pub at: DateTime<Utc>,
}

pub struct EditorSession<F: EngineFactory> {
    id: String,
    host: CanvasHost<F>,
    collaborators: Collaborators,
    state: EditorState,
    blueprint: Option<Blueprint>,
    slot: CanvasSlot,
    diagnostics: Vec<Diagnostic>,
}

impl<F: EngineFactory> EditorSession<F> {
    pub fn new(id: impl Into<String>, host: CanvasHost<F>, collaborators: Collaborators) -> Self {
        Self {
            id: id.into(),
            host,
            collaborators,
            state: EditorState::Loading,
            blueprint: None,
            slot: CanvasSlot::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Create a session and load its blueprint
    pub async fn open(
        id: impl Into<String>,
        host: CanvasHost<F>,
        collaborators: Collaborators,
    ) -> EditorResult<Self> {
        let mut session = Self::new(id, host, collaborators);
        session.load().await?;
        Ok(session)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn blueprint(&self) -> Option<&Blueprint> {
        self.blueprint.as_ref()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn canvas(&self) -> Option<&Canvas> {
        self.slot.get()
    }

    pub fn canvas_mut(&mut self) -> Option<&mut Canvas> {
        self.slot.get_mut()
    }

    #[instrument(skip(self), fields(blueprint = %self.id))]
    pub async fn load(&mut self) -> EditorResult<()> {
        self.state = EditorState::Loading;
        match self.collaborators.store.load(&self.id).await {
            Ok(loaded) => {
                let blueprint = Blueprint::from_loaded(self.id.clone(), loaded);
                info!(name = %blueprint.name, new = blueprint.is_new(), "Blueprint loaded");
                self.blueprint = Some(blueprint);
                self.state = EditorState::Loaded;
                Ok(())
            }
            Err(err) => {
                self.report(Stage::Load, &err);
                self.state = EditorState::Unavailable;
                Err(EditorError::Load(err))
            }
        }
    }

    /// Mount the canvas for the loaded blueprint. Never fails: the resulting
    /// state says whether a canvas is available.
    pub async fn mount(&mut self, locator: &dyn ContainerLocator) -> EditorState {
        let Some(blueprint) = &self.blueprint else {
            info!("Blueprint still loading, canvas not mounted");
            return self.state;
        };
        let request = blueprint.mount_request();

        match self.slot.mount(&self.host, locator, &request).await {
            MountOutcome::Mounted | MountOutcome::AlreadyMounted => {
                self.state = EditorState::Ready;
            }
            MountOutcome::Failed(err) => {
                self.report(Stage::Mount, &err);
                self.state = EditorState::Unavailable;
            }
        }
        self.state
    }

    /// Build the save payload, hand it to the store, then notify the caller.
    /// Nothing in memory changes when the store rejects it.
    #[instrument(skip(self), fields(blueprint = %self.id))]
    pub async fn save(&mut self) -> EditorResult<()> {
        if self.blueprint.is_none() {
            return Err(EditorError::NotLoaded);
        }
        let canvas = self.slot.get_mut().ok_or(EditorError::NotMounted)?;
        let payload = match canvas.export() {
            Ok(payload) => payload,
            Err(err) => {
                self.report(Stage::Save, &err);
                return Err(err);
            }
        };

        if let Err(err) = self.collaborators.store.save(&self.id, &payload).await {
            self.report(Stage::Save, &err);
            return Err(EditorError::Save(err));
        }

        self.collaborators
            .callbacks
            .on_save(&payload.markup, &payload.snapshot);
        if let Some(blueprint) = self.blueprint.as_mut() {
            blueprint.record_save(&payload);
        }
        info!(pages = payload.pages.len(), "Blueprint saved");
        Ok(())
    }

    pub fn open_code_view(&self) -> EditorResult<SourceView> {
        self.slot
            .get()
            .ok_or(EditorError::NotMounted)?
            .open_code_view()
    }

    /// Apply edited source. A rejection is shown to the user and the canvas
    /// keeps its previous content.
    pub fn apply_code_view(&mut self, view: &SourceView) -> EditorResult<()> {
        let canvas = self.slot.get_mut().ok_or(EditorError::NotMounted)?;
        if let Err(err) = canvas.apply_code_view(view) {
            self.report(Stage::Apply, &err);
            let message = self.collaborators.labels.label(APPLY_FAILED_LABEL);
            self.collaborators.notifier.alert(&message);
            return Err(err);
        }
        Ok(())
    }

    /// Abandon editing without saving
    pub fn cancel(&mut self) {
        self.collaborators.callbacks.on_cancel();
        self.slot.unmount();
        self.state = EditorState::Closed;
        info!(blueprint = %self.id, "Editing cancelled");
    }

    fn report(&mut self, stage: Stage, err: &dyn std::error::Error) {
        warn!(%stage, error = %err, "Editor operation failed");
        self.diagnostics.push(Diagnostic {
            stage,
            message: err.to_string(),
            at: Utc::now(),
        });
    }
}
