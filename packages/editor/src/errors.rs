//! Error types for the editor

use crate::collaborators::StoreError;
use crate::engine::EngineError;
use blueprint_markup::ParseError;
use thiserror::Error;

pub type EditorResult<T> = Result<T, EditorError>;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Markup error: {0}")]
    Markup(#[from] ParseError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Could not apply edited source: {0}")]
    Apply(#[source] EngineError),

    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Canvas engine has no native page support")]
    PagesUnsupported,

    #[error("Unknown component type: {0}")]
    UnknownComponentType(String),

    #[error("Project snapshot is not a JSON object")]
    SnapshotShape,

    #[error("Invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No canvas is mounted")]
    NotMounted,

    #[error("Blueprint has not finished loading")]
    NotLoaded,

    #[error("Failed to load blueprint: {0}")]
    Load(#[source] StoreError),

    #[error("Failed to save blueprint: {0}")]
    Save(#[source] StoreError),
}

/// Failures while bringing a canvas up. Never surfaced as a panic or
/// propagated past the session; see [`crate::EditorSession::mount`].
#[derive(Error, Debug)]
pub enum MountError {
    #[error("Container was not attached after {attempts} polls")]
    ContainerTimeout { attempts: u32 },

    #[error("Engine failed to initialize: {0}")]
    Init(#[source] EngineError),

    #[error("Failed to load initial content: {0}")]
    Setup(#[source] EditorError),
}
