//! # Blueprint Editor
//!
//! Core of the visual blueprint editor: a canvas host, a multi-page store, a
//! code view bridge and the save path, behind one session type.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ session: load → mount → edit → save/cancel  │
//! │  - single error boundary, diagnostics       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ host: owned canvas handle                   │
//! │  - container polling, init retry, teardown  │
//! │  - registry install, page store selection   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌──────────────┬──────────────┬───────────────┐
//! │ pages        │ bridge       │ persistence   │
//! │ native or    │ canvas ⇄     │ render docs + │
//! │ fallback     │ source text  │ snapshot      │
//! └──────────────┴──────────────┴───────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ engine: CanvasEngine seam (+ MemoryEngine)  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **The caller owns the canvas**: no process-wide handle; a [`CanvasSlot`]
//!    holds at most one live canvas and dropping it tears the engine down
//! 2. **One page interface**: [`PageStore`] is picked once per mount by
//!    probing the engine for page support
//! 3. **Failures are values**: lifecycle errors end up in the session's
//!    diagnostics instead of disappearing
//! 4. **The snapshot is opaque**: only the engine reads it; the editor adds
//!    its rendered pages under one key
//!
//! ## Usage
//!
//! ```rust,ignore
//! use blueprint_editor::{CanvasHost, Collaborators, EditorConfig, EditorSession};
//! use blueprint_editor::engine::memory::MemoryEngineFactory;
//!
//! let host = CanvasHost::new(MemoryEngineFactory::with_native_pages(), EditorConfig::default());
//! let mut session = EditorSession::open("bp-42", host, collaborators).await?;
//!
//! session.mount(&container_locator).await;
//! let canvas = session.canvas_mut().unwrap();
//! canvas.insert_component("signature-placeholder")?;
//! canvas.add_page()?;
//!
//! session.save().await?;
//! ```

pub mod bridge;
pub mod collaborators;
pub mod component;
pub mod config;
pub mod document;
pub mod engine;
pub mod errors;
pub mod host;
pub mod pages;
pub mod persistence;
pub mod registry;
pub mod session;
pub mod snapshot;

pub use bridge::{SourceBridge, SourceView};
pub use collaborators::{
    BlueprintStore, Collaborators, EditorCallbacks, LabelLookup, LoadedBlueprint, Notifier,
    StoreError,
};
pub use component::{Component, Content, IdGenerator};
pub use config::EditorConfig;
pub use document::Blueprint;
pub use engine::{CanvasEngine, ContainerId, ContainerLocator, ContainerState, EngineError, EngineFactory};
pub use errors::{EditorError, EditorResult, MountError};
pub use host::{Canvas, CanvasHost, CanvasSlot, MountOutcome, MountRequest};
pub use pages::{Page, PageMode, PageStore};
pub use persistence::{RenderedPage, SavePayload};
pub use registry::{ComponentRegistry, ComponentTypeDef, InstallReport};
pub use session::{Diagnostic, EditorSession, EditorState, Stage};
pub use snapshot::ProjectSnapshot;
