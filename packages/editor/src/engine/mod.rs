//! # Canvas Engine Seam
//!
//! The live editing surface is an external engine. Everything the editor needs
//! from it is expressed by [`CanvasEngine`]; native multi-page support is an
//! optional capability exposed through [`CanvasEngine::pages`].
//!
//! [`memory::MemoryEngine`] is a headless implementation used for server-side
//! rendering and tests.

pub mod memory;

use crate::component::Component;
use crate::registry::ComponentTypeDef;
use crate::snapshot::ProjectSnapshot;
use blueprint_markup::ParseError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The container's internal frame is not ready yet. Worth one retry.
    #[error("Canvas frame is not ready")]
    FrameNotReady,

    #[error("Invalid markup: {0}")]
    Markup(#[from] ParseError),

    #[error("Invalid stylesheet: {0}")]
    Style(String),

    #[error("Invalid project data: {0}")]
    Project(String),

    #[error("Unknown page: {0}")]
    UnknownPage(String),

    #[error("Engine failure: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::FrameNotReady)
    }
}

/// Identity of the element the canvas mounts into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerId(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerState {
    /// Not rendered by the enclosing UI yet
    Missing,
    /// Rendered but not attached to a live document
    Detached,
    Attached(ContainerId),
}

/// Where the host looks for its container while mounting
pub trait ContainerLocator {
    fn locate(&self) -> ContainerState;
}

impl ContainerLocator for ContainerState {
    fn locate(&self) -> ContainerState {
        self.clone()
    }
}

/// A live visual editing surface
pub trait CanvasEngine {
    fn init(&mut self, container: &ContainerId) -> Result<(), EngineError>;

    /// Release the surface. Must be safe to call more than once.
    fn destroy(&mut self);

    fn is_alive(&self) -> bool;

    // Component types and palette
    fn has_component_type(&self, name: &str) -> bool;
    fn add_component_type(&mut self, def: &ComponentTypeDef);
    fn block_ids(&self) -> Vec<String>;
    fn add_block(&mut self, id: &str, label: &str, kind: &str);
    fn remove_block(&mut self, id: &str) -> bool;

    // Commands
    fn has_command(&self, id: &str) -> bool;
    fn add_command(&mut self, id: &str);

    // Current page content
    fn html(&self) -> String;
    fn css(&self) -> String;
    fn set_components(&mut self, html: &str) -> Result<(), EngineError>;
    fn set_style(&mut self, css: &str) -> Result<(), EngineError>;
    /// Rebuild internal model state after content was replaced wholesale
    fn refresh(&mut self);
    fn components(&self) -> Vec<Component>;
    /// Append an instance to the current page, assigning an id if it has none
    fn append_component(&mut self, component: Component) -> String;
    /// Account for the instance ids in markup held outside the engine, so
    /// instances created later never reuse them
    fn reserve_ids(&mut self, html: &str) -> Result<(), EngineError>;

    // Whole-project state
    fn project_data(&self) -> ProjectSnapshot;
    fn load_project_data(&mut self, snapshot: &ProjectSnapshot) -> Result<(), EngineError>;

    /// Native multi-page support, if the engine has it
    fn pages(&mut self) -> Option<&mut dyn EnginePages>;
}

/// Native page management of an engine
pub trait EnginePages {
    fn ids(&self) -> Vec<String>;
    fn active(&self) -> Option<String>;
    fn add(&mut self, id: &str);
    fn select(&mut self, id: &str) -> Result<(), EngineError>;
    fn remove(&mut self, id: &str) -> bool;
    fn move_to(&mut self, id: &str, index: usize) -> Result<(), EngineError>;
}

/// Creates a fresh engine for every mount attempt
pub trait EngineFactory {
    fn create(&self) -> Box<dyn CanvasEngine>;
}
