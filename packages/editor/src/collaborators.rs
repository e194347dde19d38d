//! Services the surrounding application provides to the editor.

use crate::persistence::SavePayload;
use crate::snapshot::ProjectSnapshot;
use async_trait::async_trait;
use std::rc::Rc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Blueprint not found: {0}")]
    NotFound(String),

    #[error("Rejected by backend: {0}")]
    Rejected(String),

    #[error("Transport failure: {0}")]
    Transport(String),
}

/// A blueprint as the backend last stored it. `None` fields mean a brand-new
/// blueprint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedBlueprint {
    pub name: String,
    pub markup: Option<String>,
    pub snapshot: Option<ProjectSnapshot>,
}

#[async_trait(?Send)]
pub trait BlueprintStore {
    async fn load(&self, id: &str) -> Result<LoadedBlueprint, StoreError>;

    /// Create or update the record for `id`
    async fn save(&self, id: &str, payload: &SavePayload) -> Result<(), StoreError>;
}

pub trait EditorCallbacks {
    /// Called once per successful explicit save
    fn on_save(&self, markup: &str, snapshot: &ProjectSnapshot);

    fn on_cancel(&self);
}

/// Maps label keys to display text
pub trait LabelLookup {
    fn label(&self, key: &str) -> String;
}

/// Blocking user-facing notifications
pub trait Notifier {
    fn alert(&self, message: &str);
}

/// Callbacks that do nothing
#[derive(Debug, Default)]
pub struct NoopCallbacks;

impl EditorCallbacks for NoopCallbacks {
    fn on_save(&self, _markup: &str, _snapshot: &ProjectSnapshot) {}

    fn on_cancel(&self) {}
}

/// Returns the key itself
#[derive(Debug, Default)]
pub struct KeyLabels;

impl LabelLookup for KeyLabels {
    fn label(&self, key: &str) -> String {
        key.to_string()
    }
}

#[derive(Clone)]
pub struct Collaborators {
    pub store: Rc<dyn BlueprintStore>,
    pub callbacks: Rc<dyn EditorCallbacks>,
    pub labels: Rc<dyn LabelLookup>,
    pub notifier: Rc<dyn Notifier>,
}

impl Collaborators {
    pub fn new(store: Rc<dyn BlueprintStore>, notifier: Rc<dyn Notifier>) -> Self {
        Self {
            store,
            callbacks: Rc::new(NoopCallbacks),
            labels: Rc::new(KeyLabels),
            notifier,
        }
    }

    pub fn with_callbacks(mut self, callbacks: Rc<dyn EditorCallbacks>) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn with_labels(mut self, labels: Rc<dyn LabelLookup>) -> Self {
        self.labels = labels;
        self
    }
}
