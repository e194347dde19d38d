//! Shared fixtures for editor integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use blueprint_editor::engine::memory::MemoryEngineFactory;
use blueprint_editor::{
    BlueprintStore, CanvasHost, Collaborators, ContainerId, ContainerLocator, ContainerState,
    EditorCallbacks, EditorConfig, EditorSession, LabelLookup, LoadedBlueprint, Notifier,
    ProjectSnapshot, SavePayload, StoreError,
};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

pub const APPLY_FAILED_TEXT: &str = "Your changes could not be applied.";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("blueprint_editor=debug")),
        )
        .with_test_writer()
        .try_init();
}

pub fn attached() -> ContainerState {
    ContainerState::Attached(ContainerId("blueprint-canvas".to_string()))
}

/// Reports scripted container states, then `rest` forever
pub struct ScriptedLocator {
    script: RefCell<VecDeque<ContainerState>>,
    rest: ContainerState,
    polls: Cell<u32>,
}

impl ScriptedLocator {
    pub fn new(script: impl IntoIterator<Item = ContainerState>, rest: ContainerState) -> Self {
        Self {
            script: RefCell::new(script.into_iter().collect()),
            rest,
            polls: Cell::new(0),
        }
    }

    /// Missing for `polls` polls, detached once, then attached
    pub fn attached_after(polls: usize) -> Self {
        let mut script = vec![ContainerState::Missing; polls];
        script.push(ContainerState::Detached);
        Self::new(script, attached())
    }

    pub fn never_attached() -> Self {
        Self::new([], ContainerState::Missing)
    }

    pub fn polls(&self) -> u32 {
        self.polls.get()
    }
}

impl ContainerLocator for ScriptedLocator {
    fn locate(&self) -> ContainerState {
        self.polls.set(self.polls.get() + 1);
        self.script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| self.rest.clone())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    records: RefCell<HashMap<String, LoadedBlueprint>>,
    saves: RefCell<Vec<(String, SavePayload)>>,
    save_failures: RefCell<VecDeque<StoreError>>,
}

impl MemoryStore {
    pub fn with_new(id: &str, name: &str) -> Self {
        let store = Self::default();
        store.records.borrow_mut().insert(
            id.to_string(),
            LoadedBlueprint {
                name: name.to_string(),
                ..LoadedBlueprint::default()
            },
        );
        store
    }

    pub fn fail_next_save(&self, err: StoreError) {
        self.save_failures.borrow_mut().push_back(err);
    }

    pub fn saves(&self) -> Vec<(String, SavePayload)> {
        self.saves.borrow().clone()
    }

    pub fn record(&self, id: &str) -> Option<LoadedBlueprint> {
        self.records.borrow().get(id).cloned()
    }
}

#[async_trait(?Send)]
impl BlueprintStore for MemoryStore {
    async fn load(&self, id: &str) -> Result<LoadedBlueprint, StoreError> {
        tokio::task::yield_now().await;
        self.record(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn save(&self, id: &str, payload: &SavePayload) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        if let Some(err) = self.save_failures.borrow_mut().pop_front() {
            return Err(err);
        }

        let name = self.record(id).map(|r| r.name).unwrap_or_default();
        self.records.borrow_mut().insert(
            id.to_string(),
            LoadedBlueprint {
                name,
                markup: Some(payload.markup.clone()),
                snapshot: Some(payload.snapshot.clone()),
            },
        );
        self.saves.borrow_mut().push((id.to_string(), payload.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingCallbacks {
    pub saved: RefCell<Vec<(String, ProjectSnapshot)>>,
    pub cancelled: Cell<u32>,
}

impl EditorCallbacks for RecordingCallbacks {
    fn on_save(&self, markup: &str, snapshot: &ProjectSnapshot) {
        self.saved
            .borrow_mut()
            .push((markup.to_string(), snapshot.clone()));
    }

    fn on_cancel(&self) {
        self.cancelled.set(self.cancelled.get() + 1);
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub alerts: RefCell<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        self.alerts.borrow_mut().push(message.to_string());
    }
}

pub struct FixedLabels;

impl LabelLookup for FixedLabels {
    fn label(&self, key: &str) -> String {
        match key {
            "editor.apply_failed" => APPLY_FAILED_TEXT.to_string(),
            other => other.to_string(),
        }
    }
}

/// Everything a test needs to look at after driving a session
pub struct Harness {
    pub store: Rc<MemoryStore>,
    pub callbacks: Rc<RecordingCallbacks>,
    pub notifier: Rc<RecordingNotifier>,
}

impl Harness {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store: Rc::new(store),
            callbacks: Rc::new(RecordingCallbacks::default()),
            notifier: Rc::new(RecordingNotifier::default()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new(self.store.clone(), self.notifier.clone())
            .with_callbacks(self.callbacks.clone())
            .with_labels(Rc::new(FixedLabels))
    }

    pub fn session(
        &self,
        id: &str,
        factory: MemoryEngineFactory,
    ) -> EditorSession<MemoryEngineFactory> {
        let host = CanvasHost::new(factory, EditorConfig::default());
        EditorSession::new(id, host, self.collaborators())
    }
}

pub fn factory(native_pages: bool) -> MemoryEngineFactory {
    if native_pages {
        MemoryEngineFactory::with_native_pages()
    } else {
        MemoryEngineFactory::new()
    }
}
