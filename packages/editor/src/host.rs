//! # Canvas Host
//!
//! Brings a canvas engine up inside a container the enclosing UI renders on
//! its own schedule, and owns it until teardown.
//!
//! ## Mount
//!
//! ```text
//! poll container ──▶ init engine ──▶ install types ──▶ load content ──▶ pick page store
//!   (bounded)          (one retry        + palette         (snapshot or
//!                      if transient)     + command          markup)
//! ```
//!
//! Every failure comes back as a [`MountError`] value with the partial engine
//! already destroyed. The returned [`Canvas`] is owned by the caller, usually
//! through a [`CanvasSlot`]; dropping it destroys the engine.

use crate::bridge::{SourceBridge, SourceView};
use crate::component::Component;
use crate::config::EditorConfig;
use crate::engine::{CanvasEngine, ContainerId, ContainerLocator, ContainerState, EngineFactory};
use crate::errors::{EditorResult, MountError};
use crate::pages::{page_store_for, PageMode, PageStore};
use crate::persistence::{build_payload, render_pages, RenderedPage, SavePayload};
use crate::registry::ComponentRegistry;
use crate::snapshot::ProjectSnapshot;
use blueprint_markup::split_render_document;
use std::rc::Rc;
use std::time::Duration;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

/// Initial content for a mount
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MountRequest {
    /// Saved markup, either a render document or a bare fragment
    pub markup: Option<String>,
    pub snapshot: Option<ProjectSnapshot>,
    pub name: String,
}

pub struct CanvasHost<F: EngineFactory> {
    factory: F,
    registry: Rc<ComponentRegistry>,
    config: EditorConfig,
}

impl<F: EngineFactory> CanvasHost<F> {
    pub fn new(factory: F, config: EditorConfig) -> Self {
        let registry = ComponentRegistry::with_builtins(config.palette_deny_list.clone());
        Self::with_registry(factory, registry, config)
    }

    pub fn with_registry(factory: F, registry: ComponentRegistry, config: EditorConfig) -> Self {
        Self {
            factory,
            registry: Rc::new(registry),
            config,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    #[instrument(skip(self, locator, request), fields(name = %request.name))]
    pub async fn mount(
        &self,
        locator: &dyn ContainerLocator,
        request: &MountRequest,
    ) -> Result<Canvas, MountError> {
        let container = self.wait_for_container(locator).await?;
        let mut engine = self.init_engine(&container).await?;

        match self.prepare(engine.as_mut(), request) {
            Ok(pages) => {
                info!(container = %container.0, mode = ?pages.mode(), "Canvas mounted");
                Ok(Canvas {
                    engine,
                    pages,
                    bridge: SourceBridge::new(self.config.indent()),
                    registry: Rc::clone(&self.registry),
                })
            }
            Err(err) => {
                engine.destroy();
                Err(MountError::Setup(err))
            }
        }
    }

    /// Poll until the container is attached to a live document
    async fn wait_for_container(&self, locator: &dyn ContainerLocator) -> Result<ContainerId, MountError> {
        // A zero period panics in tokio
        let mut ticker = interval(self.config.poll_interval().max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        for attempt in 1..=self.config.max_poll_attempts {
            ticker.tick().await;
            match locator.locate() {
                ContainerState::Attached(container) => {
                    debug!(attempt, "Container attached");
                    return Ok(container);
                }
                state => debug!(attempt, ?state, "Container not ready"),
            }
        }

        Err(MountError::ContainerTimeout {
            attempts: self.config.max_poll_attempts,
        })
    }

    /// Initialize a fresh engine, retrying once on a transient failure
    async fn init_engine(&self, container: &ContainerId) -> Result<Box<dyn CanvasEngine>, MountError> {
        let mut engine = self.factory.create();
        match engine.init(container) {
            Ok(()) => return Ok(engine),
            Err(err) if err.is_transient() => {
                engine.destroy();
                debug!(error = %err, "Transient init failure, retrying once");
            }
            Err(err) => {
                engine.destroy();
                return Err(MountError::Init(err));
            }
        }

        sleep(self.config.transient_retry_delay()).await;

        let mut engine = self.factory.create();
        match engine.init(container) {
            Ok(()) => Ok(engine),
            Err(err) => {
                engine.destroy();
                Err(MountError::Init(err))
            }
        }
    }

    fn prepare(
        &self,
        engine: &mut dyn CanvasEngine,
        request: &MountRequest,
    ) -> EditorResult<Box<dyn PageStore>> {
        // Types first so markup recognizes custom kinds
        self.registry.install(engine);

        if let Some(snapshot) = &request.snapshot {
            engine.load_project_data(snapshot)?;
            debug!("Loaded project snapshot");
        } else if let Some(markup) = &request.markup {
            let (html, css) = split_render_document(markup);
            engine.set_components(&html)?;
            if !css.is_empty() {
                engine.set_style(&css)?;
            }
            debug!(html_len = html.len(), "Loaded initial markup");
        }
        engine.refresh();

        let command = &self.config.code_view_command;
        if !engine.has_command(command) {
            engine.add_command(command);
        }

        Ok(page_store_for(engine, request.snapshot.as_ref()))
    }
}

/// A mounted canvas. Dropping it destroys the engine.
pub struct Canvas {
    engine: Box<dyn CanvasEngine>,
    pages: Box<dyn PageStore>,
    bridge: SourceBridge,
    registry: Rc<ComponentRegistry>,
}

impl Canvas {
    /// Read-only view of the engine
    pub fn engine(&self) -> &dyn CanvasEngine {
        self.engine.as_ref()
    }

    pub fn page_mode(&self) -> PageMode {
        self.pages.mode()
    }

    pub fn pages(&mut self) -> Vec<String> {
        self.pages.list(self.engine.as_mut())
    }

    pub fn active_page(&mut self) -> Option<String> {
        self.pages.active(self.engine.as_mut())
    }

    pub fn add_page(&mut self) -> EditorResult<String> {
        self.pages.add(self.engine.as_mut())
    }

    pub fn select_page(&mut self, id: &str) -> EditorResult<()> {
        self.pages.select(self.engine.as_mut(), id)
    }

    pub fn delete_page(&mut self, id: &str) -> EditorResult<()> {
        self.pages.delete(self.engine.as_mut(), id)
    }

    pub fn move_page_up(&mut self, id: &str) -> EditorResult<()> {
        self.pages.move_up(self.engine.as_mut(), id)
    }

    pub fn move_page_down(&mut self, id: &str) -> EditorResult<()> {
        self.pages.move_down(self.engine.as_mut(), id)
    }

    /// Place a new instance of a registered type on the active page
    pub fn insert_component(&mut self, kind: &str) -> EditorResult<String> {
        let component = self.registry.instantiate(kind)?;
        let id = self.engine.append_component(component);
        debug!(kind, id = %id, "Inserted component");
        Ok(id)
    }

    pub fn components(&self) -> Vec<Component> {
        self.engine.components()
    }

    pub fn open_code_view(&self) -> EditorResult<SourceView> {
        self.bridge.extract(self.engine.as_ref())
    }

    pub fn apply_code_view(&mut self, view: &SourceView) -> EditorResult<()> {
        self.bridge.apply(self.engine.as_mut(), view)
    }

    pub fn render_pages(&mut self) -> EditorResult<Vec<RenderedPage>> {
        render_pages(self.pages.as_mut(), self.engine.as_mut())
    }

    pub fn export(&mut self) -> EditorResult<SavePayload> {
        build_payload(self.pages.as_mut(), self.engine.as_mut())
    }
}

impl Drop for Canvas {
    fn drop(&mut self) {
        self.engine.destroy();
        info!("Canvas destroyed");
    }
}

#[derive(Debug)]
pub enum MountOutcome {
    Mounted,
    /// A canvas was already live; nothing changed
    AlreadyMounted,
    Failed(MountError),
}

/// Owner of at most one live canvas
#[derive(Default)]
pub struct CanvasSlot {
    canvas: Option<Canvas>,
}

impl CanvasSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_mounted(&self) -> bool {
        self.canvas.is_some()
    }

    pub fn get(&self) -> Option<&Canvas> {
        self.canvas.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut Canvas> {
        self.canvas.as_mut()
    }

    pub async fn mount<F: EngineFactory>(
        &mut self,
        host: &CanvasHost<F>,
        locator: &dyn ContainerLocator,
        request: &MountRequest,
    ) -> MountOutcome {
        if self.canvas.is_some() {
            debug!("Canvas already mounted");
            return MountOutcome::AlreadyMounted;
        }

        match host.mount(locator, request).await {
            Ok(canvas) => {
                self.canvas = Some(canvas);
                MountOutcome::Mounted
            }
            Err(err) => {
                warn!(error = %err, "Canvas mount failed");
                MountOutcome::Failed(err)
            }
        }
    }

    /// Tear down any live canvas, then mount a fresh one
    pub async fn remount<F: EngineFactory>(
        &mut self,
        host: &CanvasHost<F>,
        locator: &dyn ContainerLocator,
        request: &MountRequest,
    ) -> MountOutcome {
        self.unmount();
        self.mount(host, locator, request).await
    }

    /// Destroy the live canvas, if any. Returns whether one was live.
    pub fn unmount(&mut self) -> bool {
        self.canvas.take().is_some()
    }
}
