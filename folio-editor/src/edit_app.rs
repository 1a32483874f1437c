//! The edit-mode shell
//!
//! [`EditApp`] owns the live notebook and wires the save coordinator, title
//! manager, unload guard, presentation toggle, hotkeys and autosave together.

use crate::autosave::{AutosaveScheduler, AutosaveTarget};
use crate::connection::ConnectionStatus;
use crate::filename::FilenameRegistry;
use crate::hotkeys::{HotkeyAction, HotkeyMap};
use crate::host::{HostServices, UrlParams, FILE_PARAM};
use crate::notebook::{Cell, CellConfig, CellId, Notebook, SharedNotebook};
use crate::presentation::{PresentationToggle, ViewState, VisibleRegions};
use crate::save_coordinator::{SaveCoordinator, SaveOutcome};
use crate::title::TitleManager;
use crate::transport::NotebookTransport;
use crate::unload_guard::{UnloadDecision, UnloadGuard};
use crate::{EditorError, EditorResult};
use folio_core::{Config, ConnectionState, EditorEvent, EventBus, SessionSummary};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Edit session over one notebook
pub struct EditApp {
    config: Config,
    notebook: SharedNotebook,
    connection: ConnectionStatus,
    filename: FilenameRegistry,
    coordinator: Arc<SaveCoordinator>,
    title: Arc<TitleManager>,
    unload_guard: UnloadGuard,
    presentation: RwLock<PresentationToggle>,
    hotkeys: HotkeyMap,
    transport: Arc<dyn NotebookTransport>,
    url_params: Arc<dyn UrlParams>,
    event_bus: Arc<dyn EventBus>,
    autosave: Mutex<Option<AutosaveScheduler>>,
}

impl EditApp {
    /// Start a new, unnamed and empty notebook
    pub async fn new(config: Config, services: HostServices, event_bus: Arc<dyn EventBus>) -> Self {
        Self::open(config, services, event_bus, None, Notebook::new()).await
    }

    /// Start a session over `notebook`
    ///
    /// A named notebook is treated as loaded from the backend, so it starts
    /// clean. An unnamed one has no baseline and is dirty as soon as it has
    /// cells.
    pub async fn open(
        config: Config,
        services: HostServices,
        event_bus: Arc<dyn EventBus>,
        filename: Option<String>,
        notebook: Notebook,
    ) -> Self {
        let notebook = SharedNotebook::new(notebook);
        let connection = ConnectionStatus::default();
        let registry = FilenameRegistry::new(filename.clone());
        let title = Arc::new(TitleManager::new(
            services.title_sink.clone(),
            config.app.app_title.clone(),
        ));
        let coordinator = Arc::new(SaveCoordinator::new(
            notebook.clone(),
            connection.clone(),
            registry.clone(),
            &services,
            title.clone(),
            event_bus.clone(),
            config.autosave.format_on_save,
        ));

        match &filename {
            Some(name) => {
                coordinator.mark_loaded(&notebook.snapshot().await).await;
                services.url_params.set(FILE_PARAM, name);
            }
            None => services.url_params.delete(FILE_PARAM),
        }
        title.refresh(filename.as_deref()).await;

        tracing::info!(
            "Opened {} ({} cells)",
            filename.as_deref().unwrap_or("unnamed notebook"),
            notebook.len().await
        );

        Self {
            unload_guard: UnloadGuard::new(config.app.static_mode),
            config,
            notebook,
            connection,
            filename: registry,
            coordinator,
            title,
            presentation: RwLock::new(PresentationToggle::new()),
            hotkeys: HotkeyMap::default(),
            transport: services.transport,
            url_params: services.url_params,
            event_bus,
            autosave: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn notebook(&self) -> &SharedNotebook {
        &self.notebook
    }

    pub fn connection(&self) -> &ConnectionStatus {
        &self.connection
    }

    pub fn coordinator(&self) -> &Arc<SaveCoordinator> {
        &self.coordinator
    }

    pub async fn filename(&self) -> Option<String> {
        self.filename.get().await
    }

    pub async fn title(&self) -> String {
        self.title.current().await
    }

    /// Record a connection state reported by the transport
    pub async fn set_connection_state(&self, state: ConnectionState) {
        if self.connection.set(state) {
            self.publish(EditorEvent::connection_changed(state)).await;
        }
    }

    // Cell edits

    pub async fn add_cell(&self, code: &str, name: Option<&str>) -> CellId {
        let mut cell = Cell::new(code);
        if let Some(name) = name {
            cell = cell.named(name);
        }
        self.insert_cell(cell).await
    }

    /// Append a prepared cell, keeping its id
    pub async fn insert_cell(&self, cell: Cell) -> CellId {
        let id = self.notebook.edit(|nb| nb.push(cell)).await;
        tracing::debug!("Added cell {}", id);
        id
    }

    pub async fn update_cell_code(&self, id: &CellId, code: &str) -> EditorResult<()> {
        self.notebook
            .edit(|nb| nb.update_code(id, code.to_string()))
            .await
    }

    pub async fn rename_cell(&self, id: &CellId, name: &str) -> EditorResult<()> {
        self.notebook
            .edit(|nb| nb.rename_cell(id, name.to_string()))
            .await
    }

    pub async fn set_cell_config(&self, id: &CellId, config: CellConfig) -> EditorResult<()> {
        self.notebook.edit(|nb| nb.set_config(id, config)).await
    }

    pub async fn delete_cell(&self, id: &CellId) -> EditorResult<Cell> {
        let removed = self.notebook.edit(|nb| nb.remove(id)).await?;
        tracing::debug!("Deleted cell {}", id);
        Ok(removed)
    }

    pub async fn set_layout(&self, layout: Option<serde_json::Value>) {
        self.notebook.edit(|nb| nb.set_layout(layout)).await;
    }

    // Saving and naming

    pub async fn needs_save(&self) -> bool {
        self.coordinator.needs_save().await
    }

    /// Manual save; prompts for a name when the notebook is unnamed
    pub async fn save(&self) -> EditorResult<SaveOutcome> {
        self.coordinator.save_or_name_notebook().await
    }

    pub async fn rename(&self, name: Option<String>) -> EditorResult<Option<String>> {
        self.coordinator.handle_filename_change(name).await
    }

    pub async fn format_all(&self) -> EditorResult<usize> {
        self.coordinator.format_all().await
    }

    /// Replace the app title and recompute the document title
    pub async fn set_app_title(&self, app_title: &str) -> String {
        let filename = self.filename.get().await;
        let title = self
            .title
            .set_app_title(app_title.to_string(), filename.as_deref())
            .await;
        self.publish(EditorEvent::title_changed(title.clone())).await;
        title
    }

    // View

    pub async fn toggle_presentation(&self, regions: &dyn VisibleRegions) -> ViewState {
        let state = self.presentation.write().await.toggle(regions);
        self.publish(EditorEvent::view_mode_changed(
            state.mode,
            state.cell_anchor.as_ref().map(|id| id.to_string()),
        ))
        .await;
        state
    }

    /// Scroll back to the anchor once the new mode is on screen
    pub async fn presentation_rendered(&self, regions: &dyn VisibleRegions) -> bool {
        self.presentation.read().await.on_rendered(regions)
    }

    pub async fn view_state(&self) -> ViewState {
        self.presentation.read().await.state().clone()
    }

    pub async fn before_unload(&self) -> UnloadDecision {
        self.unload_guard
            .on_before_unload(self.needs_save().await)
    }

    /// Ask the backend to interrupt running cells
    pub async fn interrupt(&self) {
        if let Err(e) = self.transport.send_interrupt().await {
            tracing::warn!("Interrupt failed: {}", e);
        }
    }

    /// Run the action bound to `chord`; returns the action, if any
    pub async fn handle_hotkey(
        &self,
        chord: &str,
        regions: &dyn VisibleRegions,
    ) -> EditorResult<Option<HotkeyAction>> {
        let Some(action) = self.hotkeys.resolve(chord)? else {
            tracing::trace!("No action bound to {}", chord);
            return Ok(None);
        };

        tracing::debug!("Hotkey {} -> {:?}", chord, action);
        match action {
            HotkeyAction::Save => match self.save().await {
                Ok(_) | Err(EditorError::NotConnected) => {}
                Err(e) => return Err(e),
            },
            HotkeyAction::Interrupt => self.interrupt().await,
            HotkeyAction::TogglePresentation => {
                self.toggle_presentation(regions).await;
                self.presentation_rendered(regions).await;
            }
            HotkeyAction::FormatAll => {
                self.format_all().await?;
            }
        }
        Ok(Some(action))
    }

    // Lifecycle

    /// Spawn the autosave task, replacing any running one
    pub async fn start_autosave(&self) {
        let target: Arc<dyn AutosaveTarget> = self.coordinator.clone();
        let scheduler = AutosaveScheduler::spawn(
            target,
            &self.config.autosave,
            self.notebook.subscribe(),
            self.connection.subscribe(),
        );

        let previous = self.autosave.lock().await.replace(scheduler);
        if let Some(mut previous) = previous {
            previous.shutdown().await;
        }
    }

    pub async fn autosave_running(&self) -> bool {
        self.autosave
            .lock()
            .await
            .as_ref()
            .map(AutosaveScheduler::is_running)
            .unwrap_or(false)
    }

    /// Stop background work; the notebook is left as is
    pub async fn close(&self) {
        let scheduler = self.autosave.lock().await.take();
        if let Some(mut scheduler) = scheduler {
            scheduler.shutdown().await;
        }
        tracing::info!("Edit session closed");
    }

    pub async fn summary(&self) -> SessionSummary {
        SessionSummary {
            filename: self.filename.get().await,
            title: self.title.current().await,
            connection: self.connection.current(),
            view_mode: self.presentation.read().await.mode(),
            cell_count: self.notebook.len().await,
            needs_save: self.needs_save().await,
        }
    }

    /// `file` URL parameter as the host currently shows it
    pub fn url_filename(&self) -> Option<String> {
        self.url_params.get(FILE_PARAM)
    }

    async fn publish(&self, event: EditorEvent) {
        if let Err(e) = self.event_bus.publish(event).await {
            tracing::warn!("Failed to publish editor event: {}", e);
        }
    }
}
