//! Save coordination: manual save, named vs. unnamed save, rename-then-save
//!
//! Every save goes through [`SaveCoordinator::save_notebook`], which refuses to
//! send anything for an empty notebook or while the connection is not open.
//! The baseline used for dirty tracking is replaced only after the backend
//! confirms a save, with exactly the snapshot that was sent.

use crate::autosave::AutosaveTarget;
use crate::connection::ConnectionStatus;
use crate::dirty_tracker::needs_save;
use crate::filename::FilenameRegistry;
use crate::host::{HostServices, NamePrompt, Notifier, UrlParams, FILE_PARAM};
use crate::notebook::{CellId, SharedNotebook};
use crate::snapshot::{NotebookSnapshot, SavedNotebook};
use crate::title::TitleManager;
use crate::transport::{NotebookTransport, SaveRequest};
use crate::{backend_message, EditorError, EditorResult};
use async_trait::async_trait;
use folio_core::{EditorEvent, EventBus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Alert shown when a save or rename is attempted without a live connection
pub const NOT_CONNECTED_MESSAGE: &str = "Failed to save notebook: not connected to a kernel.";

/// Toast shown after a user-initiated save
pub const SAVED_TOAST: &str = "Notebook saved";

/// What a save entry point did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveOutcome {
    /// The backend confirmed the save
    Saved,
    /// Nothing was sent
    Skipped(SkipReason),
}

/// Why no save request was sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Zero cells; never persisted over a possibly real file
    EmptyNotebook,
    NotConnected,
    /// No filename yet
    Unnamed,
}

/// Orchestrates saves and renames against the backend
pub struct SaveCoordinator {
    notebook: SharedNotebook,
    connection: ConnectionStatus,
    filename: FilenameRegistry,
    last_saved: Arc<RwLock<Option<SavedNotebook>>>,
    transport: Arc<dyn NotebookTransport>,
    notifier: Arc<dyn Notifier>,
    name_prompt: Arc<dyn NamePrompt>,
    url_params: Arc<dyn UrlParams>,
    title: Arc<TitleManager>,
    event_bus: Arc<dyn EventBus>,
    format_on_save: bool,
}

impl SaveCoordinator {
    pub fn new(
        notebook: SharedNotebook,
        connection: ConnectionStatus,
        filename: FilenameRegistry,
        services: &HostServices,
        title: Arc<TitleManager>,
        event_bus: Arc<dyn EventBus>,
        format_on_save: bool,
    ) -> Self {
        Self {
            notebook,
            connection,
            filename,
            last_saved: Arc::new(RwLock::new(None)),
            transport: services.transport.clone(),
            notifier: services.notifier.clone(),
            name_prompt: services.name_prompt.clone(),
            url_params: services.url_params.clone(),
            title,
            event_bus,
            format_on_save,
        }
    }

    /// Whether the live notebook differs from the last confirmed save
    pub async fn needs_save(&self) -> bool {
        let snapshot = self.notebook.snapshot().await;
        let last_saved = self.last_saved.read().await;
        needs_save(&snapshot, last_saved.as_ref())
    }

    pub async fn last_saved(&self) -> Option<SavedNotebook> {
        self.last_saved.read().await.clone()
    }

    /// Adopt `snapshot` as the baseline of a notebook loaded from the backend
    pub async fn mark_loaded(&self, snapshot: &NotebookSnapshot) {
        *self.last_saved.write().await = Some(snapshot.to_saved());
        tracing::debug!("Baseline set from loaded notebook ({} cells)", snapshot.len());
    }

    /// Save the live notebook under `filename`
    ///
    /// Zero cells is a silent skip. A connection that is not open is refused
    /// without contacting the backend; the user is alerted only when the save
    /// was user initiated. A backend refusal leaves the baseline untouched and
    /// is returned to the caller without an alert.
    pub async fn save_notebook(
        &self,
        filename: &str,
        user_initiated: bool,
    ) -> EditorResult<SaveOutcome> {
        let snapshot = self.notebook.snapshot().await;
        if snapshot.is_empty() {
            tracing::debug!("Skipping save of {}: notebook has no cells", filename);
            return Ok(SaveOutcome::Skipped(SkipReason::EmptyNotebook));
        }

        if !self.connection.is_open() {
            tracing::debug!(
                "Refusing to save {}: connection is {}",
                filename,
                self.connection.current()
            );
            if user_initiated {
                self.alert(NOT_CONNECTED_MESSAGE).await;
            }
            return Err(EditorError::NotConnected);
        }

        let request = SaveRequest::new(filename, &snapshot);
        if let Err(e) = self.transport.send_save(request).await {
            let message = backend_message(&e);
            tracing::warn!("Save of {} rejected: {}", filename, message);
            return Err(EditorError::SaveRejected(message));
        }

        // Overlapping saves are not serialized; the last confirmation wins.
        *self.last_saved.write().await = Some(snapshot.to_saved());
        tracing::info!(
            "Saved {} ({} cells, user_initiated={})",
            filename,
            snapshot.len(),
            user_initiated
        );
        self.publish(EditorEvent::notebook_saved(
            filename.to_string(),
            snapshot.len(),
            user_initiated,
        ))
        .await;

        if user_initiated {
            self.toast(SAVED_TOAST).await;
            if self.format_on_save {
                if let Err(e) = self.format_all().await {
                    tracing::warn!("Format after save failed: {}", e);
                }
            }
        }

        Ok(SaveOutcome::Saved)
    }

    /// Save only when the notebook has a name and the connection is open
    ///
    /// Used by both the manual save of a named notebook and autosave.
    pub async fn save_if_named(&self, user_initiated: bool) -> EditorResult<SaveOutcome> {
        let Some(filename) = self.filename.get().await else {
            return Ok(SaveOutcome::Skipped(SkipReason::Unnamed));
        };
        if !self.connection.is_open() {
            return Ok(SaveOutcome::Skipped(SkipReason::NotConnected));
        }
        self.save_notebook(&filename, user_initiated).await
    }

    /// Manual save: save if named, otherwise ask for a name
    ///
    /// The name prompt opens only for an unnamed notebook whose connection is
    /// not closed. A non-blank answer is renamed first and saved only once the
    /// rename has been confirmed.
    pub async fn save_or_name_notebook(&self) -> EditorResult<SaveOutcome> {
        let filename = self.filename.get().await;
        let connection = self.connection.current();

        let outcome = self.save_if_named(true).await?;
        if filename.is_some() || connection.is_closed() {
            return Ok(outcome);
        }

        let Some(answer) = self.name_prompt.prompt_for_name().await else {
            tracing::debug!("Name prompt dismissed");
            return Ok(outcome);
        };
        let name = answer.trim();
        if name.is_empty() {
            tracing::debug!("Name prompt submitted a blank name");
            return Ok(outcome);
        }

        self.name_and_save(name).await
    }

    /// Rename to `name`, then save under it once the rename is confirmed
    pub async fn name_and_save(&self, name: &str) -> EditorResult<SaveOutcome> {
        match self.handle_filename_change(Some(name.to_string())).await? {
            Some(filename) => self.save_notebook(&filename, true).await,
            None => Ok(SaveOutcome::Skipped(SkipReason::Unnamed)),
        }
    }

    /// Rename the notebook; `None` makes it unnamed
    ///
    /// On success the filename, document title and `file` URL parameter are
    /// updated together. On failure the user is alerted and nothing changes.
    pub async fn handle_filename_change(
        &self,
        name: Option<String>,
    ) -> EditorResult<Option<String>> {
        if !self.connection.is_open() {
            self.alert(NOT_CONNECTED_MESSAGE).await;
            return Err(EditorError::NotConnected);
        }

        if let Err(e) = self.transport.send_rename(name.clone()).await {
            let message = backend_message(&e);
            tracing::warn!("Rename to {:?} rejected: {}", name, message);
            self.alert(&message).await;
            return Err(EditorError::RenameRejected(message));
        }

        self.filename.set(name.clone()).await;
        let title = self.title.refresh(name.as_deref()).await;
        match &name {
            Some(filename) => self.url_params.set(FILE_PARAM, filename),
            None => self.url_params.delete(FILE_PARAM),
        }

        tracing::info!("Notebook renamed to {:?}", name);
        self.publish(EditorEvent::filename_changed(name.clone()))
            .await;
        self.publish(EditorEvent::title_changed(title)).await;
        Ok(name)
    }

    /// Reformat every cell through the backend formatter
    ///
    /// Returns the number of cells whose code changed. Cells deleted while the
    /// request was in flight are skipped.
    pub async fn format_all(&self) -> EditorResult<usize> {
        let codes: HashMap<CellId, String> = self
            .notebook
            .read(|nb| {
                nb.cells()
                    .iter()
                    .map(|c| (c.id.clone(), c.code.clone()))
                    .collect()
            })
            .await;
        if codes.is_empty() {
            return Ok(0);
        }

        let formatted = self
            .transport
            .send_format(codes)
            .await
            .map_err(|e| EditorError::FormatFailed(backend_message(&e)))?;

        let updated = self
            .notebook
            .edit(|nb| {
                let mut updated = 0;
                for (id, code) in formatted {
                    let unchanged = match nb.cell(&id) {
                        Some(cell) => cell.code == code,
                        None => {
                            tracing::trace!("Formatted cell {} no longer exists", id);
                            continue;
                        }
                    };
                    if !unchanged && nb.update_code(&id, code).is_ok() {
                        updated += 1;
                    }
                }
                updated
            })
            .await;

        tracing::debug!("Formatted {} cells", updated);
        Ok(updated)
    }

    /// Show a blocking alert and record it on the event bus
    pub async fn alert(&self, message: &str) {
        self.notifier.show_alert(message);
        self.publish(EditorEvent::alert(message.to_string())).await;
    }

    async fn toast(&self, title: &str) {
        self.notifier.show_toast(title);
        self.publish(EditorEvent::toast(title.to_string())).await;
    }

    async fn publish(&self, event: EditorEvent) {
        if let Err(e) = self.event_bus.publish(event).await {
            tracing::warn!("Failed to publish editor event: {}", e);
        }
    }
}

#[async_trait]
impl AutosaveTarget for SaveCoordinator {
    async fn needs_save(&self) -> bool {
        SaveCoordinator::needs_save(self).await
    }

    async fn autosave(&self) -> EditorResult<SaveOutcome> {
        self.save_if_named(false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notebook::{Cell, Notebook};
    use crate::test_support::{Fakes, GatedTransport, TransportCall};
    use crate::title::DEFAULT_TITLE;
    use folio_core::{ConnectionState, InMemoryEventBus};

    struct Harness {
        fakes: Fakes,
        notebook: SharedNotebook,
        connection: ConnectionStatus,
        filename: FilenameRegistry,
        coordinator: SaveCoordinator,
    }

    fn harness(cells: Vec<Cell>, filename: Option<&str>, state: ConnectionState) -> Harness {
        harness_with_format(cells, filename, state, false)
    }

    fn harness_with_format(
        cells: Vec<Cell>,
        filename: Option<&str>,
        state: ConnectionState,
        format_on_save: bool,
    ) -> Harness {
        let fakes = Fakes::new();
        let notebook = SharedNotebook::new(Notebook::from_cells(cells, None));
        let connection = ConnectionStatus::new(state);
        let filename = FilenameRegistry::new(filename.map(str::to_string));
        let title = Arc::new(TitleManager::new(fakes.title_sink.clone(), String::new()));
        let coordinator = SaveCoordinator::new(
            notebook.clone(),
            connection.clone(),
            filename.clone(),
            &fakes.services(),
            title,
            Arc::new(InMemoryEventBus::new()),
            format_on_save,
        );
        Harness {
            fakes,
            notebook,
            connection,
            filename,
            coordinator,
        }
    }

    fn two_cells() -> Vec<Cell> {
        vec![
            Cell::with_id("a".into(), "import math"),
            Cell::with_id("b".into(), "math.pi"),
        ]
    }

    #[tokio::test]
    async fn test_save_while_closed_never_reaches_transport() {
        let h = harness(two_cells(), Some("nb.py"), ConnectionState::Closed);

        let result = h.coordinator.save_notebook("nb.py", false).await;
        assert!(matches!(result, Err(EditorError::NotConnected)));
        assert!(h.fakes.transport.calls().is_empty());
        assert!(h.coordinator.last_saved().await.is_none());
        // autosave-style calls stay silent
        assert!(h.fakes.notifier.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_user_save_while_disconnected_alerts() {
        let h = harness(two_cells(), Some("nb.py"), ConnectionState::Connecting);

        let result = h.coordinator.save_notebook("nb.py", true).await;
        assert!(matches!(result, Err(EditorError::NotConnected)));
        assert_eq!(h.fakes.notifier.alerts(), vec![NOT_CONNECTED_MESSAGE]);
        assert!(h.fakes.transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_notebook_is_never_saved() {
        for state in [
            ConnectionState::Open,
            ConnectionState::Connecting,
            ConnectionState::Closed,
        ] {
            let h = harness(Vec::new(), Some("nb.py"), state);
            let outcome = h.coordinator.save_notebook("nb.py", true).await.unwrap();
            assert_eq!(outcome, SaveOutcome::Skipped(SkipReason::EmptyNotebook));
            assert!(h.fakes.transport.calls().is_empty());
            assert!(h.fakes.notifier.alerts().is_empty());
        }
    }

    #[tokio::test]
    async fn test_successful_save_updates_baseline_to_sent_snapshot() {
        let h = harness(two_cells(), Some("nb.py"), ConnectionState::Open);
        assert!(h.coordinator.needs_save().await);

        let outcome = h.coordinator.save_notebook("nb.py", false).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Saved);

        let saves = h.fakes.transport.saves();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].filename, "nb.py");
        assert_eq!(saves[0].codes, vec!["import math", "math.pi"]);

        let sent = h.notebook.snapshot().await;
        let baseline = h.coordinator.last_saved().await.unwrap();
        assert!(!needs_save(&sent, Some(&baseline)));
        assert!(!h.coordinator.needs_save().await);

        // autosave saves show no toast
        assert!(h.fakes.notifier.toasts().is_empty());
    }

    #[tokio::test]
    async fn test_user_save_shows_toast() {
        let h = harness(two_cells(), Some("nb.py"), ConnectionState::Open);
        h.coordinator.save_notebook("nb.py", true).await.unwrap();
        assert_eq!(h.fakes.notifier.toasts(), vec![SAVED_TOAST]);
    }

    #[tokio::test]
    async fn test_rejected_save_keeps_baseline() {
        let h = harness(two_cells(), Some("nb.py"), ConnectionState::Open);
        h.fakes.transport.reject_saves("disk full");

        let result = h.coordinator.save_notebook("nb.py", true).await;
        assert!(matches!(result, Err(EditorError::SaveRejected(ref m)) if m == "disk full"));
        assert!(h.coordinator.last_saved().await.is_none());
        assert!(h.fakes.notifier.toasts().is_empty());
        assert!(h.fakes.notifier.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_format_on_save_only_for_user_saves() {
        let h = harness_with_format(two_cells(), Some("nb.py"), ConnectionState::Open, true);
        h.fakes.transport.format_by_appending("\n");

        h.coordinator.save_notebook("nb.py", false).await.unwrap();
        assert!(!h
            .fakes
            .transport
            .calls()
            .iter()
            .any(|c| matches!(c, TransportCall::Format(_))));

        h.coordinator.save_notebook("nb.py", true).await.unwrap();
        assert!(h
            .fakes
            .transport
            .calls()
            .contains(&TransportCall::Format(2)));

        let code = h
            .notebook
            .read(|nb| nb.cell(&CellId::new("a")).unwrap().code.clone())
            .await;
        assert_eq!(code, "import math\n");
        // the baseline is the pre-format snapshot
        assert!(h.coordinator.needs_save().await);
    }

    #[tokio::test]
    async fn test_save_if_named_requires_name_and_connection() {
        let h = harness(two_cells(), None, ConnectionState::Open);
        let outcome = h.coordinator.save_if_named(false).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Skipped(SkipReason::Unnamed));

        h.filename.set(Some("nb.py".to_string())).await;
        h.connection.set(ConnectionState::Connecting);
        let outcome = h.coordinator.save_if_named(true).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Skipped(SkipReason::NotConnected));
        assert!(h.fakes.notifier.alerts().is_empty());

        h.connection.set(ConnectionState::Open);
        let outcome = h.coordinator.save_if_named(false).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Saved);
        assert_eq!(h.fakes.transport.saves().len(), 1);
    }

    #[tokio::test]
    async fn test_save_or_name_prompts_once_then_renames_before_saving() {
        let h = harness(two_cells(), None, ConnectionState::Open);
        h.fakes.prompt.push_answer("  report  ");

        let outcome = h.coordinator.save_or_name_notebook().await.unwrap();
        assert_eq!(outcome, SaveOutcome::Saved);
        assert_eq!(h.fakes.prompt.times_opened(), 1);

        let calls = h.fakes.transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], TransportCall::Rename(Some("report".to_string())));
        match &calls[1] {
            TransportCall::Save(request) => assert_eq!(request.filename, "report"),
            other => panic!("expected save, got {:?}", other),
        }
        assert_eq!(h.filename.get().await.as_deref(), Some("report"));
        assert_eq!(h.fakes.notifier.toasts(), vec![SAVED_TOAST]);
    }

    #[tokio::test]
    async fn test_save_or_name_with_failed_rename_does_not_save() {
        let h = harness(two_cells(), None, ConnectionState::Open);
        h.fakes.prompt.push_answer("report");
        h.fakes.transport.reject_renames("File already exists");

        let result = h.coordinator.save_or_name_notebook().await;
        assert!(matches!(result, Err(EditorError::RenameRejected(_))));
        assert_eq!(h.fakes.transport.renames().len(), 1);
        assert!(h.fakes.transport.saves().is_empty());
        assert_eq!(h.fakes.notifier.alerts(), vec!["File already exists"]);
        assert_eq!(h.filename.get().await, None);
    }

    #[tokio::test]
    async fn test_save_or_name_dismissed_or_blank_prompt() {
        let h = harness(two_cells(), None, ConnectionState::Open);

        let outcome = h.coordinator.save_or_name_notebook().await.unwrap();
        assert_eq!(outcome, SaveOutcome::Skipped(SkipReason::Unnamed));

        h.fakes.prompt.push_answer("   ");
        let outcome = h.coordinator.save_or_name_notebook().await.unwrap();
        assert_eq!(outcome, SaveOutcome::Skipped(SkipReason::Unnamed));

        assert_eq!(h.fakes.prompt.times_opened(), 2);
        assert!(h.fakes.transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_save_or_name_does_not_prompt_when_closed_or_named() {
        let h = harness(two_cells(), None, ConnectionState::Closed);
        h.coordinator.save_or_name_notebook().await.unwrap();
        assert_eq!(h.fakes.prompt.times_opened(), 0);

        let h = harness(two_cells(), Some("nb.py"), ConnectionState::Open);
        let outcome = h.coordinator.save_or_name_notebook().await.unwrap();
        assert_eq!(outcome, SaveOutcome::Saved);
        assert_eq!(h.fakes.prompt.times_opened(), 0);
    }

    #[tokio::test]
    async fn test_save_or_name_prompts_while_connecting() {
        let h = harness(two_cells(), None, ConnectionState::Connecting);
        h.fakes.prompt.push_answer("report");

        let result = h.coordinator.save_or_name_notebook().await;
        assert_eq!(h.fakes.prompt.times_opened(), 1);
        // the rename itself needs an open connection
        assert!(matches!(result, Err(EditorError::NotConnected)));
        assert!(h.fakes.transport.calls().is_empty());
        assert_eq!(h.fakes.notifier.alerts(), vec![NOT_CONNECTED_MESSAGE]);
    }

    #[tokio::test]
    async fn test_rename_while_closed_fails_without_side_effects() {
        let h = harness(two_cells(), Some("old.py"), ConnectionState::Closed);

        let result = h
            .coordinator
            .handle_filename_change(Some("new.py".to_string()))
            .await;
        assert!(matches!(result, Err(EditorError::NotConnected)));
        assert!(h.fakes.transport.calls().is_empty());
        assert_eq!(h.filename.get().await.as_deref(), Some("old.py"));
        assert_eq!(h.fakes.notifier.alerts(), vec![NOT_CONNECTED_MESSAGE]);
    }

    #[tokio::test]
    async fn test_rename_updates_filename_title_and_url() {
        let h = harness(two_cells(), None, ConnectionState::Open);

        let renamed = h
            .coordinator
            .handle_filename_change(Some("analysis/q3.py".to_string()))
            .await
            .unwrap();
        assert_eq!(renamed.as_deref(), Some("analysis/q3.py"));
        assert_eq!(h.filename.get().await.as_deref(), Some("analysis/q3.py"));
        assert_eq!(h.fakes.title_sink.title(), "q3.py");
        assert_eq!(
            h.fakes.url_params.get(FILE_PARAM).as_deref(),
            Some("analysis/q3.py")
        );

        let renamed = h.coordinator.handle_filename_change(None).await.unwrap();
        assert_eq!(renamed, None);
        assert_eq!(h.fakes.url_params.get(FILE_PARAM), None);
        assert_eq!(h.fakes.title_sink.title(), DEFAULT_TITLE);
    }

    #[tokio::test]
    async fn test_rejected_rename_leaves_filename() {
        let h = harness(two_cells(), Some("old.py"), ConnectionState::Open);
        h.fakes.transport.reject_renames("Permission denied");

        let result = h
            .coordinator
            .handle_filename_change(Some("new.py".to_string()))
            .await;
        assert!(matches!(result, Err(EditorError::RenameRejected(ref m)) if m == "Permission denied"));
        assert_eq!(h.filename.get().await.as_deref(), Some("old.py"));
        assert_eq!(h.fakes.notifier.alerts(), vec!["Permission denied"]);
    }

    #[tokio::test]
    async fn test_mark_loaded_makes_notebook_clean() {
        let h = harness(two_cells(), Some("nb.py"), ConnectionState::Open);
        let snapshot = h.notebook.snapshot().await;
        h.coordinator.mark_loaded(&snapshot).await;
        assert!(!h.coordinator.needs_save().await);

        h.notebook
            .edit(|nb| nb.update_code(&CellId::new("b"), "math.tau".to_string()))
            .await
            .unwrap();
        assert!(h.coordinator.needs_save().await);
    }

    #[tokio::test]
    async fn test_format_all_skips_deleted_cells() {
        let h = harness(two_cells(), Some("nb.py"), ConnectionState::Open);
        h.fakes.transport.format_by_appending(" ");

        let updated = h.coordinator.format_all().await.unwrap();
        assert_eq!(updated, 2);

        let empty = harness(Vec::new(), None, ConnectionState::Open);
        assert_eq!(empty.coordinator.format_all().await.unwrap(), 0);
        assert!(empty.fakes.transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_autosave_target_never_prompts() {
        let h = harness(two_cells(), None, ConnectionState::Open);
        let outcome = AutosaveTarget::autosave(&h.coordinator).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Skipped(SkipReason::Unnamed));
        assert_eq!(h.fakes.prompt.times_opened(), 0);

        h.filename.set(Some("nb.py".to_string())).await;
        let outcome = AutosaveTarget::autosave(&h.coordinator).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Saved);
        assert!(!AutosaveTarget::needs_save(&h.coordinator).await);
    }

    #[tokio::test]
    async fn test_overlapping_saves_keep_last_confirmed_snapshot() {
        let (transport, mut arrivals) = GatedTransport::new();
        let fakes = Fakes::new();
        let mut services = fakes.services();
        services.transport = transport.clone();

        let notebook = SharedNotebook::new(Notebook::from_cells(
            vec![Cell::with_id("a".into(), "v1")],
            None,
        ));
        let title = Arc::new(TitleManager::new(fakes.title_sink.clone(), String::new()));
        let coordinator = Arc::new(SaveCoordinator::new(
            notebook.clone(),
            ConnectionStatus::new(ConnectionState::Open),
            FilenameRegistry::new(Some("nb.py".to_string())),
            &services,
            title,
            Arc::new(InMemoryEventBus::new()),
            false,
        ));

        let release_first = transport.hold_next_save();
        let first = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.save_notebook("nb.py", false).await }
        });
        let sent = arrivals.recv().await.unwrap();
        assert_eq!(sent.codes, vec!["v1".to_string()]);

        // edited while the first save is still in flight
        notebook
            .edit(|nb| nb.update_code(&CellId::new("a"), "v2".to_string()))
            .await
            .unwrap();
        let outcome = coordinator.save_notebook("nb.py", false).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Saved);
        assert!(!coordinator.needs_save().await);

        release_first.send(()).unwrap();
        assert_eq!(first.await.unwrap().unwrap(), SaveOutcome::Saved);

        let baseline = coordinator.last_saved().await.unwrap();
        assert_eq!(baseline.codes().to_vec(), vec!["v1".to_string()]);
        assert!(coordinator.needs_save().await);
        assert_eq!(transport.saves().len(), 2);
    }
}
