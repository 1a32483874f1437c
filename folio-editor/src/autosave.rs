//! Debounced background autosave

use crate::save_coordinator::SaveOutcome;
use crate::{EditorError, EditorResult};
use async_trait::async_trait;
use folio_core::{AutosaveConfig, ConnectionState, FolioError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

/// What the scheduler needs from the shell
#[async_trait]
pub trait AutosaveTarget: Send + Sync {
    async fn needs_save(&self) -> bool;

    /// Save without user interaction; must not prompt or alert
    async fn autosave(&self) -> EditorResult<SaveOutcome>;
}

/// Handle on the background autosave task
///
/// The task wakes on notebook edits and connection changes, waits until edits
/// have been quiet for the configured delay, then saves if the notebook is
/// dirty. Dropping the handle stops the task.
pub struct AutosaveScheduler {
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl AutosaveScheduler {
    /// Start the task; with autosave turned off no task is spawned
    pub fn spawn(
        target: Arc<dyn AutosaveTarget>,
        config: &AutosaveConfig,
        revisions: watch::Receiver<u64>,
        connection: watch::Receiver<ConnectionState>,
    ) -> Self {
        if !config.is_enabled() {
            tracing::info!("Autosave disabled");
            return Self {
                shutdown_tx: None,
                handle: None,
            };
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let delay = config.delay();
        let handle = tokio::spawn(run(target, delay, revisions, connection, shutdown_rx));

        tracing::info!("Autosave task started (delay {:?})", delay);
        Self {
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Stop the task and wait for it to finish
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!("Autosave task ended abnormally: {}", e);
            }
        }
    }
}

async fn run(
    target: Arc<dyn AutosaveTarget>,
    delay: Duration,
    mut revisions: watch::Receiver<u64>,
    mut connection: watch::Receiver<ConnectionState>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => break,
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
                tracing::trace!("Autosave woken by edit");
            }
            changed = connection.changed() => {
                if changed.is_err() {
                    break;
                }
                tracing::trace!("Autosave woken by connection change");
            }
        }

        // Restart the delay on every edit until the notebook settles
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => return,
                _ = tokio::time::sleep(delay) => break,
                changed = revisions.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    tracing::trace!("Autosave delay restarted");
                }
            }
        }

        if !target.needs_save().await {
            tracing::trace!("Autosave tick: nothing to save");
            continue;
        }

        match target.autosave().await {
            Ok(SaveOutcome::Saved) => tracing::debug!("Autosaved notebook"),
            Ok(SaveOutcome::Skipped(reason)) => {
                tracing::debug!("Autosave skipped: {:?}", reason)
            }
            Err(EditorError::NotConnected) => {
                tracing::debug!("Autosave skipped: not connected")
            }
            Err(e) => report_failure(e),
        }
    }

    tracing::debug!("Autosave task stopped");
}

/// Failures a later save can get past are warnings; the rest are errors
fn report_failure(err: EditorError) {
    let err = FolioError::from(err);
    let severity = err.severity();
    if err.is_recoverable() {
        tracing::warn!(%severity, "Autosave failed: {}", err);
    } else {
        tracing::error!(%severity, "Autosave failed: {}", err);
    }
}
