//! Event system for notifying observers of edit-shell state changes

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::state::{ConnectionState, ViewMode};

/// Event serialization utilities for persistence and debugging
pub mod serialization {
    use super::*;
    use std::io::Write;

    /// Serialize an event to JSON string
    pub fn serialize_event(event: &EditorEvent) -> Result<String> {
        serde_json::to_string(event).map_err(crate::error::FolioError::Json)
    }

    /// Deserialize an event from JSON string
    pub fn deserialize_event(json: &str) -> Result<EditorEvent> {
        serde_json::from_str(json).map_err(crate::error::FolioError::Json)
    }

    /// Write event to a writer as one JSON line
    pub fn write_event<W: Write>(writer: &mut W, event: &EditorEvent) -> Result<()> {
        let json = serialize_event(event)?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    /// Format event for logging with timestamp
    pub fn format_event_for_log(event: &EditorEvent) -> String {
        let timestamp = event
            .timestamp()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        format!(
            "[{}] {}: {}",
            timestamp,
            event.event_type().to_uppercase(),
            event.description()
        )
    }
}

/// Events published by the edit shell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditorEvent {
    /// Backend link state changed
    ConnectionChanged {
        state: ConnectionState,
        timestamp: SystemTime,
    },
    /// A save was confirmed by the backend
    NotebookSaved {
        filename: String,
        cell_count: usize,
        user_initiated: bool,
        timestamp: SystemTime,
    },
    /// The notebook was renamed (None means unnamed)
    FilenameChanged {
        filename: Option<String>,
        timestamp: SystemTime,
    },
    /// The document title was recomputed
    TitleChanged { title: String, timestamp: SystemTime },
    /// Edit/present mode flipped
    ViewModeChanged {
        mode: ViewMode,
        cell_anchor: Option<String>,
        timestamp: SystemTime,
    },
    /// A blocking alert was shown to the user
    Alert {
        message: String,
        timestamp: SystemTime,
    },
    /// A transient toast was shown to the user
    Toast { title: String, timestamp: SystemTime },
}

impl EditorEvent {
    /// Create a connection changed event with current timestamp
    pub fn connection_changed(state: ConnectionState) -> Self {
        Self::ConnectionChanged {
            state,
            timestamp: SystemTime::now(),
        }
    }

    /// Create a notebook saved event with current timestamp
    pub fn notebook_saved(filename: String, cell_count: usize, user_initiated: bool) -> Self {
        Self::NotebookSaved {
            filename,
            cell_count,
            user_initiated,
            timestamp: SystemTime::now(),
        }
    }

    /// Create a filename changed event with current timestamp
    pub fn filename_changed(filename: Option<String>) -> Self {
        Self::FilenameChanged {
            filename,
            timestamp: SystemTime::now(),
        }
    }

    /// Create a title changed event with current timestamp
    pub fn title_changed(title: String) -> Self {
        Self::TitleChanged {
            title,
            timestamp: SystemTime::now(),
        }
    }

    /// Create a view mode changed event with current timestamp
    pub fn view_mode_changed(mode: ViewMode, cell_anchor: Option<String>) -> Self {
        Self::ViewModeChanged {
            mode,
            cell_anchor,
            timestamp: SystemTime::now(),
        }
    }

    /// Create an alert event with current timestamp
    pub fn alert(message: String) -> Self {
        Self::Alert {
            message,
            timestamp: SystemTime::now(),
        }
    }

    /// Create a toast event with current timestamp
    pub fn toast(title: String) -> Self {
        Self::Toast {
            title,
            timestamp: SystemTime::now(),
        }
    }

    /// Get the event type identifier
    pub fn event_type(&self) -> &str {
        match self {
            EditorEvent::ConnectionChanged { .. } => "connection_changed",
            EditorEvent::NotebookSaved { .. } => "notebook_saved",
            EditorEvent::FilenameChanged { .. } => "filename_changed",
            EditorEvent::TitleChanged { .. } => "title_changed",
            EditorEvent::ViewModeChanged { .. } => "view_mode_changed",
            EditorEvent::Alert { .. } => "alert",
            EditorEvent::Toast { .. } => "toast",
        }
    }

    /// Get the event timestamp
    pub fn timestamp(&self) -> SystemTime {
        match self {
            EditorEvent::ConnectionChanged { timestamp, .. }
            | EditorEvent::NotebookSaved { timestamp, .. }
            | EditorEvent::FilenameChanged { timestamp, .. }
            | EditorEvent::TitleChanged { timestamp, .. }
            | EditorEvent::ViewModeChanged { timestamp, .. }
            | EditorEvent::Alert { timestamp, .. }
            | EditorEvent::Toast { timestamp, .. } => *timestamp,
        }
    }

    /// Get event metadata
    pub fn metadata(&self) -> HashMap<String, String> {
        let mut metadata = HashMap::new();

        match self {
            EditorEvent::ConnectionChanged { state, .. } => {
                metadata.insert("state".to_string(), state.to_string());
            }
            EditorEvent::NotebookSaved {
                filename,
                cell_count,
                user_initiated,
                ..
            } => {
                metadata.insert("filename".to_string(), filename.clone());
                metadata.insert("cell_count".to_string(), cell_count.to_string());
                metadata.insert("user_initiated".to_string(), user_initiated.to_string());
            }
            EditorEvent::FilenameChanged { filename, .. } => {
                if let Some(filename) = filename {
                    metadata.insert("filename".to_string(), filename.clone());
                }
            }
            EditorEvent::TitleChanged { title, .. } => {
                metadata.insert("title".to_string(), title.clone());
            }
            EditorEvent::ViewModeChanged {
                mode, cell_anchor, ..
            } => {
                metadata.insert("mode".to_string(), mode.to_string());
                if let Some(anchor) = cell_anchor {
                    metadata.insert("cell_anchor".to_string(), anchor.clone());
                }
            }
            EditorEvent::Alert { message, .. } => {
                metadata.insert("message".to_string(), message.clone());
            }
            EditorEvent::Toast { title, .. } => {
                metadata.insert("title".to_string(), title.clone());
            }
        }

        metadata
    }

    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            EditorEvent::ConnectionChanged { state, .. } => {
                format!("Connection is {}", state)
            }
            EditorEvent::NotebookSaved {
                filename,
                cell_count,
                ..
            } => format!("Saved {} ({} cells)", filename, cell_count),
            EditorEvent::FilenameChanged { filename, .. } => match filename {
                Some(name) => format!("Renamed notebook to {}", name),
                None => "Notebook is now unnamed".to_string(),
            },
            EditorEvent::TitleChanged { title, .. } => format!("Title set to {}", title),
            EditorEvent::ViewModeChanged { mode, .. } => format!("Switched to {} mode", mode),
            EditorEvent::Alert { message, .. } => format!("Alert: {}", message),
            EditorEvent::Toast { title, .. } => format!("Toast: {}", title),
        }
    }

    /// Check if this event was shown to the user
    pub fn is_user_notification(&self) -> bool {
        matches!(self, EditorEvent::Alert { .. } | EditorEvent::Toast { .. })
    }
}

/// Handler for editor events
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle an incoming event
    async fn handle_event(&self, event: &EditorEvent) -> Result<()>;

    /// Get handler name for debugging
    fn handler_name(&self) -> &str {
        "UnnamedHandler"
    }
}

/// Event bus for publishing and subscribing to events
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish an event to all subscribers
    async fn publish(&self, event: EditorEvent) -> Result<()>;

    /// Subscribe to events
    async fn subscribe(&self, handler: Arc<dyn EventHandler>) -> Result<SubscriptionId>;

    /// Unsubscribe from events
    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()>;

    /// Get the number of active subscriptions
    async fn subscription_count(&self) -> usize;
}

/// Unique identifier for event subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub Uuid);

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// In-memory implementation of the event bus
///
/// Handlers run in subscription order on the publishing task. A failing
/// handler is logged and skipped; it never fails the publisher.
pub struct InMemoryEventBus {
    subscriptions: RwLock<Vec<(SubscriptionId, Arc<dyn EventHandler>)>>,
}

impl InMemoryEventBus {
    /// Create a new in-memory event bus
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, event: EditorEvent) -> Result<()> {
        tracing::debug!("Publishing event: {}", event.event_type());

        let handlers: Vec<Arc<dyn EventHandler>> = {
            let subscriptions = self.subscriptions.read().await;
            subscriptions.iter().map(|(_, h)| h.clone()).collect()
        };

        if handlers.is_empty() {
            tracing::trace!("No subscribers for event type: {}", event.event_type());
            return Ok(());
        }

        let mut handlers_called = 0;
        for handler in handlers {
            if let Err(e) = handler.handle_event(&event).await {
                tracing::error!(
                    "Handler {} failed to process event {}: {}",
                    handler.handler_name(),
                    event.event_type(),
                    e
                );
            } else {
                handlers_called += 1;
            }
        }

        tracing::trace!(
            "Routed event {} to {} handlers",
            event.event_type(),
            handlers_called
        );
        Ok(())
    }

    async fn subscribe(&self, handler: Arc<dyn EventHandler>) -> Result<SubscriptionId> {
        let id = SubscriptionId::new();
        tracing::debug!(
            "Created subscription {:?} for handler {}",
            id,
            handler.handler_name()
        );
        self.subscriptions.write().await.push((id, handler));
        Ok(id)
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        let mut subscriptions = self.subscriptions.write().await;
        let before = subscriptions.len();
        subscriptions.retain(|(sub_id, _)| *sub_id != id);

        if subscriptions.len() == before {
            tracing::warn!("Attempted to remove non-existent subscription: {:?}", id);
        } else {
            tracing::debug!("Removed subscription: {:?}", id);
        }
        Ok(())
    }

    async fn subscription_count(&self) -> usize {
        self.subscriptions.read().await.len()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}
