//! Folio Core - shared foundation for the Folio notebook edit shell
//!
//! This crate provides the error type, the event bus used to notify observers
//! of edit-shell state changes, the configuration model, and the small state
//! vocabulary (connection state, view mode) shared by every other crate.

pub mod config;
pub mod error;
pub mod event;
pub mod state;


// Re-export commonly used types
pub use config::{AppConfig, AutosaveConfig, AutosaveMode, Config, StorageConfig};
pub use error::{ErrorSeverity, FolioError, Result};
pub use event::{EditorEvent, EventBus, EventHandler, InMemoryEventBus, SubscriptionId};
pub use state::{ConnectionState, SessionSummary, ViewMode};
