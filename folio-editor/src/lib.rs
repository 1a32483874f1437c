//! Edit-mode shell for Folio notebooks
//!
//! The shell owns the live notebook and decides when it is dirty, when a save
//! is allowed, how renames compose with saves, and whether a page close must
//! be intercepted. Rendering, the backend transport and the host page are
//! reached only through the collaborator traits in [`host`] and [`transport`].

use folio_core::FolioError;
use thiserror::Error;

pub mod autosave;
pub mod connection;
pub mod dirty_tracker;
pub mod edit_app;
pub mod file_transport;
pub mod filename;
pub mod hotkeys;
pub mod host;
pub mod notebook;
pub mod presentation;
pub mod save_coordinator;
pub mod snapshot;
pub mod title;
pub mod transport;
pub mod unload_guard;

#[cfg(test)]
mod test_support;

pub use autosave::{AutosaveScheduler, AutosaveTarget};
pub use connection::ConnectionStatus;
pub use dirty_tracker::needs_save;
pub use edit_app::EditApp;
pub use file_transport::{FileTransport, NotebookDocument, StoredCell};
pub use filename::FilenameRegistry;
pub use hotkeys::{HotkeyAction, HotkeyMap, KeyChord};
pub use host::{
    HostServices, MemoryTitleSink, MemoryUrlParams, NamePrompt, Notifier, QueuedNamePrompt,
    TitleSink, TracingNotifier, UrlParams, FILE_PARAM,
};
pub use notebook::{Cell, CellConfig, CellId, Notebook, SharedNotebook};
pub use presentation::{OutputRegion, PresentationToggle, Rect, ViewState, VisibleRegions};
pub use save_coordinator::{SaveCoordinator, SaveOutcome, SkipReason};
pub use snapshot::{NotebookSnapshot, SavedNotebook};
pub use title::{derive_title, TitleManager, DEFAULT_TITLE};
pub use transport::{NotebookTransport, SaveRequest};
pub use unload_guard::{UnloadDecision, UnloadGuard};

/// Result type for edit-shell operations
pub type EditorResult<T> = std::result::Result<T, EditorError>;

/// Editor-specific errors
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Not connected to a kernel")]
    NotConnected,

    #[error("Rename rejected: {0}")]
    RenameRejected(String),

    #[error("Save rejected: {0}")]
    SaveRejected(String),

    #[error("Format failed: {0}")]
    FormatFailed(String),

    #[error("Cell not found: {0}")]
    CellNotFound(CellId),

    #[error(
        "Invalid snapshot: {cells} cell ids but {codes} codes, {names} names, {configs} configs"
    )]
    InvalidSnapshot {
        cells: usize,
        codes: usize,
        names: usize,
        configs: usize,
    },

    #[error("Invalid hotkey: {0}")]
    InvalidHotkey(String),

    #[error(transparent)]
    Core(#[from] FolioError),
}

impl From<EditorError> for FolioError {
    fn from(err: EditorError) -> Self {
        match err {
            EditorError::Core(inner) => inner,
            EditorError::RenameRejected(msg)
            | EditorError::SaveRejected(msg)
            | EditorError::FormatFailed(msg) => FolioError::Transport(msg),
            other => FolioError::State(other.to_string()),
        }
    }
}

/// Message a backend attached to a failed request
///
/// Transport errors carry the backend text verbatim; anything else is shown
/// with its full description.
pub(crate) fn backend_message(err: &FolioError) -> String {
    match err {
        FolioError::Transport(msg) => msg.clone(),
        other => other.to_string(),
    }
}
