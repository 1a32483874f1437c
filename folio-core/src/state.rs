//! Shared state vocabulary for the edit shell

use serde::{Deserialize, Serialize};

/// Link state of the backend connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Handshake in progress, or reconnecting
    #[default]
    Connecting,
    /// Connected; saves and renames are allowed
    Open,
    /// Disconnected
    Closed,
}

impl ConnectionState {
    /// Whether requests may be sent over the connection
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    /// Whether the connection has been lost
    pub fn is_closed(&self) -> bool {
        matches!(self, ConnectionState::Closed)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Open => write!(f, "open"),
            ConnectionState::Closed => write!(f, "closed"),
        }
    }
}

/// View mode of the notebook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Editing affordances visible
    #[default]
    Edit,
    /// Read-oriented presentation
    Present,
}

impl ViewMode {
    /// The other mode
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Edit => ViewMode::Present,
            ViewMode::Present => ViewMode::Edit,
        }
    }
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewMode::Edit => write!(f, "edit"),
            ViewMode::Present => write!(f, "present"),
        }
    }
}

/// Point-in-time summary of an edit session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub filename: Option<String>,
    pub title: String,
    pub connection: ConnectionState,
    pub view_mode: ViewMode,
    pub cell_count: usize,
    pub needs_save: bool,
}
