//! Backend operations the shell invokes

use crate::notebook::{CellConfig, CellId};
use crate::snapshot::NotebookSnapshot;
use async_trait::async_trait;
use folio_core::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Payload of a save request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub cell_ids: Vec<CellId>,
    pub codes: Vec<String>,
    pub names: Vec<String>,
    pub filename: String,
    pub configs: Vec<CellConfig>,
    pub layout: Option<serde_json::Value>,
}

impl SaveRequest {
    pub fn new(filename: &str, snapshot: &NotebookSnapshot) -> Self {
        Self {
            cell_ids: snapshot.cell_ids().to_vec(),
            codes: snapshot.codes().to_vec(),
            names: snapshot.names().to_vec(),
            filename: filename.to_string(),
            configs: snapshot.configs().to_vec(),
            layout: snapshot.layout().cloned(),
        }
    }
}

/// Request/response operations on the backend connection
///
/// Failures carry the backend's message in [`folio_core::FolioError::Transport`].
/// Implementations do not retry.
#[async_trait]
pub trait NotebookTransport: Send + Sync {
    /// Rename the notebook; `None` detaches it from any file
    async fn send_rename(&self, filename: Option<String>) -> Result<()>;

    /// Persist the notebook
    async fn send_save(&self, request: SaveRequest) -> Result<()>;

    /// Interrupt running cells
    async fn send_interrupt(&self) -> Result<()>;

    /// Format the given cell codes, returning the formatted code per cell
    async fn send_format(&self, codes: HashMap<CellId, String>)
        -> Result<HashMap<CellId, String>>;
}
