//! Live notebook model: ordered cells plus layout

use crate::snapshot::NotebookSnapshot;
use crate::{EditorError, EditorResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use uuid::Uuid;

/// Name given to cells the user has not named
pub const DEFAULT_CELL_NAME: &str = "__";

/// Stable identity of a cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(String);

impl CellId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// Generate a short random id
    pub fn generate() -> Self {
        let id = Uuid::new_v4().simple().to_string();
        Self(id[..8].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CellId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CellId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Per-cell configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CellConfig {
    /// Cell is excluded from execution
    pub disabled: bool,
    /// Code is hidden in present mode
    pub hide_code: bool,
}

/// A unit of code with stable identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub name: String,
    pub code: String,
    pub config: CellConfig,
}

impl Cell {
    /// Create an unnamed cell with a fresh id
    pub fn new<S: Into<String>>(code: S) -> Self {
        Self::with_id(CellId::generate(), code)
    }

    /// Create an unnamed cell with the given id
    pub fn with_id<S: Into<String>>(id: CellId, code: S) -> Self {
        Self {
            id,
            name: DEFAULT_CELL_NAME.to_string(),
            code: code.into(),
            config: CellConfig::default(),
        }
    }

    pub fn named<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    pub fn configured(mut self, config: CellConfig) -> Self {
        self.config = config;
        self
    }
}

/// Ordered cells plus the serialized layout blob
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Notebook {
    cells: Vec<Cell>,
    layout: Option<serde_json::Value>,
}

impl Notebook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: Vec<Cell>, layout: Option<serde_json::Value>) -> Self {
        Self { cells, layout }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn layout(&self) -> Option<&serde_json::Value> {
        self.layout.as_ref()
    }

    pub fn cell(&self, id: &CellId) -> Option<&Cell> {
        self.cells.iter().find(|c| &c.id == id)
    }

    fn cell_mut(&mut self, id: &CellId) -> EditorResult<&mut Cell> {
        self.cells
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| EditorError::CellNotFound(id.clone()))
    }

    /// Append a cell, returning its id
    pub fn push(&mut self, cell: Cell) -> CellId {
        let id = cell.id.clone();
        self.cells.push(cell);
        id
    }

    /// Remove a cell by id
    pub fn remove(&mut self, id: &CellId) -> EditorResult<Cell> {
        let index = self
            .cells
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| EditorError::CellNotFound(id.clone()))?;
        Ok(self.cells.remove(index))
    }

    pub fn update_code(&mut self, id: &CellId, code: String) -> EditorResult<()> {
        self.cell_mut(id)?.code = code;
        Ok(())
    }

    pub fn rename_cell(&mut self, id: &CellId, name: String) -> EditorResult<()> {
        self.cell_mut(id)?.name = name;
        Ok(())
    }

    pub fn set_config(&mut self, id: &CellId, config: CellConfig) -> EditorResult<()> {
        self.cell_mut(id)?.config = config;
        Ok(())
    }

    pub fn set_layout(&mut self, layout: Option<serde_json::Value>) {
        self.layout = layout;
    }

    /// Capture the current content as a snapshot
    pub fn snapshot(&self) -> NotebookSnapshot {
        NotebookSnapshot::from_cells(&self.cells, self.layout.clone())
    }
}

/// Notebook shared between the shell and its collaborators
///
/// Every mutation through [`SharedNotebook::edit`] bumps a revision counter
/// that observers (the autosave scheduler) can watch.
#[derive(Clone)]
pub struct SharedNotebook {
    inner: Arc<RwLock<Notebook>>,
    revision: Arc<watch::Sender<u64>>,
}

impl SharedNotebook {
    pub fn new(notebook: Notebook) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(RwLock::new(notebook)),
            revision: Arc::new(revision),
        }
    }

    /// Read the notebook
    pub async fn read<R>(&self, f: impl FnOnce(&Notebook) -> R) -> R {
        let notebook = self.inner.read().await;
        f(&notebook)
    }

    /// Mutate the notebook and notify revision observers
    pub async fn edit<R>(&self, f: impl FnOnce(&mut Notebook) -> R) -> R {
        let result = {
            let mut notebook = self.inner.write().await;
            f(&mut notebook)
        };
        self.revision.send_modify(|rev| *rev += 1);
        result
    }

    pub async fn snapshot(&self) -> NotebookSnapshot {
        self.inner.read().await.snapshot()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Number of edits applied so far
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}
