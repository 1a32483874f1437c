//! Value snapshots of notebook content

use crate::notebook::{Cell, CellConfig, CellId};
use crate::{EditorError, EditorResult};
use serde::{Deserialize, Serialize};

/// Notebook content at one instant
///
/// The code, name and config sequences are parallel to `cell_ids`; the
/// constructors refuse sequences of different lengths.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotebookSnapshot {
    cell_ids: Vec<CellId>,
    codes: Vec<String>,
    names: Vec<String>,
    configs: Vec<CellConfig>,
    layout: Option<serde_json::Value>,
}

impl NotebookSnapshot {
    /// Build a snapshot from parallel sequences
    pub fn try_new(
        cell_ids: Vec<CellId>,
        codes: Vec<String>,
        names: Vec<String>,
        configs: Vec<CellConfig>,
        layout: Option<serde_json::Value>,
    ) -> EditorResult<Self> {
        let cells = cell_ids.len();
        if codes.len() != cells || names.len() != cells || configs.len() != cells {
            return Err(EditorError::InvalidSnapshot {
                cells,
                codes: codes.len(),
                names: names.len(),
                configs: configs.len(),
            });
        }

        Ok(Self {
            cell_ids,
            codes,
            names,
            configs,
            layout,
        })
    }

    pub fn from_cells(cells: &[Cell], layout: Option<serde_json::Value>) -> Self {
        Self {
            cell_ids: cells.iter().map(|c| c.id.clone()).collect(),
            codes: cells.iter().map(|c| c.code.clone()).collect(),
            names: cells.iter().map(|c| c.name.clone()).collect(),
            configs: cells.iter().map(|c| c.config.clone()).collect(),
            layout,
        }
    }

    pub fn len(&self) -> usize {
        self.cell_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_ids.is_empty()
    }

    pub fn cell_ids(&self) -> &[CellId] {
        &self.cell_ids
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn configs(&self) -> &[CellConfig] {
        &self.configs
    }

    pub fn layout(&self) -> Option<&serde_json::Value> {
        self.layout.as_ref()
    }

    /// The persisted form, without cell ids
    pub fn to_saved(&self) -> SavedNotebook {
        SavedNotebook {
            codes: self.codes.clone(),
            names: self.names.clone(),
            configs: self.configs.clone(),
            layout: self.layout.clone(),
        }
    }
}

/// Content of the last confirmed save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedNotebook {
    codes: Vec<String>,
    names: Vec<String>,
    configs: Vec<CellConfig>,
    layout: Option<serde_json::Value>,
}

impl SavedNotebook {
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn configs(&self) -> &[CellConfig] {
        &self.configs
    }

    pub fn layout(&self) -> Option<&serde_json::Value> {
        self.layout.as_ref()
    }
}

impl From<&NotebookSnapshot> for SavedNotebook {
    fn from(snapshot: &NotebookSnapshot) -> Self {
        snapshot.to_saved()
    }
}
