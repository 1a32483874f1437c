//! Directory-backed notebook transport
//!
//! Notebooks are stored as pretty-printed JSON documents under a root
//! directory. Renames move the file, saves overwrite it.

use crate::notebook::{Cell, CellConfig, CellId, Notebook};
use crate::transport::{NotebookTransport, SaveRequest};
use async_trait::async_trait;
use folio_core::{FolioError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::fs;
use tokio::sync::RwLock;

/// Version written into every stored document
pub const DOCUMENT_VERSION: u32 = 1;

/// On-disk form of a notebook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotebookDocument {
    pub version: u32,
    pub cells: Vec<StoredCell>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCell {
    pub id: CellId,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub config: CellConfig,
}

impl From<&SaveRequest> for NotebookDocument {
    fn from(request: &SaveRequest) -> Self {
        let cells = request
            .cell_ids
            .iter()
            .zip(&request.codes)
            .zip(&request.names)
            .zip(&request.configs)
            .map(|(((id, code), name), config)| StoredCell {
                id: id.clone(),
                name: name.clone(),
                code: code.clone(),
                config: config.clone(),
            })
            .collect();
        Self {
            version: DOCUMENT_VERSION,
            cells,
            layout: request.layout.clone(),
        }
    }
}

impl From<NotebookDocument> for Notebook {
    fn from(document: NotebookDocument) -> Self {
        let cells = document
            .cells
            .into_iter()
            .map(|stored| {
                Cell::with_id(stored.id, stored.code)
                    .named(stored.name)
                    .configured(stored.config)
            })
            .collect();
        Notebook::from_cells(cells, document.layout)
    }
}

/// [`NotebookTransport`] over a local directory
pub struct FileTransport {
    root: PathBuf,
    current: RwLock<Option<String>>,
    interrupts: AtomicUsize,
}

impl FileTransport {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            current: RwLock::new(None),
            interrupts: AtomicUsize::new(0),
        }
    }

    /// Create the root directory if needed
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            FolioError::transport(format!(
                "Failed to create notebooks directory {}: {}",
                self.root.display(),
                e
            ))
        })?;
        tracing::info!("File transport rooted at {}", self.root.display());
        Ok(())
    }

    /// Resolve a notebook name to a path inside the root
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        let invalid = name.is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name.contains("..")
            || Path::new(name).is_absolute();
        if invalid {
            return Err(FolioError::transport(format!("Invalid filename: {}", name)));
        }
        Ok(self.root.join(name))
    }

    /// Name of the file this transport is attached to
    pub async fn current(&self) -> Option<String> {
        self.current.read().await.clone()
    }

    pub fn interrupt_count(&self) -> usize {
        self.interrupts.load(Ordering::SeqCst)
    }

    /// An unreadable path is an error, never "absent"
    async fn exists(&self, name: &str) -> Result<bool> {
        let path = self.path_for(name)?;
        fs::try_exists(&path).await.map_err(|e| {
            FolioError::transport(format!("Failed to check {}: {}", path.display(), e))
        })
    }

    /// Read a stored notebook and attach to it
    pub async fn load(&self, name: &str) -> Result<Notebook> {
        let path = self.path_for(name)?;
        let contents = fs::read_to_string(&path).await.map_err(|e| {
            FolioError::transport(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let document: NotebookDocument = serde_json::from_str(&contents)?;
        if document.version > DOCUMENT_VERSION {
            return Err(FolioError::transport(format!(
                "Unsupported document version {} in {}",
                document.version, name
            )));
        }

        *self.current.write().await = Some(name.to_string());
        tracing::info!("Loaded {} ({} cells)", name, document.cells.len());
        Ok(document.into())
    }
}

#[async_trait]
impl NotebookTransport for FileTransport {
    async fn send_rename(&self, filename: Option<String>) -> Result<()> {
        let Some(name) = filename else {
            *self.current.write().await = None;
            tracing::debug!("Detached from notebook file");
            return Ok(());
        };

        let target = self.path_for(&name)?;
        let mut current = self.current.write().await;
        if current.as_deref() == Some(name.as_str()) {
            return Ok(());
        }
        if self.exists(&name).await? {
            return Err(FolioError::transport(format!("File {} already exists", name)));
        }

        if let Some(old) = current.as_deref() {
            if self.exists(old).await? {
                let source = self.path_for(old)?;
                fs::rename(&source, &target).await.map_err(|e| {
                    FolioError::transport(format!("Failed to rename {} to {}: {}", old, name, e))
                })?;
                tracing::debug!("Moved {} to {}", source.display(), target.display());
            }
        }

        *current = Some(name);
        Ok(())
    }

    async fn send_save(&self, request: SaveRequest) -> Result<()> {
        let path = self.path_for(&request.filename)?;
        let document = NotebookDocument::from(&request);
        let json = serde_json::to_string_pretty(&document)?;

        fs::write(&path, json).await.map_err(|e| {
            FolioError::transport(format!("Failed to write {}: {}", path.display(), e))
        })?;

        *self.current.write().await = Some(request.filename.clone());
        tracing::debug!("Wrote {} cells to {}", document.cells.len(), path.display());
        Ok(())
    }

    async fn send_interrupt(&self) -> Result<()> {
        let count = self.interrupts.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!("Interrupt requested ({} so far)", count);
        Ok(())
    }

    async fn send_format(
        &self,
        codes: HashMap<CellId, String>,
    ) -> Result<HashMap<CellId, String>> {
        Ok(codes
            .into_iter()
            .map(|(id, code)| (id, format_code(&code)))
            .collect())
    }
}

/// Strip trailing whitespace from each line and trailing blank lines
fn format_code(code: &str) -> String {
    let lines: Vec<&str> = code.lines().map(str::trim_end).collect();
    let end = lines
        .iter()
        .rposition(|line| !line.is_empty())
        .map(|i| i + 1)
        .unwrap_or(0);
    lines[..end].join("\n")
}
