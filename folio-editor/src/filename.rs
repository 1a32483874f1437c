//! The notebook's persisted name

use std::sync::Arc;
use tokio::sync::RwLock;

/// Source of truth for the current filename; `None` means never saved
#[derive(Clone, Debug, Default)]
pub struct FilenameRegistry {
    filename: Arc<RwLock<Option<String>>>,
}

impl FilenameRegistry {
    pub fn new(filename: Option<String>) -> Self {
        Self {
            filename: Arc::new(RwLock::new(filename)),
        }
    }

    pub async fn get(&self) -> Option<String> {
        self.filename.read().await.clone()
    }

    pub async fn set(&self, filename: Option<String>) {
        *self.filename.write().await = filename;
    }
}
