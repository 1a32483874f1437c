//! Document title derivation

use crate::host::TitleSink;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Title used when neither an app title nor a filename is available
pub const DEFAULT_TITLE: &str = "Untitled Notebook";

/// Title precedence: app title, then the filename's base name, then the default
pub fn derive_title(app_title: &str, filename: Option<&str>) -> String {
    if !app_title.is_empty() {
        return app_title.to_string();
    }

    filename
        .and_then(|name| Path::new(name).file_name())
        .map(|base| base.to_string_lossy().into_owned())
        .filter(|base| !base.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

/// Keeps the document title in step with the app title and filename
pub struct TitleManager {
    sink: Arc<dyn TitleSink>,
    app_title: RwLock<String>,
    current: RwLock<String>,
}

impl TitleManager {
    pub fn new(sink: Arc<dyn TitleSink>, app_title: String) -> Self {
        Self {
            sink,
            app_title: RwLock::new(app_title),
            current: RwLock::new(String::new()),
        }
    }

    pub async fn app_title(&self) -> String {
        self.app_title.read().await.clone()
    }

    /// Last title written to the sink
    pub async fn current(&self) -> String {
        self.current.read().await.clone()
    }

    /// Change the app title and recompute
    pub async fn set_app_title(&self, app_title: String, filename: Option<&str>) -> String {
        *self.app_title.write().await = app_title;
        self.refresh(filename).await
    }

    /// Recompute the title for `filename` and push it to the sink
    pub async fn refresh(&self, filename: Option<&str>) -> String {
        let title = derive_title(&self.app_title.read().await, filename);
        self.sink.set_title(&title);
        *self.current.write().await = title.clone();
        tracing::trace!("Document title set to {}", title);
        title
    }
}
