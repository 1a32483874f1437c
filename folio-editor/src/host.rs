//! Host-page collaborators: URL parameters, document title, notifications
//! and the naming dialog, plus in-memory implementations of each.

use crate::transport::NotebookTransport;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// URL query parameter that mirrors the filename
pub const FILE_PARAM: &str = "file";

/// Query-string store of the host page
pub trait UrlParams: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn delete(&self, key: &str);
}

/// Document title; last writer wins
pub trait TitleSink: Send + Sync {
    fn set_title(&self, title: &str);
}

/// Fire-and-forget user notifications
pub trait Notifier: Send + Sync {
    /// Blocking, modal message
    fn show_alert(&self, message: &str);

    /// Transient confirmation
    fn show_toast(&self, title: &str);
}

/// The "name this notebook" dialog
#[async_trait]
pub trait NamePrompt: Send + Sync {
    /// Resolve to the submitted name, or `None` if the dialog was dismissed
    async fn prompt_for_name(&self) -> Option<String>;
}

/// Everything the shell needs from its environment
#[derive(Clone)]
pub struct HostServices {
    pub transport: Arc<dyn NotebookTransport>,
    pub notifier: Arc<dyn Notifier>,
    pub name_prompt: Arc<dyn NamePrompt>,
    pub url_params: Arc<dyn UrlParams>,
    pub title_sink: Arc<dyn TitleSink>,
}

/// In-memory query string
#[derive(Debug, Default)]
pub struct MemoryUrlParams {
    params: Mutex<HashMap<String, String>>,
}

impl MemoryUrlParams {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UrlParams for MemoryUrlParams {
    fn get(&self, key: &str) -> Option<String> {
        self.params
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.params
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
    }

    fn delete(&self, key: &str) {
        self.params
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }
}

/// In-memory document title
#[derive(Debug, Default)]
pub struct MemoryTitleSink {
    title: Mutex<String>,
}

impl MemoryTitleSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> String {
        self.title.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl TitleSink for MemoryTitleSink {
    fn set_title(&self, title: &str) {
        *self.title.lock().unwrap_or_else(|e| e.into_inner()) = title.to_string();
    }
}

/// Notifier that reports through `tracing`
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn show_alert(&self, message: &str) {
        tracing::warn!(target: "folio::alert", "{}", message);
    }

    fn show_toast(&self, title: &str) {
        tracing::info!(target: "folio::toast", "{}", title);
    }
}

/// Name prompt answered from a queue of prepared answers
///
/// An empty queue behaves like a dismissed dialog.
#[derive(Debug, Default)]
pub struct QueuedNamePrompt {
    answers: Mutex<VecDeque<String>>,
    opened: AtomicUsize,
}

impl QueuedNamePrompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the answer for the next time the dialog opens
    pub fn push_answer<S: Into<String>>(&self, answer: S) {
        self.answers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(answer.into());
    }

    /// How many times the dialog has been opened
    pub fn times_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NamePrompt for QueuedNamePrompt {
    async fn prompt_for_name(&self) -> Option<String> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let answer = self
            .answers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        tracing::debug!("Name prompt answered with {:?}", answer);
        answer
    }
}
