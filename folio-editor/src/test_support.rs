//! Recording fakes for the collaborator traits

use crate::host::{
    HostServices, MemoryTitleSink, MemoryUrlParams, Notifier, QueuedNamePrompt,
};
use crate::notebook::CellId;
use crate::presentation::{OutputRegion, Rect, VisibleRegions};
use crate::transport::{NotebookTransport, SaveRequest};
use async_trait::async_trait;
use folio_core::{FolioError, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

/// Every call the shell made on the transport, in order
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    Rename(Option<String>),
    Save(SaveRequest),
    Interrupt,
    Format(usize),
}

#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<TransportCall>>,
    fail_rename: Mutex<Option<String>>,
    fail_save: Mutex<Option<String>>,
    format_suffix: Mutex<Option<String>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_renames(&self, message: &str) {
        *self.fail_rename.lock().unwrap() = Some(message.to_string());
    }

    pub fn reject_saves(&self, message: &str) {
        *self.fail_save.lock().unwrap() = Some(message.to_string());
    }

    /// Make the formatter append `suffix` to every cell
    pub fn format_by_appending(&self, suffix: &str) {
        *self.format_suffix.lock().unwrap() = Some(suffix.to_string());
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn saves(&self) -> Vec<SaveRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::Save(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn renames(&self) -> Vec<Option<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::Rename(name) => Some(name),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl NotebookTransport for RecordingTransport {
    async fn send_rename(&self, filename: Option<String>) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(TransportCall::Rename(filename));
        match self.fail_rename.lock().unwrap().clone() {
            Some(message) => Err(FolioError::transport(message)),
            None => Ok(()),
        }
    }

    async fn send_save(&self, request: SaveRequest) -> Result<()> {
        self.calls.lock().unwrap().push(TransportCall::Save(request));
        match self.fail_save.lock().unwrap().clone() {
            Some(message) => Err(FolioError::transport(message)),
            None => Ok(()),
        }
    }

    async fn send_interrupt(&self) -> Result<()> {
        self.calls.lock().unwrap().push(TransportCall::Interrupt);
        Ok(())
    }

    async fn send_format(
        &self,
        codes: HashMap<CellId, String>,
    ) -> Result<HashMap<CellId, String>> {
        self.calls
            .lock()
            .unwrap()
            .push(TransportCall::Format(codes.len()));
        let suffix = self.format_suffix.lock().unwrap().clone();
        Ok(match suffix {
            Some(suffix) => codes
                .into_iter()
                .map(|(id, code)| (id, format!("{}{}", code, suffix)))
                .collect(),
            None => codes,
        })
    }
}

/// Transport whose saves wait until the test lets them through
///
/// Each held gate blocks one save, in arrival order; saves with no gate left
/// are confirmed at once. Every request is reported on the arrivals channel
/// before it blocks.
pub struct GatedTransport {
    gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    saves: Mutex<Vec<SaveRequest>>,
    arrivals: mpsc::UnboundedSender<SaveRequest>,
}

impl GatedTransport {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<SaveRequest>) {
        let (arrivals, rx) = mpsc::unbounded_channel();
        let transport = Self {
            gates: Mutex::new(VecDeque::new()),
            saves: Mutex::new(Vec::new()),
            arrivals,
        };
        (Arc::new(transport), rx)
    }

    /// Hold the next unheld save until the returned sender fires or drops
    pub fn hold_next_save(&self) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        self.gates.lock().unwrap().push_back(gate);
        release
    }

    pub fn saves(&self) -> Vec<SaveRequest> {
        self.saves.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotebookTransport for GatedTransport {
    async fn send_rename(&self, _filename: Option<String>) -> Result<()> {
        Ok(())
    }

    async fn send_save(&self, request: SaveRequest) -> Result<()> {
        self.saves.lock().unwrap().push(request.clone());
        let gate = self.gates.lock().unwrap().pop_front();
        let _ = self.arrivals.send(request);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        Ok(())
    }

    async fn send_interrupt(&self) -> Result<()> {
        Ok(())
    }

    async fn send_format(
        &self,
        codes: HashMap<CellId, String>,
    ) -> Result<HashMap<CellId, String>> {
        Ok(codes)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub alerts: Mutex<Vec<String>>,
    pub toasts: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }

    pub fn toasts(&self) -> Vec<String> {
        self.toasts.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn show_alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }

    fn show_toast(&self, title: &str) {
        self.toasts.lock().unwrap().push(title.to_string());
    }
}

/// Concrete handles on every fake, plus the bundle handed to the shell
pub struct Fakes {
    pub transport: Arc<RecordingTransport>,
    pub notifier: Arc<RecordingNotifier>,
    pub prompt: Arc<QueuedNamePrompt>,
    pub url_params: Arc<MemoryUrlParams>,
    pub title_sink: Arc<MemoryTitleSink>,
}

impl Fakes {
    pub fn new() -> Self {
        Self {
            transport: Arc::new(RecordingTransport::new()),
            notifier: Arc::new(RecordingNotifier::default()),
            prompt: Arc::new(QueuedNamePrompt::new()),
            url_params: Arc::new(MemoryUrlParams::new()),
            title_sink: Arc::new(MemoryTitleSink::new()),
        }
    }

    pub fn services(&self) -> HostServices {
        HostServices {
            transport: self.transport.clone(),
            notifier: self.notifier.clone(),
            name_prompt: self.prompt.clone(),
            url_params: self.url_params.clone(),
            title_sink: self.title_sink.clone(),
        }
    }
}

/// Output regions laid out top to bottom, 100px each
pub struct StackedRegions {
    regions: Vec<OutputRegion>,
    viewport: Rect,
    pub scrolled_to: Mutex<Vec<CellId>>,
    pub queried: AtomicBool,
    pub scroll_calls: AtomicUsize,
}

impl StackedRegions {
    pub fn new(cells: &[&str], viewport: Rect) -> Self {
        let regions = cells
            .iter()
            .enumerate()
            .map(|(i, id)| OutputRegion {
                cell_id: CellId::new(*id),
                bounds: Rect::new(i as f64 * 100.0, 0.0, 800.0, 100.0),
            })
            .collect();
        Self {
            regions,
            viewport,
            scrolled_to: Mutex::new(Vec::new()),
            queried: AtomicBool::new(false),
            scroll_calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(&[], Rect::new(0.0, 0.0, 800.0, 600.0))
    }

    pub fn scrolled_to(&self) -> Vec<CellId> {
        self.scrolled_to.lock().unwrap().clone()
    }
}

impl VisibleRegions for StackedRegions {
    fn output_regions(&self) -> Vec<OutputRegion> {
        self.queried.store(true, Ordering::SeqCst);
        self.regions.clone()
    }

    fn viewport(&self) -> Rect {
        self.viewport
    }

    fn scroll_into_view(&self, cell_id: &CellId) {
        self.scroll_calls.fetch_add(1, Ordering::SeqCst);
        self.scrolled_to.lock().unwrap().push(cell_id.clone());
    }
}
