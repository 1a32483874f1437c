//! Scripted edit sessions
//!
//! A script is a JSON array of steps, each tagged with `op`:
//!
//! ```json
//! [
//!   {"op": "connect"},
//!   {"op": "add_cell", "id": "setup", "code": "import math"},
//!   {"op": "answer_prompt", "name": "circle.json"},
//!   {"op": "save"},
//!   {"op": "wait", "ms": 1500}
//! ]
//! ```

use anyhow::{Context, Result};
use folio_core::ConnectionState;
use folio_editor::{
    Cell, CellConfig, CellId, EditApp, OutputRegion, QueuedNamePrompt, Rect, UnloadDecision,
    VisibleRegions,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Height given to each listed output region
const REGION_HEIGHT: f64 = 100.0;

/// One scripted user or backend action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Backend connection opens
    Connect,
    /// Backend connection closes
    Disconnect,
    AddCell {
        #[serde(default)]
        id: Option<String>,
        code: String,
        #[serde(default)]
        name: Option<String>,
    },
    EditCell { id: String, code: String },
    RenameCell { id: String, name: String },
    ConfigureCell { id: String, config: CellConfig },
    DeleteCell { id: String },
    SetLayout {
        #[serde(default)]
        layout: Option<serde_json::Value>,
    },
    /// Queue the answer for the next name prompt
    AnswerPrompt { name: String },
    Save,
    Rename {
        #[serde(default)]
        name: Option<String>,
    },
    SetAppTitle { title: String },
    /// `visible` lists the cells on screen, top to bottom; defaults to all
    TogglePresentation {
        #[serde(default)]
        visible: Option<Vec<String>>,
    },
    Hotkey {
        chord: String,
        #[serde(default)]
        visible: Option<Vec<String>>,
    },
    Interrupt,
    /// Try to close the page; stops the script
    Close,
    Wait { ms: u64 },
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::Connect => "connect",
            Step::Disconnect => "disconnect",
            Step::AddCell { .. } => "add_cell",
            Step::EditCell { .. } => "edit_cell",
            Step::RenameCell { .. } => "rename_cell",
            Step::ConfigureCell { .. } => "configure_cell",
            Step::DeleteCell { .. } => "delete_cell",
            Step::SetLayout { .. } => "set_layout",
            Step::AnswerPrompt { .. } => "answer_prompt",
            Step::Save => "save",
            Step::Rename { .. } => "rename",
            Step::SetAppTitle { .. } => "set_app_title",
            Step::TogglePresentation { .. } => "toggle_presentation",
            Step::Hotkey { .. } => "hotkey",
            Step::Interrupt => "interrupt",
            Step::Close => "close",
            Step::Wait { .. } => "wait",
        }
    }
}

/// Read and parse a script file
pub fn load_script(path: &Path) -> Result<Vec<Step>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    let steps: Vec<Step> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse script {}", path.display()))?;
    Ok(steps)
}

/// Output regions stacked top to bottom inside a fixed viewport
pub struct ListedRegions {
    regions: Vec<OutputRegion>,
    viewport: Rect,
    scrolled: Mutex<Vec<CellId>>,
}

impl ListedRegions {
    pub fn new(ids: &[CellId]) -> Self {
        let regions = ids
            .iter()
            .enumerate()
            .map(|(i, id)| OutputRegion {
                cell_id: id.clone(),
                bounds: Rect::new(i as f64 * REGION_HEIGHT, 0.0, 800.0, REGION_HEIGHT),
            })
            .collect();
        Self {
            regions,
            viewport: Rect::new(0.0, 0.0, 800.0, 600.0),
            scrolled: Mutex::new(Vec::new()),
        }
    }

    pub fn scrolled(&self) -> Vec<CellId> {
        self.scrolled
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl VisibleRegions for ListedRegions {
    fn output_regions(&self) -> Vec<OutputRegion> {
        self.regions.clone()
    }

    fn viewport(&self) -> Rect {
        self.viewport
    }

    fn scroll_into_view(&self, cell_id: &CellId) {
        debug!("Scrolling {} into view", cell_id);
        self.scrolled
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(cell_id.clone());
    }
}

/// What happened over a whole script
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScriptReport {
    pub executed: usize,
    pub failed: usize,
    pub unload: Option<UnloadDecision>,
}

/// Plays a script against an [`EditApp`]
pub struct ScriptRunner {
    app: Arc<EditApp>,
    prompt: Arc<QueuedNamePrompt>,
}

impl ScriptRunner {
    pub fn new(app: Arc<EditApp>, prompt: Arc<QueuedNamePrompt>) -> Self {
        Self { app, prompt }
    }

    /// Run every step in order
    ///
    /// A failing step is logged and counted; later steps still run. A
    /// `close` step ends the script.
    pub async fn run(&self, steps: &[Step]) -> ScriptReport {
        let mut report = ScriptReport::default();

        for (index, step) in steps.iter().enumerate() {
            debug!("Step {}: {}", index + 1, step.name());
            report.executed += 1;

            if let Step::Close = step {
                let decision = self.app.before_unload().await;
                match &decision {
                    UnloadDecision::Allow => info!("Page closed"),
                    UnloadDecision::Block { message } => warn!("Close blocked: {}", message),
                }
                report.unload = Some(decision);
                break;
            }

            if let Err(e) = self.run_step(step).await {
                warn!("Step {} ({}) failed: {}", index + 1, step.name(), e);
                report.failed += 1;
            }
        }

        report
    }

    async fn run_step(&self, step: &Step) -> Result<()> {
        match step {
            Step::Connect => {
                self.app.set_connection_state(ConnectionState::Open).await;
            }
            Step::Disconnect => {
                self.app.set_connection_state(ConnectionState::Closed).await;
            }
            Step::AddCell { id, code, name } => {
                let mut cell = match id {
                    Some(id) => Cell::with_id(CellId::new(id.as_str()), code.as_str()),
                    None => Cell::new(code.as_str()),
                };
                if let Some(name) = name {
                    cell = cell.named(name.as_str());
                }
                self.app.insert_cell(cell).await;
            }
            Step::EditCell { id, code } => {
                self.app
                    .update_cell_code(&CellId::new(id.as_str()), code)
                    .await?;
            }
            Step::RenameCell { id, name } => {
                self.app.rename_cell(&CellId::new(id.as_str()), name).await?;
            }
            Step::ConfigureCell { id, config } => {
                self.app
                    .set_cell_config(&CellId::new(id.as_str()), config.clone())
                    .await?;
            }
            Step::DeleteCell { id } => {
                self.app.delete_cell(&CellId::new(id.as_str())).await?;
            }
            Step::SetLayout { layout } => {
                self.app.set_layout(layout.clone()).await;
            }
            Step::AnswerPrompt { name } => {
                self.prompt.push_answer(name.as_str());
            }
            Step::Save => {
                let outcome = self.app.save().await?;
                info!("Save: {:?}", outcome);
            }
            Step::Rename { name } => {
                self.app.rename(name.clone()).await?;
            }
            Step::SetAppTitle { title } => {
                self.app.set_app_title(title).await;
            }
            Step::TogglePresentation { visible } => {
                let regions = self.regions(visible.as_deref()).await;
                let state = self.app.toggle_presentation(&regions).await;
                self.app.presentation_rendered(&regions).await;
                info!("View mode: {} (anchor: {:?})", state.mode, state.cell_anchor);
            }
            Step::Hotkey { chord, visible } => {
                let regions = self.regions(visible.as_deref()).await;
                match self.app.handle_hotkey(chord, &regions).await? {
                    Some(action) => info!("Hotkey {} ran {:?}", chord, action),
                    None => debug!("Hotkey {} is unbound", chord),
                }
            }
            Step::Interrupt => self.app.interrupt().await,
            Step::Wait { ms } => tokio::time::sleep(Duration::from_millis(*ms)).await,
            Step::Close => {}
        }
        Ok(())
    }

    async fn regions(&self, visible: Option<&[String]>) -> ListedRegions {
        let ids: Vec<CellId> = match visible {
            Some(ids) => ids.iter().map(|id| CellId::new(id.as_str())).collect(),
            None => {
                self.app
                    .notebook()
                    .read(|nb| nb.cells().iter().map(|c| c.id.clone()).collect())
                    .await
            }
        };
        ListedRegions::new(&ids)
    }
}
