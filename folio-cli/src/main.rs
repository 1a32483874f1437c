//! Folio CLI - drives the notebook edit shell from a script

mod script;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::{Arg, ArgMatches, Command};
use folio_core::event::serialization;
use folio_core::{Config, EditorEvent, EventBus, EventHandler, InMemoryEventBus, SessionSummary};
use folio_editor::{
    EditApp, FileTransport, HostServices, MemoryTitleSink, MemoryUrlParams, QueuedNamePrompt,
    TracingNotifier,
};
use script::{load_script, ScriptReport, ScriptRunner};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Arguments of `folio run`
#[derive(Debug, Clone)]
pub struct Args {
    pub script: PathBuf,
    pub config_file: Option<PathBuf>,
    pub notebooks_dir: Option<PathBuf>,
    pub open: Option<String>,
    pub events: bool,
    pub dev_mode: bool,
}

impl Args {
    fn command() -> Command {
        Command::new("folio")
            .version("0.1.0")
            .about("Edit-mode shell for Folio notebooks")
            .long_about(
                "Folio keeps track of unsaved notebook changes, saves and renames notebooks \
                through a backend, autosaves after edits settle and guards page closes. \
                The `run` command plays a scripted edit session against notebooks stored \
                as JSON files in a directory.",
            )
            .subcommand_required(true)
            .arg_required_else_help(true)
            .subcommand(
                Command::new("run")
                    .about("Play a scripted edit session")
                    .arg(
                        Arg::new("script")
                            .help("JSON file with the steps to run")
                            .required(true)
                            .index(1)
                            .value_parser(clap::value_parser!(PathBuf)),
                    )
                    .arg(
                        Arg::new("config")
                            .short('c')
                            .long("config")
                            .help("Path to configuration file (JSON format)")
                            .long_help(
                                "Path to a JSON configuration file. Without it the file \
                                folio/config.json in the user configuration directory is used \
                                when present. FOLIO_* environment variables override both.",
                            )
                            .value_parser(clap::value_parser!(PathBuf)),
                    )
                    .arg(
                        Arg::new("notebooks-dir")
                            .long("notebooks-dir")
                            .help("Directory the notebooks are stored in")
                            .value_parser(clap::value_parser!(PathBuf)),
                    )
                    .arg(
                        Arg::new("open")
                            .long("open")
                            .help("Open an existing notebook from the notebooks directory")
                            .value_parser(clap::value_parser!(String)),
                    )
                    .arg(
                        Arg::new("events")
                            .long("events")
                            .help("Write editor events to stdout as JSON lines")
                            .action(clap::ArgAction::SetTrue),
                    )
                    .arg(
                        Arg::new("dev-mode")
                            .long("dev-mode")
                            .help("Enable development mode with verbose, pretty logging")
                            .action(clap::ArgAction::SetTrue),
                    ),
            )
            .after_help(
                "EXAMPLES:\n    \
                folio run session.json                          Run a script with defaults\n    \
                folio run session.json --open report.json       Edit an existing notebook\n    \
                folio run session.json --events                 Stream events as JSON lines\n    \
                folio run session.json --notebooks-dir ./nbs    Store notebooks in ./nbs",
            )
    }

    /// Parse command line arguments
    pub fn parse() -> Self {
        let matches = Self::command().get_matches();
        match matches.subcommand() {
            Some(("run", run)) => Self::from_run_matches(run),
            _ => unreachable!("clap requires a subcommand"),
        }
    }

    fn from_run_matches(matches: &ArgMatches) -> Self {
        Self {
            script: matches
                .get_one::<PathBuf>("script")
                .cloned()
                .unwrap_or_default(),
            config_file: matches.get_one::<PathBuf>("config").cloned(),
            notebooks_dir: matches.get_one::<PathBuf>("notebooks-dir").cloned(),
            open: matches.get_one::<String>("open").cloned(),
            events: matches.get_flag("events"),
            dev_mode: matches.get_flag("dev-mode"),
        }
    }

    /// Check paths before anything is started
    pub fn validate(&self) -> Result<()> {
        if !self.script.exists() {
            bail!(
                "Script not found: {}\n\n\
                Please check that the path is correct.\n\n\
                Example: folio run session.json",
                self.script.display()
            );
        }
        if self.script.is_dir() {
            bail!(
                "Script path is a directory, not a file: {}",
                self.script.display()
            );
        }

        if let Some(config_file) = &self.config_file {
            if !config_file.is_file() {
                bail!(
                    "Configuration file not found: {}\n\n\
                    Example: folio run session.json --config config.json",
                    config_file.display()
                );
            }
        }

        if let Some(dir) = &self.notebooks_dir {
            if dir.exists() && !dir.is_dir() {
                bail!("Notebooks path is not a directory: {}", dir.display());
            }
        }

        Ok(())
    }

    /// Load configuration: file, then environment, then CLI overrides
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config_file {
            Some(path) => {
                info!("Loading configuration from: {}", path.display());
                Config::from_file(path).with_context(|| {
                    format!("Failed to load configuration file {}", path.display())
                })?
            }
            None => {
                let default_path = dirs::config_dir().map(|dir| dir.join("folio").join("config.json"));
                Config::load_or_default(default_path.as_deref())?
            }
        };

        config.apply_environment_overrides(&Config::environment_overrides())?;

        if let Some(dir) = &self.notebooks_dir {
            config.storage.notebooks_dir = dir.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

/// Writes every event to stdout as one JSON line
struct JsonLinesHandler;

#[async_trait]
impl EventHandler for JsonLinesHandler {
    async fn handle_event(&self, event: &EditorEvent) -> folio_core::Result<()> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        serialization::write_event(&mut out, event)
    }

    fn handler_name(&self) -> &str {
        "json-lines"
    }
}

fn init_logging(dev_mode: bool) {
    let default_level = if dev_mode { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout is reserved for events and the summary
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(dev_mode)
        .with_line_number(dev_mode)
        .with_file(dev_mode);

    if dev_mode {
        subscriber.pretty().init();
        info!("Development mode enabled");
    } else {
        subscriber.init();
    }
}

fn print_summary(summary: &SessionSummary, report: &ScriptReport, to_stderr: bool) {
    let lines = [
        format!(
            "File: {}",
            summary.filename.as_deref().unwrap_or("(unnamed)")
        ),
        format!("Title: {}", summary.title),
        format!("Cells: {}", summary.cell_count),
        format!(
            "Unsaved changes: {}",
            if summary.needs_save { "yes" } else { "no" }
        ),
        format!("View mode: {}", summary.view_mode),
        format!("Connection: {}", summary.connection),
        format!("Steps: {} run, {} failed", report.executed, report.failed),
    ];
    for line in lines {
        if to_stderr {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = args.load_config()?;
    let steps = load_script(&args.script)?;

    let transport = Arc::new(FileTransport::new(config.storage.notebooks_dir.clone()));
    transport.initialize().await?;

    let event_bus = Arc::new(InMemoryEventBus::new());
    if args.events {
        event_bus.subscribe(Arc::new(JsonLinesHandler)).await?;
    }

    let prompt = Arc::new(QueuedNamePrompt::new());
    let services = HostServices {
        transport: transport.clone(),
        notifier: Arc::new(TracingNotifier),
        name_prompt: prompt.clone(),
        url_params: Arc::new(MemoryUrlParams::new()),
        title_sink: Arc::new(MemoryTitleSink::new()),
    };

    let app = match &args.open {
        Some(name) => {
            let notebook = transport
                .load(name)
                .await
                .with_context(|| format!("Failed to open notebook {}", name))?;
            EditApp::open(config, services, event_bus, Some(name.clone()), notebook).await
        }
        None => EditApp::new(config, services, event_bus).await,
    };
    let app = Arc::new(app);
    app.start_autosave().await;

    info!("Running {} steps from {}", steps.len(), args.script.display());
    let runner = ScriptRunner::new(app.clone(), prompt);

    let report = tokio::select! {
        report = runner.run(&steps) => report,
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            warn!("Interrupted; stopping script");
            ScriptReport::default()
        }
    };

    app.close().await;
    print_summary(&app.summary().await, &report, args.events);
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.dev_mode);

    if let Err(e) = args.validate() {
        eprintln!("Invalid arguments:\n{}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(args).await {
        error!("{:#}", e);
        eprintln!("folio failed: {:#}", e);
        std::process::exit(1);
    }
}
