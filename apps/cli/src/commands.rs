//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};

use steamlib_core::{AggregateOptions, Aggregator, ProgressReporter};
use steamlib_shared::{
    AppConfig, Environment, Notebook, SteamError, init_config, load_config, load_token,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// steamlib: export notebooks, notes and tags as JSON.
#[derive(Parser)]
#[command(
    name = "steamlib",
    version,
    about = "Export notebooks, notes and tags from a note service account as JSON.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Export every notebook in the account with its notes.
    Notebooks {
        /// Report notebooks that fail to populate instead of aborting.
        #[arg(long)]
        lenient: bool,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Export the account's default notebook with its notes.
    Default {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Export one notebook by guid.
    Notebook {
        /// Notebook guid.
        guid: String,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags shared by every export command. Unset flags fall back to the config file.
#[derive(Args, Debug)]
pub(crate) struct RunArgs {
    /// Target the production service.
    #[arg(long, conflicts_with = "sandbox")]
    production: bool,

    /// Target the sandbox service.
    #[arg(long)]
    sandbox: bool,

    /// Follow note listings past the first page.
    #[arg(long)]
    all_pages: bool,

    /// Notes requested per listing page.
    #[arg(long)]
    page_size: Option<u32>,

    /// Cap on concurrent remote calls (0 = unbounded).
    #[arg(long)]
    max_in_flight: Option<usize>,

    /// Fetch each tag once per run.
    #[arg(long)]
    dedupe_tags: bool,

    /// Write JSON to this file instead of stdout.
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout carries JSON.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "steamlib=info",
        1 => "steamlib=debug",
        _ => "steamlib=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Notebooks { lenient, run } => cmd_notebooks(lenient, &run).await,
        Command::Default { run } => cmd_default(&run).await,
        Command::Notebook { guid, run } => cmd_notebook(&guid, &run).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// Merge config file values with command-line overrides.
fn resolve_config(run: &RunArgs) -> Result<AppConfig> {
    let mut config = load_config()?;

    if run.production {
        config.remote.environment = Environment::Production;
    } else if run.sandbox {
        config.remote.environment = Environment::Sandbox;
    }
    if run.all_pages {
        config.aggregate.all_pages = true;
    }
    if let Some(size) = run.page_size {
        config.aggregate.page_size = size;
    }
    if let Some(cap) = run.max_in_flight {
        config.aggregate.max_in_flight = cap;
    }
    if run.dedupe_tags {
        config.aggregate.dedupe_tags = true;
    }

    Ok(config)
}

fn connect(run: &RunArgs, progress: Arc<CliProgress>) -> Result<Aggregator> {
    let config = resolve_config(run)?;
    let token = load_token(&config)?;
    let aggregator = Aggregator::connect(token, &config.remote, AggregateOptions::from(&config))?
        .with_progress(progress);

    let options = aggregator.options();
    info!(
        page_size = options.page_size,
        all_pages = options.all_pages,
        max_in_flight = options.max_in_flight,
        dedupe_tags = options.dedupe_tags,
        "starting export"
    );

    Ok(aggregator)
}

/// Serialize `value` as pretty JSON to `out`, or stdout when unset.
fn write_json<T: Serialize>(value: &T, out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            std::fs::write(path, json)
                .wrap_err_with(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "export written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn summarize(notebooks: &[Notebook]) {
    let notes: usize = notebooks.iter().map(|nb| nb.notes.len()).sum();
    let unresolved: usize = notebooks
        .iter()
        .flat_map(|nb| &nb.notes)
        .map(|n| n.unresolved_tag_guids.len())
        .sum();
    info!(notebooks = notebooks.len(), notes, unresolved_tags = unresolved, "export complete");
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct LenientReport<'a> {
    notebooks: &'a [Notebook],
    failures: Vec<FailureReport<'a>>,
}

#[derive(Serialize)]
struct FailureReport<'a> {
    guid: &'a str,
    name: &'a str,
    error: String,
}

async fn cmd_notebooks(lenient: bool, run: &RunArgs) -> Result<()> {
    let progress = Arc::new(CliProgress::new());
    let aggregator = connect(run, progress.clone())?;

    if lenient {
        let snapshot = aggregator.list_all_notebooks_lenient().await;
        progress.finish();
        let snapshot = snapshot?;

        for failure in &snapshot.failures {
            warn!(notebook = %failure.name, error = %failure.error, "notebook skipped");
        }
        summarize(&snapshot.notebooks);

        let report = LenientReport {
            notebooks: &snapshot.notebooks,
            failures: snapshot
                .failures
                .iter()
                .map(|f| FailureReport {
                    guid: &f.guid,
                    name: &f.name,
                    error: f.error.to_string(),
                })
                .collect(),
        };
        return write_json(&report, run.out.as_deref());
    }

    let notebooks = aggregator.list_all_notebooks().await;
    progress.finish();
    let notebooks = notebooks?;

    summarize(&notebooks);
    write_json(&notebooks, run.out.as_deref())
}

async fn cmd_default(run: &RunArgs) -> Result<()> {
    let progress = Arc::new(CliProgress::new());
    let aggregator = connect(run, progress.clone())?;

    let notebook = aggregator.get_default_notebook_with_notes().await;
    progress.finish();
    let notebook = notebook?;

    summarize(std::slice::from_ref(&notebook));
    write_json(&notebook, run.out.as_deref())
}

async fn cmd_notebook(guid: &str, run: &RunArgs) -> Result<()> {
    let progress = Arc::new(CliProgress::new());
    let aggregator = connect(run, progress.clone())?;

    let notebook = aggregator.populate_notebook(guid, None, None).await;
    progress.finish();
    let notebook = notebook?;

    summarize(std::slice::from_ref(&notebook));
    write_json(&notebook, run.out.as_deref())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner on stderr.
struct CliProgress {
    spinner: ProgressBar,
    notes: AtomicUsize,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self {
            spinner,
            notes: AtomicUsize::new(0),
        }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn notebook_populated(&self, name: &str, note_count: usize) {
        self.spinner
            .println(format!("  {name}: {note_count} notes"));
    }

    fn note_assembled(&self, title: &str) {
        let done = self.notes.fetch_add(1, Ordering::Relaxed) + 1;
        self.spinner
            .set_message(format!("Assembled [{done}] {title}"));
    }

    fn tag_failed(&self, note_guid: &str, tag_guid: &str, _error: &SteamError) {
        self.spinner
            .set_message(format!("Tag {tag_guid} unavailable on note {note_guid}"));
    }
}
