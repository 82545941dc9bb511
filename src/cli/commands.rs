use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use clap::{Parser, Subcommand};
use chrono::{Local, NaiveDate};
use anyhow::{Context, Result};
use crate::cli::error::{user_error, validate_reference_date, validate_status, validate_thread_id};
use crate::cli::output::{
    format_decision, format_mapping_table, format_outcome, format_processed_list, format_summary,
    format_verdict, get_terminal_width,
};
use crate::config::{Config, ConfigError};
use crate::gate::QualityGateValidator;
use crate::intake::process_event;
use crate::lookup::{BoundedLookup, ExternalTaskLookup, ForumSnapshot, Offline, SnapshotLookup};
use crate::models::{MappingRecord, MappingStatus, ThreadId};
use crate::populate::MappingPopulator;
use crate::repo::{MappingStore, ProcessedStateStore};
use crate::resolver::ThreadResolver;

#[derive(Parser)]
#[command(name = "threadlink")]
#[command(about = "Reconcile intake forum threads with task-store entries and gate new submissions")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decide whether a task already exists for a thread
    Resolve {
        /// Forum thread ID
        thread_id: String,
        /// Forum/task-store snapshot (JSON); without it only the mapping table is consulted
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Bypass cached decisions and query the snapshot again
        #[arg(long)]
        no_cache: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Run the quality gate over a submission text
    Check {
        /// Read the submission from a file
        #[arg(long)]
        file: Option<PathBuf>,
        /// Date relative deadlines are measured from (YYYY-MM-DD, default today)
        #[arg(long = "reference-date")]
        reference_date: Option<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Submission text (reads stdin when omitted)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Handle a forum event: resolve the thread, gate the submission if no task exists
    Intake {
        /// Forum thread ID
        thread_id: String,
        /// Forum/task-store snapshot (JSON)
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Date relative deadlines are measured from (YYYY-MM-DD, default today)
        #[arg(long = "reference-date")]
        reference_date: Option<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Submission text (defaults to the thread's starter message)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Rebuild the mapping table from a full forum scan
    Populate {
        /// Forum/task-store snapshot (JSON)
        #[arg(long)]
        snapshot: PathBuf,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Mapping table commands
    Mapping {
        #[command(subcommand)]
        subcommand: MappingCommands,
    },
    /// Processed state commands
    Processed {
        #[command(subcommand)]
        subcommand: ProcessedCommands,
    },
}

#[derive(Subcommand)]
pub enum MappingCommands {
    /// List mapping rows
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Create or edit a mapping row
    Set {
        /// Forum thread ID
        thread_id: String,
        /// approved, pending or ignored
        #[arg(long)]
        status: String,
        /// Task URL (required for approved)
        #[arg(long)]
        url: Option<String>,
        /// Thread title
        #[arg(long)]
        title: Option<String>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ProcessedCommands {
    /// List processed threads
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Drop the stored decision for a thread
    Forget {
        /// Forum thread ID
        thread_id: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    handle_command(cli)
}

fn handle_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Resolve { thread_id, snapshot, no_cache, json } => {
            handle_resolve(&thread_id, snapshot.as_deref(), no_cache, json)
        }
        Commands::Check { file, reference_date, json, text } => {
            handle_check(file.as_deref(), reference_date.as_deref(), json, text)
        }
        Commands::Intake { thread_id, snapshot, reference_date, json, text } => {
            handle_intake(&thread_id, snapshot.as_deref(), reference_date.as_deref(), json, text)
        }
        Commands::Populate { snapshot, json } => handle_populate(&snapshot, json),
        Commands::Mapping { subcommand } => match subcommand {
            MappingCommands::List { json } => handle_mapping_list(json),
            MappingCommands::Set { thread_id, status, url, title, notes } => {
                handle_mapping_set(&thread_id, &status, url, title, notes)
            }
        },
        Commands::Processed { subcommand } => match subcommand {
            ProcessedCommands::List { json } => handle_processed_list(json),
            ProcessedCommands::Forget { thread_id } => handle_processed_forget(&thread_id),
        },
    }
}

fn load_config() -> Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(ConfigError::InvalidValue { key, value, line }) => {
            user_error(&format!("Invalid rc value for {} on line {}: '{}'", key, line, value))
        }
        Err(e) => Err(e).context("Failed to load configuration"),
    }
}

fn load_snapshot(path: &Path, config: &Config) -> Arc<SnapshotLookup> {
    match ForumSnapshot::load(path) {
        Ok(snapshot) => {
            Arc::new(SnapshotLookup::new(snapshot).with_database_id(config.notion_database_id.clone()))
        }
        Err(e) => user_error(&format!("{:#}", e)),
    }
}

fn parse_reference(reference_date: Option<&str>) -> NaiveDate {
    match reference_date {
        Some(date) => validate_reference_date(date).unwrap_or_else(|e| user_error(&e)),
        None => Local::now().date_naive(),
    }
}

fn parse_thread_id(id: &str) -> ThreadId {
    validate_thread_id(id).unwrap_or_else(|e| user_error(&e))
}

/// Wiring shared by the commands that resolve threads
struct Runtime {
    config: Config,
    resolver: ThreadResolver,
    snapshot: Option<Arc<SnapshotLookup>>,
}

impl Runtime {
    fn build(snapshot_path: Option<&Path>, reuse_cached: bool) -> Result<Self> {
        let config = load_config()?;
        let mapping = Arc::new(MappingStore::open(&config.mapping_path));
        let processed = Arc::new(
            ProcessedStateStore::open(&config.state_path)
                .with_context(|| format!("Failed to open state database {}", config.state_path.display()))?,
        );

        let snapshot = snapshot_path.map(|path| load_snapshot(path, &config));
        let lookup: Arc<dyn ExternalTaskLookup> = match &snapshot {
            Some(lookup) => Arc::new(BoundedLookup::new(Arc::clone(lookup), config.lookup_timeout)),
            None => {
                log::info!("No snapshot given; only the mapping table and processed state are consulted");
                Arc::new(Offline)
            }
        };

        let mut resolver = ThreadResolver::new(mapping, processed, lookup);
        if !reuse_cached {
            resolver = resolver.without_cache();
        }
        Ok(Self { config, resolver, snapshot })
    }
}

fn handle_resolve(thread_id: &str, snapshot: Option<&Path>, no_cache: bool, json: bool) -> Result<()> {
    let thread_id = parse_thread_id(thread_id);
    let ctx = Runtime::build(snapshot, !no_cache)?;
    let decision = ctx.resolver.resolve(thread_id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
    } else {
        println!("{}", format_decision(&decision));
    }
    Ok(())
}

fn read_submission(file: Option<&Path>, text: Vec<String>) -> Result<String> {
    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read submission from {}", path.display()));
    }
    if !text.is_empty() {
        return Ok(text.join(" "));
    }
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read submission from stdin")?;
    Ok(buffer)
}

fn handle_check(file: Option<&Path>, reference_date: Option<&str>, json: bool, text: Vec<String>) -> Result<()> {
    let reference = parse_reference(reference_date);
    let config = load_config()?;
    let submission = match read_submission(file, text) {
        Ok(submission) => submission,
        Err(e) => user_error(&format!("{:#}", e)),
    };

    let gate = QualityGateValidator::with_min_words(config.context_min_words);
    let verdict = gate.evaluate_at(&submission, reference);

    if json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        println!("{}", format_verdict(&verdict));
    }
    Ok(())
}

fn handle_intake(
    thread_id: &str,
    snapshot: Option<&Path>,
    reference_date: Option<&str>,
    json: bool,
    text: Vec<String>,
) -> Result<()> {
    let thread_id = parse_thread_id(thread_id);
    let reference = parse_reference(reference_date);
    let ctx = Runtime::build(snapshot, true)?;
    let gate = QualityGateValidator::with_min_words(ctx.config.context_min_words);

    let outcome = process_event(&ctx.resolver, &gate, thread_id, reference, || {
        if !text.is_empty() {
            return text.join(" ");
        }
        ctx.snapshot
            .as_ref()
            .and_then(|lookup| lookup.thread(thread_id))
            .and_then(|thread| thread.starter_text.clone())
            .unwrap_or_default()
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", format_outcome(&outcome));
    }
    Ok(())
}

fn handle_populate(snapshot: &Path, json: bool) -> Result<()> {
    let config = load_config()?;
    let directory = load_snapshot(snapshot, &config);
    let lookup = BoundedLookup::new(Arc::clone(&directory), config.lookup_timeout);
    let store = MappingStore::open(&config.mapping_path);

    let summary = MappingPopulator::new(directory.as_ref(), &lookup).rebuild(&store)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", format_summary(&summary));
        println!("Saved to {}", config.mapping_path.display());
    }
    Ok(())
}

fn handle_mapping_list(json: bool) -> Result<()> {
    let config = load_config()?;
    if !config.mapping_path.exists() {
        if json {
            println!("[]");
        } else {
            println!("No mapping table at {}.", config.mapping_path.display());
        }
        return Ok(());
    }

    let store = MappingStore::open(&config.mapping_path);
    let table = store.snapshot()?;
    let records: Vec<&MappingRecord> = table.records().collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        println!("{}", format_mapping_table(&records, get_terminal_width()));
    }
    Ok(())
}

fn handle_mapping_set(
    thread_id: &str,
    status: &str,
    url: Option<String>,
    title: Option<String>,
    notes: Option<String>,
) -> Result<()> {
    let thread_id = parse_thread_id(thread_id);
    let status = validate_status(status).unwrap_or_else(|e| user_error(&e));
    let config = load_config()?;
    let store = MappingStore::open(&config.mapping_path);

    let record = store.update(|table| {
        let existing = table.get(thread_id).cloned();
        let title = title
            .or_else(|| existing.as_ref().map(|r| r.thread_title.clone()))
            .unwrap_or_default();
        let mut record = MappingRecord::new(thread_id, title, status);
        // A stored link only carries over while the row stays approved
        let inherited = match status {
            MappingStatus::Approved => existing.as_ref().and_then(|r| r.task_url.clone()),
            MappingStatus::Pending | MappingStatus::Ignored => None,
        };
        if let Some(url) = url.or(inherited) {
            record = record.with_url(url);
        }
        if let Some(notes) = notes.or_else(|| existing.map(|r| r.notes)) {
            record = record.with_notes(notes);
        }
        table.insert(record.clone());
        record
    })?;

    if let Some(reason) = record.inconsistency() {
        eprintln!("Warning: thread {} is {}; it will be treated as pending.", thread_id, reason);
    }
    println!("Set thread {} to {}.", thread_id, record.status.as_str());
    Ok(())
}

fn open_processed(config: &Config) -> Result<ProcessedStateStore> {
    ProcessedStateStore::open(&config.state_path)
        .with_context(|| format!("Failed to open state database {}", config.state_path.display()))
}

fn handle_processed_list(json: bool) -> Result<()> {
    let config = load_config()?;
    let records = open_processed(&config)?.list()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        println!("{}", format_processed_list(&records));
    }
    Ok(())
}

fn handle_processed_forget(thread_id: &str) -> Result<()> {
    let thread_id = parse_thread_id(thread_id);
    let config = load_config()?;
    if open_processed(&config)?.invalidate(thread_id)? {
        println!("Forgot stored decision for thread {}.", thread_id);
    } else {
        user_error(&format!("No stored decision for thread {}.", thread_id));
    }
    Ok(())
}
