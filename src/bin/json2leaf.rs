//! json2leaf: Flatten a directory of JSON/XML documents into one leaf table
//!
//! Usage:
//!   # Write a PostgreSQL COPY script for every .json/.xml file under ./data
//!   json2leaf ./data
//!
//!   # Split nested objects into their own tables and write JSON Lines
//!   json2leaf ./data --table-name ObjectA__SubObject --format jsonl -o leaves.jsonl
//!
//!   # Use a YAML config, redact names and draw the table graph
//!   json2leaf ./data --config mapping.yaml --redact --graph tables.dot

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use json2leaf::{document, ColumnOverride, Config, CopyWriter, Graph, JsonLinesWriter, Leaf, Mapper, Redactor, Replacer, Substitution};
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(name = "json2leaf")]
#[command(about = "Flatten nested JSON/XML documents into leaf rows for bulk loading", long_about = None)]
struct Args {
    /// Directory searched recursively for .json and .xml files
    #[arg(value_name = "INPUT_DIR")]
    input: PathBuf,

    /// YAML mapping configuration
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Column path that starts its own table (repeatable)
    #[arg(long = "table-name", value_name = "PATH")]
    table_names: Vec<String>,

    /// Column override as table,column,new_table,new_column (repeatable)
    #[arg(long = "override", value_name = "ENTRY")]
    overrides: Vec<String>,

    /// Column name substitution as from=to (repeatable, applied in order)
    #[arg(long = "column-sub", value_name = "FROM=TO")]
    column_subs: Vec<String>,

    /// Table name substitution as from=to (repeatable, applied in order)
    #[arg(long = "table-sub", value_name = "FROM=TO")]
    table_subs: Vec<String>,

    /// Output file
    #[arg(long, short = 'o', default_value = "output.sql")]
    output: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Copy)]
    format: OutputFormat,

    /// Also write a Graphviz DOT graph of the tables
    #[arg(long, value_name = "FILE")]
    graph: Option<PathBuf>,

    /// Mask string values that look like personal names
    #[arg(long)]
    redact: bool,

    /// YAML list of [replacement, original] pairs
    #[arg(long, value_name = "FILE")]
    replacements: Option<PathBuf>,

    /// Number of worker threads (default: one per CPU)
    #[arg(long, short = 'j')]
    jobs: Option<usize>,

    /// Debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// PostgreSQL COPY script for a single `nodes` table
    Copy,
    /// One JSON object per leaf
    Jsonl,
}

enum Sink<W: Write> {
    Copy(CopyWriter<W>),
    Jsonl(JsonLinesWriter<W>),
}

impl<W: Write> Sink<W> {
    fn new(format: OutputFormat, writer: W) -> Result<Self> {
        Ok(match format {
            OutputFormat::Copy => {
                let mut copy = CopyWriter::new(writer);
                copy.write_init_script()?;
                Sink::Copy(copy)
            }
            OutputFormat::Jsonl => Sink::Jsonl(JsonLinesWriter::new(writer)),
        })
    }

    fn write(&mut self, leaves: &[Leaf]) -> Result<()> {
        match self {
            Sink::Copy(w) => w.write_leaves(leaves)?,
            Sink::Jsonl(w) => w.write_leaves(leaves)?,
        }
        Ok(())
    }

    fn finish(self) -> Result<()> {
        match self {
            Sink::Copy(w) => {
                w.finish()?;
            }
            Sink::Jsonl(mut w) => w.flush()?,
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = build_config(&args)?;

    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .context("Failed to configure worker pool")?;
    }

    let replacer = args
        .replacements
        .as_deref()
        .map(Replacer::load)
        .transpose()
        .context("Failed to load replacements")?;
    let replacer = match replacer {
        Some(replacer) if replacer.is_empty() => {
            warn!("Replacement file has no entries, skipping replacement pass");
            None
        }
        Some(replacer) => {
            info!("Loaded {} replacements", replacer.len());
            Some(replacer)
        }
        None => None,
    };

    let files = collect_files(&args.input)?;
    info!("Found {} files", files.len());

    let out = File::create(&args.output)
        .with_context(|| format!("Failed to create output file: {}", args.output.display()))?;
    let sink = Mutex::new(Sink::new(args.format, BufWriter::new(out))?);
    let graph = args.graph.as_ref().map(|_| Mutex::new(Graph::new("json2leaf")));

    let total_leaves = AtomicUsize::new(0);
    let total_redacted = AtomicUsize::new(0);
    let skipped = AtomicUsize::new(0);

    files.par_iter().enumerate().try_for_each(|(i, path)| -> Result<()> {
        info!("[{}/{}] Processing {}", i + 1, files.len(), path.display());

        let name = document::table_name(path);
        let leaves = match map_document(path, &name, &config) {
            Ok(leaves) => leaves,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                skipped.fetch_add(1, Ordering::Relaxed);
                return Ok(());
            }
        };

        let leaves = if args.redact {
            let mut redactor = Redactor::new();
            let leaves = redactor.apply(leaves);
            total_redacted.fetch_add(redactor.redacted(), Ordering::Relaxed);
            leaves
        } else {
            leaves
        };
        let leaves = match &replacer {
            Some(replacer) => replacer.apply(leaves),
            None => leaves,
        };

        let total = total_leaves.fetch_add(leaves.len(), Ordering::Relaxed) + leaves.len();
        info!("Generated {} leaves (total: {})", leaves.len(), total);

        if let Some(graph) = &graph {
            graph
                .lock()
                .map_err(|_| anyhow!("graph lock poisoned"))?
                .add_subgraph(&name, &leaves);
        }

        sink.lock()
            .map_err(|_| anyhow!("output lock poisoned"))?
            .write(&leaves)
            .with_context(|| format!("Failed to write leaves for {}", path.display()))
    })?;

    sink.into_inner()
        .map_err(|_| anyhow!("output lock poisoned"))?
        .finish()
        .context("Failed to finish output")?;

    if let (Some(path), Some(graph)) = (&args.graph, graph) {
        let graph = graph.into_inner().map_err(|_| anyhow!("graph lock poisoned"))?;
        if graph.is_empty() {
            warn!("No documents were mapped, graph has no tables");
        }
        std::fs::write(path, graph.to_string())
            .with_context(|| format!("Failed to write graph: {}", path.display()))?;
        info!("Wrote graph to {}", path.display());
    }

    if args.redact {
        info!("Redacted {} values", total_redacted.load(Ordering::Relaxed));
    }
    info!(
        "Done! Processed {} files ({} skipped), generated {} leaves",
        files.len(),
        skipped.load(Ordering::Relaxed),
        total_leaves.load(Ordering::Relaxed)
    );

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// YAML config file (if any) plus command-line entries on top
fn build_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    config.table_names.extend(args.table_names.iter().cloned());
    for entry in &args.overrides {
        config.column_overrides.push(ColumnOverride::parse(entry)?);
    }
    for entry in &args.column_subs {
        config.column_subs.push(Substitution::parse(entry)?);
    }
    for entry in &args.table_subs {
        config.table_subs.push(Substitution::parse(entry)?);
    }

    config.validate()?;
    Ok(config)
}

/// Every .json/.xml file under `dir`, sorted for a stable processing order
fn collect_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir) {
        let entry = entry.with_context(|| format!("Error walking directory: {}", dir.display()))?;
        if entry.file_type().is_file() && document::Format::from_path(entry.path()).is_some() {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// One mapper per file; node ids are unique without any cross-file coordination
fn map_document(path: &Path, name: &str, config: &Config) -> json2leaf::Result<Vec<Leaf>> {
    let value = document::load(path)?;
    let mut mapper = Mapper::new(config.clone())?;
    Ok(mapper.map(name, &value))
}
