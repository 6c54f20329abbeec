//! Schema Drift CLI
//!
//! Registers the current column layout of a data source and reports what
//! changed since the last registration.
//!
//! The column document is a JSON object mapping column names to serialized
//! fields, for example:
//!
//! ```json
//! {
//!   "id": {"type": "integer", "bits": 64, "signed": true, "nullable": true},
//!   "name": {"type": "string", "nullable": true}
//! }
//! ```
//!
//! Usage:
//!   drift --source users --fields columns.json
//!   drift --help

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use drifter::config::OutputFormat;
use drifter::{DrifterConfig, Field, SchemaChange, SchemaRegistry};

#[derive(Parser)]
#[command(name = "drift")]
#[command(about = "Track schema evolution for a tabular data source")]
struct Cli {
    /// Source identifier the columns are registered under
    #[arg(short, long)]
    source: String,

    /// Path to a JSON document mapping column names to fields
    #[arg(short, long)]
    fields: PathBuf,

    /// Directory holding schema histories (overrides config)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    format: String,

    /// Exit non-zero when any change is detected
    #[arg(long)]
    strict: bool,

    /// Path to a config file
    #[arg(short, long)]
    config: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            eprintln!("❌ Error: {e:#}");
            std::process::exit(2);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = DrifterConfig::load_from(cli.config.as_deref())?;
    let root = cli.root.unwrap_or_else(|| config.storage_root());

    let raw = fs::read_to_string(&cli.fields)
        .with_context(|| format!("reading column document {:?}", cli.fields))?;
    let document: Value = serde_json::from_str(&raw)
        .with_context(|| format!("parsing column document {:?}", cli.fields))?;

    let registry = SchemaRegistry::open(root);
    let changes = registry.register(&cli.source, || columns_from_document(&document))?;

    match cli.format.as_str() {
        "json" => {
            let rendered = match config.output.format {
                OutputFormat::Pretty => serde_json::to_string_pretty(&changes)?,
                OutputFormat::Compact => serde_json::to_string(&changes)?,
            };
            println!("{rendered}");
        }
        _ => print_text_report(&cli.source, &changes),
    }

    if cli.strict && changes.has_changes() {
        return Ok(1);
    }
    Ok(0)
}

/// Parse the column document into adapter output: one `(name, field)` pair
/// per column, in document order
fn columns_from_document(document: &Value) -> drifter::Result<Vec<(String, Field)>> {
    let columns = document.as_object().ok_or_else(|| {
        drifter::DriftError::MalformedField("column document is not an object".to_owned())
    })?;
    columns
        .iter()
        .map(|(name, value)| Ok((name.clone(), Field::from_value(value)?)))
        .collect()
}

fn print_text_report(source: &str, changes: &SchemaChange) {
    if !changes.has_changes() {
        println!("✅ No drift detected for '{source}'");
        return;
    }

    println!("⚠️  Schema drift detected for '{source}'\n");

    if !changes.added.is_empty() {
        println!("ADDED ({}):", changes.added.len());
        for name in &changes.added {
            println!("   + {name}");
        }
        println!();
    }

    if !changes.removed.is_empty() {
        println!("REMOVED ({}):", changes.removed.len());
        for name in &changes.removed {
            println!("   - {name}");
        }
        println!();
    }

    if !changes.changed.is_empty() {
        println!("CHANGED ({}):", changes.changed.len());
        for (name, change) in &changes.changed {
            println!("   ~ {name}: {} -> {}", change.old.type_name(), change.new.type_name());
        }
        println!();
    }

    println!(
        "SUMMARY: {} added, {} removed, {} changed",
        changes.added.len(),
        changes.removed.len(),
        changes.changed.len()
    );
}
