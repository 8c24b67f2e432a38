//! `heritage-docs` — Generates one document per entity of a heritage graph.
//!
//! **Outputs:**
//! - `<out>/<label>_<hash>.md` (or `.html`) — One document per entity
//! - `<out>/index.json` — Manifest of written documents (with `--manifest`)
//!
//! **Usage:**
//! ```
//! heritage-docs [--out <path>] [--config <file>] [--predicates <file>]
//!               [--lang <tag>] [--format markdown|html] [--entity <iri>]...
//!               [--clean] [--manifest] [--generated-at <rfc3339>] [--verbose]
//!               <input>...
//! ```
//!
//! Exits non-zero if the graph cannot be loaded or any document fails to
//! persist.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use heritage_docs::{writer, DocumentGenerator, GeneratorConfig, OutputFormat, PredicateTable};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Generate natural-language entity documents from a heritage RDF graph.
#[derive(Parser)]
#[command(
    name = "heritage-docs",
    about = "Generate natural-language entity documents from a heritage RDF graph"
)]
struct Args {
    /// Turtle / N-Triples files or directories to load.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory for generated documents.
    #[arg(long, default_value = "entity_documents")]
    out: PathBuf,

    /// Generator configuration file (TOML).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Predicate mapping table layered over the bundled one.
    #[arg(long)]
    predicates: Option<PathBuf>,

    /// Preferred language for canonical labels.
    #[arg(long)]
    lang: Option<String>,

    /// Document format: markdown or html.
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Only generate documents for these entity IRIs (repeatable).
    #[arg(long = "entity")]
    entities: Vec<String>,

    /// Remove previously generated documents from the output directory first.
    #[arg(long)]
    clean: bool,

    /// Write an `index.json` manifest of generated documents.
    #[arg(long)]
    manifest: bool,

    /// Timestamp stamped into every document (default: now).
    #[arg(long)]
    generated_at: Option<DateTime<Utc>>,

    /// Enable debug logging.
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = match &args.config {
        Some(path) => GeneratorConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => GeneratorConfig::default(),
    };
    if let Some(lang) = args.lang {
        config.preferred_language = Some(lang);
    }
    if let Some(format) = args.format {
        config.format = format;
    }

    let mut table = PredicateTable::bundled().context("Failed to load bundled predicate table")?;
    if let Some(path) = args.predicates.as_ref().or(config.predicates.as_ref()) {
        let overrides = PredicateTable::load(path)
            .with_context(|| format!("Failed to load predicate table {}", path.display()))?;
        info!(path = %path.display(), entries = overrides.len(), "predicate table layered");
        table = table.layered(overrides);
    }
    debug!(entries = table.len(), "predicate table ready");

    let index = heritage_graph::loader::load_paths(&args.inputs).context("Failed to load graph")?;

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("Failed to create {}", args.out.display()))?;
    if args.clean {
        let removed = writer::clear_output_dir(&args.out)?;
        info!(removed, "cleared previous output");
    }

    let generated_at = args.generated_at.unwrap_or_else(Utc::now);
    let generator = DocumentGenerator::new(&index, &table, &config, generated_at);
    let report = if args.entities.is_empty() {
        generator.generate_all(&args.out)
    } else {
        let selected: Vec<&str> = args.entities.iter().map(String::as_str).collect();
        generator.generate_entities(&args.out, &selected)
    };

    if args.manifest {
        writer::write_manifest(&args.out, &report)?;
    }

    println!("Entity documents generated.");
    println!("  Output: {}", args.out.display());
    println!("  Written: {}", report.written_count());
    if !report.unmapped_predicates.is_empty() {
        println!("  Unmapped predicates: {}", report.unmapped_predicates.len());
    }

    if !report.all_written() {
        for failure in report.failures() {
            eprintln!("  FAILED {} ({})", failure.entity, failure.file_name);
        }
        eprintln!("Generation FAILED: {} document(s) not written.", report.failure_count());
        process::exit(1);
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
