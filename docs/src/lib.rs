//! Heritage graph document generator.
//!
//! Renders one human-readable document per entity of a heritage knowledge
//! graph: identifier, types, literal properties, and every relationship
//! touching the entity, phrased as English sentences through the predicate
//! mapping table.
//!
//! # Entry Points
//!
//! ```no_run
//! use std::path::{Path, PathBuf};
//! use heritage_docs::{DocumentGenerator, GeneratorConfig, PredicateTable};
//!
//! let index = heritage_graph::loader::load_paths(&[PathBuf::from("data/")]).expect("graph");
//! let table = PredicateTable::bundled().expect("bundled table");
//! let config = GeneratorConfig::default();
//! let generator = DocumentGenerator::new(&index, &table, &config, chrono::Utc::now());
//!
//! let doc = generator.generate_document("http://example.org/Asinou");
//! println!("{}\n{}", doc.file_name, doc.text);
//!
//! let report = generator.generate_all(Path::new("out"));
//! assert!(report.all_written());
//! ```
//!
//! # Structure
//!
//! ```text
//! out/
//!   Asinou_1f3a9c02.md          ← <cleaned-label>_<8-hex identifier hash>.<ext>
//!   Nave_of_Asinou_77b01e4d.md
//!   index.json                  ← optional manifest
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod assembler;
pub mod config;
pub mod error;
pub mod naming;
pub mod predicates;
pub mod report;
pub mod resolver;
pub mod writer;

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use heritage_graph::{Direction, GraphIndex, Term};
use rayon::prelude::*;
use tracing::{debug, error, info, warn};

pub use config::{GeneratorConfig, OutputFormat};
pub use error::DocsError;
pub use predicates::{Phrase, Phrasing, PredicateTable, PropertyKind, SchemaSection};
pub use report::{EntityOutcome, GenerationReport, Outcome};
pub use resolver::{EntityResolver, ResolvedEntity};

/// A fully rendered document, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDocument {
    /// Entity identifier.
    pub entity: String,
    /// Canonical label of the entity.
    pub label: String,
    /// Filename derived from label and identifier.
    pub file_name: String,
    /// Complete document text.
    pub text: String,
    /// Predicates that had no mapping entry and were phrased by fallback.
    pub unmapped_predicates: Vec<String>,
}

/// Renders entity documents from a shared, read-only Graph Index.
///
/// Every method is a pure function of the index, table, configuration and
/// generation timestamp, so the generator can be shared across threads.
#[derive(Debug, Clone, Copy)]
pub struct DocumentGenerator<'a> {
    index: &'a GraphIndex,
    table: &'a PredicateTable,
    config: &'a GeneratorConfig,
    generated_at: DateTime<Utc>,
}

impl<'a> DocumentGenerator<'a> {
    /// Creates a generator. `generated_at` is stamped into every document,
    /// so a fixed value makes output byte-for-byte reproducible.
    #[must_use]
    pub fn new(
        index: &'a GraphIndex,
        table: &'a PredicateTable,
        config: &'a GeneratorConfig,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            index,
            table,
            config,
            generated_at,
        }
    }

    /// The entity resolver bound to this generator's index and settings.
    #[must_use]
    pub fn resolver(&self) -> EntityResolver<'a> {
        EntityResolver::new(
            self.index,
            self.table,
            self.config.preferred_language.as_deref(),
        )
    }

    /// Entities that get a document: every IRI that is a subject, or the
    /// object of a domain-level triple, in first-seen order.
    #[must_use]
    pub fn candidates(&self) -> Vec<&'a str> {
        self.index
            .entities(|predicate| !self.table.is_schema_level(predicate))
    }

    /// Relationship sentences for `entity`, in Graph Index order, plus the
    /// predicates that needed the unmapped fallback.
    ///
    /// Schema-level, literal-valued and self-referential triples produce
    /// nothing. An incoming triple whose predicate has no inverse phrase is
    /// left to the subject's document, unless the subject is a blank node
    /// (which gets no document); then the forward sentence is rendered here.
    #[must_use]
    pub fn relationship_statements(&self, entity: &Term) -> (Vec<String>, Vec<String>) {
        let resolver = self.resolver();
        let own_label = resolver.canonical_label(entity);
        let mut statements = Vec::new();
        let mut unmapped: Vec<String> = Vec::new();

        for about in self.index.triples_about(entity) {
            let triple = about.triple;
            let other_label = || resolver.canonical_label(about.other());
            let (phrase, subject, object) =
                match self.table.phrase_for_triple(triple, about.direction) {
                    Some(phrase) => (phrase, own_label.clone(), other_label()),
                    None if about.direction == Direction::Incoming
                        && matches!(triple.subject, Term::Blank(_)) =>
                    {
                        match self.table.phrase_for_triple(triple, Direction::Outgoing) {
                            Some(phrase) => (phrase, other_label(), own_label.clone()),
                            None => continue,
                        }
                    }
                    None => continue,
                };
            if phrase.fallback && !unmapped.contains(&triple.predicate) {
                unmapped.push(triple.predicate.clone());
            }
            statements.push(format!("{subject} {} {object}", phrase.text));
        }

        (statements, unmapped)
    }

    /// Renders the document for one entity.
    ///
    /// An identifier with no triples yields a valid, empty document. The
    /// returned `file_name` is derived from the current label; when a file for
    /// the same identifier already exists, [`writer::persist_document`] keeps
    /// that file's name instead.
    #[must_use]
    pub fn generate_document(&self, entity: &str) -> GeneratedDocument {
        let term = Term::iri(entity);
        let resolved = self.resolver().resolve(&term);
        let (statements, unmapped_predicates) = self.relationship_statements(&term);

        let markdown = assembler::assemble(&resolved, &statements, &self.generated_at, self.config);
        let text = match self.config.format {
            OutputFormat::Markdown => markdown,
            OutputFormat::Html => assembler::render_html_page(
                &resolved.canonical_label,
                &resolved.id,
                &assembler::markdown_to_html(&markdown),
            ),
        };
        let file_name = naming::file_name(
            entity,
            &resolved.canonical_label,
            self.config.max_label_chars,
            self.config.format.extension(),
        );

        GeneratedDocument {
            entity: entity.to_string(),
            label: resolved.canonical_label,
            file_name,
            text,
            unmapped_predicates,
        }
    }

    /// Generates and writes documents for every candidate entity.
    #[must_use]
    pub fn generate_all(&self, out_dir: &Path) -> GenerationReport {
        self.generate_entities(out_dir, &self.candidates())
    }

    /// Generates and writes documents for `entities` into `out_dir`, in
    /// parallel.
    ///
    /// Documents already in `out_dir` are matched by identifier, so an entity
    /// whose label changed overwrites its earlier file rather than adding a
    /// second one. A write failure is recorded for that entity and logged; the
    /// remaining entities are still processed. Outcomes are reported in input
    /// order.
    #[must_use]
    pub fn generate_entities(&self, out_dir: &Path, entities: &[&str]) -> GenerationReport {
        let existing = writer::ExistingDocuments::scan(out_dir).unwrap_or_else(|e| {
            warn!(error = %e, "cannot list output directory; previous documents not matched");
            writer::ExistingDocuments::default()
        });
        debug!(existing = existing.len(), "previous documents found");

        let results: Vec<(EntityOutcome, Vec<String>)> = entities
            .par_iter()
            .map(|entity| {
                let doc = self.generate_document(entity);
                let written =
                    writer::persist_document(out_dir, &existing, &doc.file_name, &doc.text);
                let (file_name, outcome) = match written {
                    Ok(path) => {
                        let name = path
                            .file_name()
                            .map_or(doc.file_name.clone(), |n| n.to_string_lossy().into_owned());
                        (name, Outcome::Written(path))
                    }
                    Err(e) => {
                        error!(entity = %entity, error = %e, "document not written");
                        (doc.file_name, Outcome::Failed(e.to_string()))
                    }
                };
                let line = EntityOutcome {
                    entity: doc.entity,
                    label: doc.label,
                    file_name,
                    outcome,
                };
                (line, doc.unmapped_predicates)
            })
            .collect();

        let mut report = GenerationReport::new();
        let mut unmapped = BTreeSet::new();
        for (line, predicates) in results {
            report.push(line);
            unmapped.extend(predicates);
        }
        for predicate in &unmapped {
            warn!(predicate = %predicate, "no phrase mapping; rendered from local name");
        }
        report.unmapped_predicates = unmapped;

        info!(
            written = report.written_count(),
            failed = report.failure_count(),
            out_dir = %out_dir.display(),
            "generation finished"
        );
        report
    }
}
