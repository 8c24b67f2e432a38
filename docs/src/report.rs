//! Generation report types: per-entity outcomes and run aggregation.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Serialize;

/// Result of generating one entity's document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The document was written to this path.
    Written(PathBuf),
    /// The document could not be persisted; the message says why.
    Failed(String),
}

/// One entity's line in the report.
#[derive(Debug, Clone)]
pub struct EntityOutcome {
    /// Entity identifier.
    pub entity: String,
    /// Canonical label at generation time.
    pub label: String,
    /// Derived filename.
    pub file_name: String,
    /// What happened.
    pub outcome: Outcome,
}

impl EntityOutcome {
    /// Returns true if this entity's document was not written.
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }
}

/// An entry in the `index.json` manifest.
#[derive(Debug, Serialize)]
pub struct ManifestEntry<'a> {
    /// Entity identifier.
    pub identifier: &'a str,
    /// Canonical label.
    pub label: &'a str,
    /// Document filename, relative to the output directory.
    pub file: &'a str,
}

/// Aggregated outcome of a generation run.
#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Per-entity outcomes in candidate order.
    pub outcomes: Vec<EntityOutcome>,
    /// Predicates rendered through the unmapped fallback, for table curation.
    pub unmapped_predicates: BTreeSet<String>,
}

impl GenerationReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an outcome.
    pub fn push(&mut self, outcome: EntityOutcome) {
        self.outcomes.push(outcome);
    }

    /// Returns the count of documents written.
    pub fn written_count(&self) -> usize {
        self.outcomes.len() - self.failure_count()
    }

    /// Returns the count of entities whose document was not written.
    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    /// Returns true if every document was written.
    pub fn all_written(&self) -> bool {
        self.failure_count() == 0
    }

    /// Failed outcomes, in candidate order.
    pub fn failures(&self) -> impl Iterator<Item = &EntityOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }

    /// Manifest entries for every written document.
    pub fn manifest(&self) -> Vec<ManifestEntry<'_>> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_failure())
            .map(|o| ManifestEntry {
                identifier: &o.entity,
                label: &o.label,
                file: &o.file_name,
            })
            .collect()
    }
}
