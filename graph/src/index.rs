//! The Graph Index: every triple of a run, indexed by subject and object.
//!
//! The index is built once, in time linear in the number of triples, and is
//! immutable afterwards, so it can be shared across threads by reference
//! without locking. Iteration order is always source order: triples are kept
//! in the order they were first inserted, and per-entity lookups yield them in
//! that same order.

use std::collections::{HashMap, HashSet};

use crate::model::{Direction, Term, Triple};

/// A triple seen from one entity's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripleRef<'a> {
    /// The underlying triple.
    pub triple: &'a Triple,
    /// Whether the entity is the subject (`Outgoing`) or the object (`Incoming`).
    pub direction: Direction,
}

impl<'a> TripleRef<'a> {
    /// The term on the far side of the triple from the entity's point of view.
    #[must_use]
    pub fn other(&self) -> &'a Term {
        match self.direction {
            Direction::Outgoing => &self.triple.object,
            Direction::Incoming => &self.triple.subject,
        }
    }
}

/// Accumulates triples with set semantics before freezing them into a
/// [`GraphIndex`].
#[derive(Debug, Default)]
pub struct GraphIndexBuilder {
    triples: Vec<Triple>,
    seen: HashSet<Triple>,
}

impl GraphIndexBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a triple. Returns `false` if the same triple was already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        if self.seen.contains(&triple) {
            return false;
        }
        self.seen.insert(triple.clone());
        self.triples.push(triple);
        true
    }

    /// Number of distinct triples collected so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    /// True if no triples have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Freezes the collected triples into an index.
    #[must_use]
    pub fn build(self) -> GraphIndex {
        let mut by_subject: HashMap<Term, Vec<usize>> = HashMap::new();
        let mut by_object: HashMap<Term, Vec<usize>> = HashMap::new();

        for (pos, triple) in self.triples.iter().enumerate() {
            by_subject.entry(triple.subject.clone()).or_default().push(pos);
            if triple.object.is_node() {
                by_object.entry(triple.object.clone()).or_default().push(pos);
            }
        }

        GraphIndex {
            triples: self.triples,
            by_subject,
            by_object,
        }
    }
}

/// Read-only, per-entity index over a set of triples.
#[derive(Debug)]
pub struct GraphIndex {
    triples: Vec<Triple>,
    by_subject: HashMap<Term, Vec<usize>>,
    by_object: HashMap<Term, Vec<usize>>,
}

impl GraphIndex {
    /// Builds an index from any sequence of triples; duplicates collapse.
    #[must_use]
    pub fn from_triples(triples: impl IntoIterator<Item = Triple>) -> Self {
        let mut builder = GraphIndexBuilder::new();
        for triple in triples {
            builder.insert(triple);
        }
        builder.build()
    }

    /// All distinct triples, in source order.
    #[must_use]
    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    /// Number of distinct triples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    /// True if the index holds no triples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Triples whose subject is `entity`, in source order.
    pub fn outgoing<'a>(&'a self, entity: &Term) -> impl Iterator<Item = &'a Triple> + 'a {
        self.positions(&self.by_subject, entity)
            .map(move |pos| &self.triples[pos])
    }

    /// Triples whose object is `entity`, in source order.
    pub fn incoming<'a>(&'a self, entity: &Term) -> impl Iterator<Item = &'a Triple> + 'a {
        self.positions(&self.by_object, entity)
            .map(move |pos| &self.triples[pos])
    }

    /// Every triple where `entity` is subject or object, tagged with direction.
    ///
    /// Outgoing triples come first, then incoming ones, each group in source
    /// order. A self-referential triple is reported once, as outgoing. An
    /// entity with no triples yields an empty vector.
    #[must_use]
    pub fn triples_about(&self, entity: &Term) -> Vec<TripleRef<'_>> {
        let mut about: Vec<TripleRef<'_>> = self
            .outgoing(entity)
            .map(|triple| TripleRef {
                triple,
                direction: Direction::Outgoing,
            })
            .collect();
        about.extend(
            self.incoming(entity)
                .filter(|triple| !triple.is_self_loop())
                .map(|triple| TripleRef {
                    triple,
                    direction: Direction::Incoming,
                }),
        );
        about
    }

    /// True if `entity` appears as a subject or object anywhere in the graph.
    #[must_use]
    pub fn contains(&self, entity: &Term) -> bool {
        self.by_subject.contains_key(entity) || self.by_object.contains_key(entity)
    }

    /// Candidate entities for document generation, in first-seen order.
    ///
    /// An IRI qualifies if it is the subject of any triple, or the object of a
    /// triple whose predicate `is_domain_level` accepts. Blank nodes never
    /// qualify; they are only described from the entities that reference them.
    pub fn entities<F>(&self, is_domain_level: F) -> Vec<&str>
    where
        F: Fn(&str) -> bool,
    {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut entities = Vec::new();
        for triple in &self.triples {
            if let Some(iri) = triple.subject.as_iri() {
                if seen.insert(iri) {
                    entities.push(iri);
                }
            }
            if let Some(iri) = triple.object.as_iri() {
                if is_domain_level(&triple.predicate) && seen.insert(iri) {
                    entities.push(iri);
                }
            }
        }
        entities
    }

    fn positions<'a>(
        &'a self,
        map: &'a HashMap<Term, Vec<usize>>,
        entity: &Term,
    ) -> impl Iterator<Item = usize> + 'a {
        map.get(entity)
            .map(|positions| positions.as_slice())
            .unwrap_or(&[])
            .iter()
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Literal;

    const P46: &str = "http://www.cidoc-crm.org/cidoc-crm/P46_is_composed_of";
    const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    const LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";

    fn ex(name: &str) -> Term {
        Term::iri(format!("http://example.org/{name}"))
    }

    fn sample() -> GraphIndex {
        GraphIndex::from_triples([
            Triple::new(ex("ChurchA"), P46, ex("NaveA")),
            Triple::new(ex("ChurchA"), TYPE, ex("Church")),
            Triple::new(ex("ChurchA"), LABEL, Term::literal("Church A")),
            Triple::new(ex("ChurchA"), P46, ex("NaveA")),
            Triple::new(ex("NaveA"), P46, ex("NaveA")),
            Triple::new(ex("ApseA"), P46, ex("ChurchA")),
        ])
    }

    #[test]
    fn duplicates_collapse() {
        assert_eq!(sample().len(), 5);
    }

    #[test]
    fn triples_about_tags_direction_in_source_order() {
        let index = sample();
        let about = index.triples_about(&ex("ChurchA"));
        let directions: Vec<Direction> = about.iter().map(|t| t.direction).collect();
        assert_eq!(
            directions,
            vec![
                Direction::Outgoing,
                Direction::Outgoing,
                Direction::Outgoing,
                Direction::Incoming
            ]
        );
        assert_eq!(about[3].other(), &ex("ApseA"));
    }

    #[test]
    fn self_loop_reported_once() {
        let index = sample();
        let about = index.triples_about(&ex("NaveA"));
        let loops = about.iter().filter(|t| t.triple.is_self_loop()).count();
        assert_eq!(loops, 1);
        assert_eq!(about.len(), 2);
    }

    #[test]
    fn unknown_entity_is_empty_not_error() {
        let index = sample();
        assert!(index.triples_about(&ex("Nowhere")).is_empty());
        assert!(!index.contains(&ex("Nowhere")));
    }

    #[test]
    fn literals_are_not_indexed_as_objects() {
        let index = sample();
        let lit = Term::Literal(Literal::plain("Church A"));
        assert!(index.incoming(&lit).next().is_none());
    }

    #[test]
    fn entities_skip_schema_objects() {
        let index = sample();
        let entities = index.entities(|p| p != TYPE);
        assert_eq!(
            entities,
            vec![
                "http://example.org/ChurchA",
                "http://example.org/NaveA",
                "http://example.org/ApseA",
            ]
        );
    }
}
