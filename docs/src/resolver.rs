//! Entity resolution: labels, types, and literal properties for one entity.
//!
//! Canonical labels are chosen by a fixed rule so that every document in a
//! run names a referenced entity the same way: the first label whose language
//! matches the configured preference, otherwise the first label in source
//! order, otherwise the identifier's local name.

use std::collections::HashSet;

use heritage_graph::{local_name, Direction, GraphIndex, Literal, Term};
use tracing::debug;

use crate::predicates::{humanize, PredicateTable, PropertyKind, SchemaSection};

/// A declared type of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    /// Type identifier (IRI, or `_:id` for a blank node).
    pub id: String,
    /// Canonical label of the type.
    pub label: String,
}

/// One value listed in the Properties section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyValue {
    /// Human-readable name of the predicate that carried the value.
    pub predicate: String,
    /// Value text, verbatim for literals, canonical label for nodes.
    pub text: String,
    /// Language tag of a literal value.
    pub language: Option<String>,
    /// Identifier of a node value (schema-level predicates routed to
    /// Properties).
    pub reference: Option<String>,
}

/// All values of one [`PropertyKind`], in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyGroup {
    /// The kind shared by every value.
    pub kind: PropertyKind,
    /// Values in source order.
    pub values: Vec<PropertyValue>,
}

/// Everything the Types and Properties sections need about an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntity {
    /// Entity identifier.
    pub id: String,
    /// The label used for this entity everywhere in the corpus.
    pub canonical_label: String,
    /// Every label literal, in source order.
    pub labels: Vec<Literal>,
    /// Declared types, deduplicated, first-seen order.
    pub types: Vec<TypeRef>,
    /// Non-empty property groups in [`PropertyKind::ALL`] order.
    pub properties: Vec<PropertyGroup>,
}

/// Resolves entities against a shared, read-only index.
#[derive(Debug, Clone, Copy)]
pub struct EntityResolver<'a> {
    index: &'a GraphIndex,
    table: &'a PredicateTable,
    preferred_language: Option<&'a str>,
}

impl<'a> EntityResolver<'a> {
    /// Creates a resolver.
    #[must_use]
    pub fn new(
        index: &'a GraphIndex,
        table: &'a PredicateTable,
        preferred_language: Option<&'a str>,
    ) -> Self {
        Self {
            index,
            table,
            preferred_language,
        }
    }

    /// Label literals of `entity`, in source order.
    #[must_use]
    pub fn labels(&self, entity: &Term) -> Vec<&'a Literal> {
        self.index
            .outgoing(entity)
            .filter(|t| self.table.schema_section(&t.predicate) != Some(SchemaSection::Hidden))
            .filter_map(|t| {
                t.object
                    .as_literal()
                    .filter(|lit| self.table.literal_kind(&t.predicate, lit) == PropertyKind::Label)
            })
            .collect()
    }

    /// The single label used when `entity` is mentioned anywhere.
    #[must_use]
    pub fn canonical_label(&self, entity: &Term) -> String {
        let labels = self.labels(entity);
        if let Some(lang) = self.preferred_language {
            if let Some(lit) = labels
                .iter()
                .find(|lit| lit.language.as_deref().is_some_and(|l| language_matches(l, lang)))
            {
                return lit.value.clone();
            }
        }
        match labels.as_slice() {
            [] => fallback_label(entity),
            [only] => only.value.clone(),
            [first, ..] => {
                debug!(
                    entity = %entity,
                    candidates = labels.len(),
                    "several labels, using first-seen as canonical"
                );
                first.value.clone()
            }
        }
    }

    /// Resolves labels, types, and properties of `entity`.
    ///
    /// An entity with no triples resolves to an empty, valid result.
    #[must_use]
    pub fn resolve(&self, entity: &Term) -> ResolvedEntity {
        let mut types: Vec<TypeRef> = Vec::new();
        let mut seen_types: HashSet<String> = HashSet::new();
        let mut groups: Vec<PropertyGroup> = PropertyKind::ALL
            .iter()
            .map(|kind| PropertyGroup {
                kind: *kind,
                values: Vec::new(),
            })
            .collect();
        let mut labels = Vec::new();

        for about in self.index.triples_about(entity) {
            if about.direction != Direction::Outgoing {
                continue;
            }
            let triple = about.triple;
            let section = self.table.schema_section(&triple.predicate);
            if section == Some(SchemaSection::Hidden) {
                continue;
            }

            match (&triple.object, section) {
                (Term::Literal(lit), _) => {
                    let kind = self.table.literal_kind(&triple.predicate, lit);
                    if kind == PropertyKind::Label {
                        labels.push(lit.clone());
                    }
                    push_value(
                        &mut groups,
                        kind,
                        PropertyValue {
                            predicate: predicate_name(&triple.predicate),
                            text: lit.value.clone(),
                            language: lit.language.clone(),
                            reference: None,
                        },
                    );
                }
                (object, Some(SchemaSection::Types)) => {
                    let id = node_id(object);
                    if seen_types.insert(id.clone()) {
                        types.push(TypeRef {
                            id,
                            label: self.canonical_label(object),
                        });
                    }
                }
                (object, Some(SchemaSection::Properties)) => {
                    push_value(
                        &mut groups,
                        PropertyKind::Other,
                        PropertyValue {
                            predicate: predicate_name(&triple.predicate),
                            text: self.canonical_label(object),
                            language: None,
                            reference: Some(node_id(object)),
                        },
                    );
                }
                // Domain-level node objects belong to the Relationships section.
                _ => {}
            }
        }

        groups.retain(|g| !g.values.is_empty());

        ResolvedEntity {
            id: node_id(entity),
            canonical_label: self.canonical_label(entity),
            labels,
            types,
            properties: groups,
        }
    }
}

fn push_value(groups: &mut [PropertyGroup], kind: PropertyKind, value: PropertyValue) {
    if let Some(group) = groups.iter_mut().find(|g| g.kind == kind) {
        group.values.push(value);
    }
}

/// Identifier text: the IRI, or `_:id` for a blank node.
fn node_id(term: &Term) -> String {
    match term {
        Term::Iri(iri) => iri.clone(),
        Term::Blank(id) => format!("_:{id}"),
        Term::Literal(lit) => lit.value.clone(),
    }
}

/// Label of last resort: the IRI local name, or `_:id` for blank nodes.
fn fallback_label(entity: &Term) -> String {
    match entity {
        Term::Iri(iri) => local_name(iri).to_string(),
        Term::Blank(id) => format!("_:{id}"),
        Term::Literal(lit) => lit.value.clone(),
    }
}

fn predicate_name(predicate: &str) -> String {
    humanize(local_name(predicate))
}

/// `en` matches `en`, `EN` and `en-GB`.
fn language_matches(tag: &str, wanted: &str) -> bool {
    tag.eq_ignore_ascii_case(wanted)
        || tag
            .split('-')
            .next()
            .is_some_and(|primary| primary.eq_ignore_ascii_case(wanted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use heritage_graph::vocab::{CRM, GEO_WKT_LITERAL, RDFS_COMMENT, RDFS_LABEL, RDF_TYPE};
    use heritage_graph::Triple;

    fn ex(name: &str) -> Term {
        Term::iri(format!("http://example.org/{name}"))
    }

    fn graph() -> GraphIndex {
        GraphIndex::from_triples([
            Triple::new(ex("Asinou"), RDFS_LABEL, Term::Literal(Literal::lang("Asinou", "en"))),
            Triple::new(
                ex("Asinou"),
                RDFS_LABEL,
                Term::Literal(Literal::lang("Panagia Phorbiottisa", "el")),
            ),
            Triple::new(ex("Asinou"), RDF_TYPE, ex("Church")),
            Triple::new(ex("Asinou"), RDF_TYPE, ex("Monument")),
            Triple::new(ex("Asinou"), RDF_TYPE, ex("Church")),
            Triple::new(ex("Church"), RDFS_LABEL, Term::literal("Church")),
            Triple::new(ex("Asinou"), RDFS_COMMENT, Term::literal("Byzantine church.")),
            Triple::new(
                ex("Asinou"),
                "http://www.opengis.net/ont/geosparql#asWKT",
                Term::Literal(Literal::typed("POINT(32.98 35.03)", GEO_WKT_LITERAL)),
            ),
            Triple::new(ex("Asinou"), "http://example.org/vocab#rating", Term::literal("5")),
            Triple::new(ex("Asinou"), format!("{CRM}P46_is_composed_of"), ex("NaveA")),
        ])
    }

    #[test]
    fn canonical_label_is_first_seen_by_default() {
        let index = graph();
        let table = PredicateTable::bundled().expect("bundled");
        let resolver = EntityResolver::new(&index, &table, None);
        assert_eq!(resolver.canonical_label(&ex("Asinou")), "Asinou");
    }

    #[test]
    fn preferred_language_overrides_order() {
        let index = graph();
        let table = PredicateTable::bundled().expect("bundled");
        let resolver = EntityResolver::new(&index, &table, Some("el"));
        assert_eq!(resolver.canonical_label(&ex("Asinou")), "Panagia Phorbiottisa");
        let fallback = EntityResolver::new(&index, &table, Some("fr"));
        assert_eq!(fallback.canonical_label(&ex("Asinou")), "Asinou");
    }

    #[test]
    fn unlabelled_entity_uses_local_name() {
        let index = graph();
        let table = PredicateTable::bundled().expect("bundled");
        let resolver = EntityResolver::new(&index, &table, None);
        assert_eq!(resolver.canonical_label(&ex("NaveA")), "NaveA");
    }

    #[test]
    fn resolve_groups_literals_and_dedups_types() {
        let index = graph();
        let table = PredicateTable::bundled().expect("bundled");
        let resolved = EntityResolver::new(&index, &table, None).resolve(&ex("Asinou"));

        assert_eq!(resolved.labels.len(), 2);
        let type_labels: Vec<&str> = resolved.types.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(type_labels, vec!["Church", "Monument"]);

        let kinds: Vec<PropertyKind> = resolved.properties.iter().map(|g| g.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PropertyKind::Label,
                PropertyKind::Comment,
                PropertyKind::Geometry,
                PropertyKind::Other
            ]
        );
        let geometry = &resolved.properties[2].values[0];
        assert_eq!(geometry.text, "POINT(32.98 35.03)");
        let other = &resolved.properties[3].values[0];
        assert_eq!(other.predicate, "rating");
    }

    #[test]
    fn missing_entity_resolves_empty() {
        let index = graph();
        let table = PredicateTable::bundled().expect("bundled");
        let resolved = EntityResolver::new(&index, &table, None).resolve(&ex("Ghost"));
        assert_eq!(resolved.canonical_label, "Ghost");
        assert!(resolved.types.is_empty());
        assert!(resolved.properties.is_empty());
    }

    #[test]
    fn blank_nodes_use_prefixed_identifiers() {
        let index = GraphIndex::from_triples([
            Triple::new(Term::blank("f0_t1"), RDF_TYPE, Term::blank("f0_c1")),
            Triple::new(Term::blank("f0_t1"), RDFS_COMMENT, Term::literal("undated")),
        ]);
        let table = PredicateTable::bundled().expect("bundled");
        let resolver = EntityResolver::new(&index, &table, None);
        let resolved = resolver.resolve(&Term::blank("f0_t1"));

        assert_eq!(resolved.id, "_:f0_t1");
        assert_eq!(resolved.canonical_label, "_:f0_t1");
        assert_eq!(resolved.types[0].id, "_:f0_c1");
        assert_eq!(resolved.types[0].label, "_:f0_c1");
    }

    #[test]
    fn language_prefix_matching() {
        assert!(language_matches("en-GB", "en"));
        assert!(language_matches("EN", "en"));
        assert!(!language_matches("el", "en"));
    }
}
