//! Predicate naturalization: predicate IRI + traversal direction → phrase.
//!
//! The mapping table is data (TOML), not code. Every phrase that appears in a
//! relationship sentence comes from [`PredicateTable::phrase_for`]; the only
//! synthesized phrases are the fallbacks for unmapped predicates, built from
//! the predicate's local name by [`humanize`].

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use heritage_graph::vocab::{
    GEO_GEOJSON_LITERAL, GEO_GML_LITERAL, GEO_WKT_LITERAL, WELL_KNOWN_PREFIXES, XSD_DATE,
    XSD_DATETIME, XSD_GYEAR, XSD_GYEAR_MONTH,
};
use heritage_graph::{local_name, Direction, Literal, Triple};
use serde::Deserialize;

use crate::error::DocsError;

const BUNDLED_TABLE: &str = include_str!("../data/predicates.toml");

/// Kind of a literal property, in the order the Properties section lists them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    /// Display names (`rdfs:label`, `skos:prefLabel`, ...).
    Label,
    /// Descriptions and notes.
    Comment,
    /// WKT / GML / GeoJSON geometries, passed through verbatim.
    Geometry,
    /// Dates and time-span bounds.
    Date,
    /// Anything that cannot be classified.
    Other,
}

impl PropertyKind {
    /// All kinds in section order.
    pub const ALL: [PropertyKind; 5] = [
        PropertyKind::Label,
        PropertyKind::Comment,
        PropertyKind::Geometry,
        PropertyKind::Date,
        PropertyKind::Other,
    ];

    /// Heading used for the kind's subsection.
    #[must_use]
    pub fn heading(self) -> &'static str {
        match self {
            PropertyKind::Label => "Labels",
            PropertyKind::Comment => "Comments",
            PropertyKind::Geometry => "Geometry",
            PropertyKind::Date => "Dates",
            PropertyKind::Other => "Other",
        }
    }
}

/// Where a schema-level predicate's values go instead of the Relationships
/// section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaSection {
    /// Object becomes an entry in the Types list.
    Types,
    /// Object is listed under Properties → Other.
    Properties,
    /// Triple is not rendered at all.
    Hidden,
}

/// How a mapped predicate is phrased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phrasing {
    /// Same phrase from either end.
    Symmetric(String),
    /// Distinct senses per direction. Without an inverse the relation is only
    /// rendered from the subject's side.
    Directional {
        /// Phrase from the subject's perspective.
        forward: String,
        /// Phrase from the object's perspective.
        inverse: Option<String>,
    },
    /// Structural predicate, never a relationship sentence.
    Schema(SchemaSection),
}

/// A phrase ready to be placed between two labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase<'a> {
    /// The phrase text.
    pub text: Cow<'a, str>,
    /// True when the predicate had no mapping entry and the phrase was derived
    /// from its local name.
    pub fallback: bool,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTable {
    #[allow(dead_code)]
    version: Option<String>,
    #[serde(default)]
    prefixes: BTreeMap<String, String>,
    #[serde(default, rename = "predicate")]
    predicates: Vec<RawPredicate>,
    #[serde(default, rename = "literal")]
    literals: Vec<RawLiteral>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPredicate {
    iri: String,
    forward: Option<String>,
    inverse: Option<String>,
    symmetric: Option<String>,
    schema: Option<SchemaSection>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLiteral {
    iri: String,
    kind: PropertyKind,
}

/// The predicate mapping table.
#[derive(Debug, Clone, Default)]
pub struct PredicateTable {
    phrasings: HashMap<String, Phrasing>,
    literal_kinds: HashMap<String, PropertyKind>,
}

impl PredicateTable {
    /// The table bundled with the crate (CIDOC-CRM, RDF/RDFS/OWL, SKOS,
    /// Dublin Core, GeoSPARQL, PROV-O).
    ///
    /// # Errors
    ///
    /// Returns [`DocsError::PredicateTable`] if the bundled table is invalid.
    pub fn bundled() -> Result<Self, DocsError> {
        Self::parse(BUNDLED_TABLE, Path::new("<bundled>"))
    }

    /// Parses a table from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`DocsError::PredicateTable`] on invalid TOML, an unknown
    /// prefix, a duplicate IRI, or an entry that is not exactly one variant.
    pub fn from_toml_str(text: &str) -> Result<Self, DocsError> {
        Self::parse(text, Path::new("<inline>"))
    }

    /// Reads and parses a table file.
    ///
    /// # Errors
    ///
    /// Returns [`DocsError::PredicateTable`] if the file cannot be read or is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, DocsError> {
        let text = std::fs::read_to_string(path).map_err(|e| DocsError::PredicateTable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&text, path)
    }

    /// Returns this table with every entry of `overrides` added or replaced.
    #[must_use]
    pub fn layered(mut self, overrides: PredicateTable) -> Self {
        self.phrasings.extend(overrides.phrasings);
        self.literal_kinds.extend(overrides.literal_kinds);
        self
    }

    /// Number of predicate and literal entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.phrasings.len() + self.literal_kinds.len()
    }

    /// True if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The mapping entry for `predicate`, if any.
    #[must_use]
    pub fn phrasing(&self, predicate: &str) -> Option<&Phrasing> {
        self.phrasings.get(predicate)
    }

    /// Section a schema-level predicate feeds, or `None` for domain-level and
    /// unmapped predicates.
    #[must_use]
    pub fn schema_section(&self, predicate: &str) -> Option<SchemaSection> {
        match self.phrasings.get(predicate) {
            Some(Phrasing::Schema(section)) => Some(*section),
            _ => None,
        }
    }

    /// True for structural predicates that never produce relationship lines.
    #[must_use]
    pub fn is_schema_level(&self, predicate: &str) -> bool {
        self.schema_section(predicate).is_some()
    }

    /// Phrase for `predicate` read in `direction`, or `None` when nothing
    /// should be rendered from that side.
    ///
    /// Symmetric predicates give the same phrase both ways. Directional ones
    /// give the forward phrase outgoing and the inverse phrase incoming (or
    /// `None` without one). Unmapped predicates fall back to their humanized
    /// local name, outgoing only.
    #[must_use]
    pub fn phrase_for(&self, predicate: &str, direction: Direction) -> Option<Phrase<'_>> {
        match (self.phrasings.get(predicate), direction) {
            (Some(Phrasing::Schema(_)), _) => None,
            (Some(Phrasing::Symmetric(text)), _) => Some(mapped(text)),
            (Some(Phrasing::Directional { forward, .. }), Direction::Outgoing) => {
                Some(mapped(forward))
            }
            (Some(Phrasing::Directional { inverse, .. }), Direction::Incoming) => {
                inverse.as_deref().map(mapped)
            }
            (None, Direction::Outgoing) => Some(Phrase {
                text: Cow::Owned(humanize(local_name(predicate))),
                fallback: true,
            }),
            (None, Direction::Incoming) => None,
        }
    }

    /// Like [`phrase_for`](Self::phrase_for), but self-referential triples
    /// and literal-valued triples never yield a phrase.
    #[must_use]
    pub fn phrase_for_triple(&self, triple: &Triple, direction: Direction) -> Option<Phrase<'_>> {
        if triple.is_self_loop() || !triple.object.is_node() {
            return None;
        }
        self.phrase_for(&triple.predicate, direction)
    }

    /// Classifies a literal value attached through `predicate`.
    ///
    /// Listed predicates win; otherwise geometry and date datatypes are
    /// recognised; everything else is [`PropertyKind::Other`].
    #[must_use]
    pub fn literal_kind(&self, predicate: &str, literal: &Literal) -> PropertyKind {
        if let Some(kind) = self.literal_kinds.get(predicate) {
            return *kind;
        }
        match literal.datatype.as_deref() {
            Some(GEO_WKT_LITERAL | GEO_GML_LITERAL | GEO_GEOJSON_LITERAL) => {
                PropertyKind::Geometry
            }
            Some(XSD_DATE | XSD_DATETIME | XSD_GYEAR | XSD_GYEAR_MONTH) => PropertyKind::Date,
            _ => PropertyKind::Other,
        }
    }

    fn parse(text: &str, origin: &Path) -> Result<Self, DocsError> {
        let fail = |message: String| DocsError::PredicateTable {
            path: origin.to_path_buf(),
            message,
        };

        let raw: RawTable = toml::from_str(text).map_err(|e| fail(e.to_string()))?;
        let mut table = PredicateTable::default();

        for entry in raw.predicates {
            let iri = expand_iri(&entry.iri, &raw.prefixes).map_err(&fail)?;
            let phrasing = match (entry.symmetric, entry.forward, entry.inverse, entry.schema) {
                (Some(text), None, None, None) => {
                    Phrasing::Symmetric(phrase_text(&iri, &text).map_err(&fail)?)
                }
                (None, Some(forward), inverse, None) => Phrasing::Directional {
                    forward: phrase_text(&iri, &forward).map_err(&fail)?,
                    inverse: inverse
                        .map(|i| phrase_text(&iri, &i))
                        .transpose()
                        .map_err(&fail)?,
                },
                (None, None, None, Some(section)) => Phrasing::Schema(section),
                _ => {
                    return Err(fail(format!(
                        "{iri}: entry must have exactly one of `symmetric`, `forward` \
                         (with optional `inverse`), or `schema`"
                    )))
                }
            };
            if table.phrasings.insert(iri.clone(), phrasing).is_some() {
                return Err(fail(format!("{iri}: duplicate predicate entry")));
            }
        }

        for entry in raw.literals {
            let iri = expand_iri(&entry.iri, &raw.prefixes).map_err(&fail)?;
            if table.literal_kinds.insert(iri.clone(), entry.kind).is_some() {
                return Err(fail(format!("{iri}: duplicate literal entry")));
            }
        }

        Ok(table)
    }
}

/// Normalizes inner whitespace; empty phrases are rejected.
fn phrase_text(iri: &str, text: &str) -> Result<String, String> {
    let phrase = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if phrase.is_empty() {
        return Err(format!("{iri}: empty phrase"));
    }
    Ok(phrase)
}

fn mapped(text: &str) -> Phrase<'_> {
    Phrase {
        text: Cow::Borrowed(text),
        fallback: false,
    }
}

/// Expands `prefix:local` against the table's prefixes (then the well-known
/// ones). Absolute IRIs, with or without angle brackets, pass through.
fn expand_iri(iri: &str, prefixes: &BTreeMap<String, String>) -> Result<String, String> {
    let iri = iri.trim();
    if let Some(inner) = iri.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
        return Ok(inner.to_string());
    }
    if iri.contains("://") || iri.starts_with("urn:") {
        return Ok(iri.to_string());
    }
    let (prefix, local) = iri
        .split_once(':')
        .ok_or_else(|| format!("{iri}: not an IRI or compact IRI"))?;
    let namespace = prefixes
        .get(prefix)
        .map(String::as_str)
        .or_else(|| {
            WELL_KNOWN_PREFIXES
                .iter()
                .find(|(p, _)| *p == prefix)
                .map(|(_, ns)| *ns)
        })
        .ok_or_else(|| format!("{iri}: unknown prefix '{prefix}'"))?;
    Ok(format!("{namespace}{local}"))
}

/// Turns a predicate local name into a phrase.
///
/// CIDOC-style codes (`P46_`, `P46i_`, `E22_`) are dropped, `_` and `-`
/// become spaces, camelCase is split, and the result is lower-cased:
/// `P46_is_composed_of` → `is composed of`, `depictsSaint` → `depicts saint`.
#[must_use]
pub fn humanize(local: &str) -> String {
    let stripped = strip_crm_code(local);
    let mut words = String::with_capacity(stripped.len() + 4);
    let mut prev: Option<char> = None;
    for ch in stripped.chars() {
        if ch == '_' || ch == '-' || ch.is_whitespace() {
            words.push(' ');
        } else {
            if ch.is_uppercase() && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit()) {
                words.push(' ');
            }
            words.extend(ch.to_lowercase());
        }
        prev = Some(ch);
    }
    let phrase = words.split_whitespace().collect::<Vec<_>>().join(" ");
    if phrase.is_empty() {
        local.to_string()
    } else {
        phrase
    }
}

/// Drops a leading `P<digits>[a-z]?[i]_` / `E<digits>_` code, if present.
fn strip_crm_code(local: &str) -> &str {
    let mut chars = local.char_indices();
    match chars.next() {
        Some((_, 'P' | 'E')) => {}
        _ => return local,
    }
    let digits_start = 1;
    let digits_end = local[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(local.len(), |pos| pos + digits_start);
    if digits_end == digits_start {
        return local;
    }
    let rest = &local[digits_end..];
    let rest = rest
        .strip_prefix(|c: char| c.is_ascii_lowercase() && c != 'i')
        .unwrap_or(rest);
    let rest = rest.strip_prefix('i').unwrap_or(rest);
    match rest.strip_prefix('_') {
        Some(tail) if !tail.is_empty() => tail,
        _ => local,
    }
}
