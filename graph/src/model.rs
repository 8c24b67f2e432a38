//! Core graph model types.
//!
//! A graph is a set of [`Triple`]s. Subjects are IRIs or blank nodes, objects
//! are IRIs, blank nodes, or [`Literal`]s. All values are owned so that the
//! [`GraphIndex`](crate::GraphIndex) can outlive the parser buffers it was
//! built from.

use std::fmt;

/// A literal value with its optional language tag and datatype IRI.
///
/// The lexical form is kept verbatim: geometries, dates and measurements
/// are never reformatted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    /// Lexical form exactly as it appeared in the source graph.
    pub value: String,
    /// BCP 47 language tag (e.g. `"el"`), if any.
    pub language: Option<String>,
    /// Full datatype IRI, if any other than `xsd:string` / `rdf:langString`.
    pub datatype: Option<String>,
}

impl Literal {
    /// A plain string literal.
    #[must_use]
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            language: None,
            datatype: None,
        }
    }

    /// A language-tagged string literal.
    #[must_use]
    pub fn lang(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            language: Some(language.into()),
            datatype: None,
        }
    }

    /// A typed literal.
    #[must_use]
    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            language: None,
            datatype: Some(datatype.into()),
        }
    }
}

/// An RDF term in subject or object position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// An absolute IRI.
    Iri(String),
    /// A blank node, identified by its label within the loaded graph.
    Blank(String),
    /// A literal value.
    Literal(Literal),
}

impl Term {
    /// Creates an IRI term.
    #[must_use]
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    /// Creates a blank-node term.
    #[must_use]
    pub fn blank(id: impl Into<String>) -> Self {
        Term::Blank(id.into())
    }

    /// Creates a plain string literal term.
    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal(Literal::plain(value))
    }

    /// Returns the IRI if this term is one.
    #[must_use]
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// Returns the literal if this term is one.
    #[must_use]
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// True for IRIs and blank nodes, i.e. anything that can be an entity.
    #[must_use]
    pub fn is_node(&self) -> bool {
        !matches!(self, Term::Literal(_))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{iri}>"),
            Term::Blank(id) => write!(f, "_:{id}"),
            Term::Literal(lit) => {
                write!(f, "\"{}\"", lit.value)?;
                if let Some(lang) = &lit.language {
                    write!(f, "@{lang}")?;
                } else if let Some(dt) = &lit.datatype {
                    write!(f, "^^<{dt}>")?;
                }
                Ok(())
            }
        }
    }
}

/// A `(subject, predicate, object)` assertion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    /// Subject: an IRI or blank node.
    pub subject: Term,
    /// Predicate IRI.
    pub predicate: String,
    /// Object: an IRI, blank node, or literal.
    pub object: Term,
}

impl Triple {
    /// Creates a new triple.
    #[must_use]
    pub fn new(subject: Term, predicate: impl Into<String>, object: Term) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
        }
    }

    /// True when subject and object are the same term.
    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.subject == self.object
    }
}

/// Which side of a triple the entity being described sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// The entity is the subject.
    Outgoing,
    /// The entity is the object.
    Incoming,
}

/// Extracts the local name from an IRI: the part after the last `#` or `/`.
///
/// Falls back to the whole IRI when it ends with a separator.
#[must_use]
pub fn local_name(iri: &str) -> &str {
    let trimmed = iri.trim_end_matches(['/', '#']);
    match trimmed.rfind(['#', '/']) {
        Some(pos) if pos + 1 < trimmed.len() => &trimmed[pos + 1..],
        _ => trimmed,
    }
}
