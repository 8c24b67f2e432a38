//! Loads Turtle and N-Triples files into a [`GraphIndex`].
//!
//! Inputs may be files or directories. Directories are walked recursively and
//! every `.ttl` / `.nt` file found is loaded; other files are skipped. All
//! paths are visited in sorted order so that the resulting index, and
//! therefore every generated document, is reproducible.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use sophia_api::source::TripleSource;
use sophia_api::term::{Term as _, TermKind};
use sophia_turtle::parser::{nt, turtle};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::GraphError;
use crate::index::{GraphIndex, GraphIndexBuilder};
use crate::model::{Literal, Term, Triple};
use crate::vocab::{RDF_LANG_STRING, XSD_STRING};

/// RDF serializations the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfFormat {
    /// Turtle 1.1 (`.ttl`).
    Turtle,
    /// N-Triples (`.nt`).
    NTriples,
}

impl RdfFormat {
    /// Detects the serialization from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "ttl" | "turtle" => Some(RdfFormat::Turtle),
            "nt" | "ntriples" => Some(RdfFormat::NTriples),
            _ => None,
        }
    }
}

/// Loads every RDF file reachable from `inputs` into a single index.
///
/// # Errors
///
/// Returns [`GraphError::NoInput`] if `inputs` is empty,
/// [`GraphError::Io`] / [`GraphError::Parse`] if a file cannot be read or
/// parsed, [`GraphError::UnsupportedFormat`] if a file named directly has an
/// unknown extension, and [`GraphError::Empty`] if nothing was loaded.
pub fn load_paths(inputs: &[PathBuf]) -> Result<GraphIndex, GraphError> {
    if inputs.is_empty() {
        return Err(GraphError::NoInput);
    }

    let files = collect_files(inputs)?;
    let mut builder = GraphIndexBuilder::new();
    for (ordinal, (path, format)) in files.iter().enumerate() {
        let file = File::open(path).map_err(|source| GraphError::Io {
            path: path.clone(),
            source,
        })?;
        let scope = format!("f{ordinal}_");
        let added = load_reader(BufReader::new(file), *format, path, &scope, &mut builder)?;
        debug!(path = %path.display(), added, "loaded RDF file");
    }

    if builder.is_empty() {
        return Err(GraphError::Empty);
    }
    let index = builder.build();
    info!(files = files.len(), triples = index.len(), "graph index built");
    Ok(index)
}

/// Parses an in-memory document, mainly for tests and embedding.
///
/// # Errors
///
/// Returns [`GraphError::Parse`] if the text is not valid in `format`.
pub fn parse_str(text: &str, format: RdfFormat) -> Result<GraphIndex, GraphError> {
    let mut builder = GraphIndexBuilder::new();
    load_reader(text.as_bytes(), format, Path::new("<memory>"), "", &mut builder)?;
    Ok(builder.build())
}

fn collect_files(inputs: &[PathBuf]) -> Result<Vec<(PathBuf, RdfFormat)>, GraphError> {
    let mut files = Vec::new();
    for input in inputs {
        let meta = std::fs::metadata(input).map_err(|source| GraphError::Io {
            path: input.clone(),
            source,
        })?;
        if meta.is_dir() {
            let mut found: Vec<(PathBuf, RdfFormat)> = Vec::new();
            for entry in WalkDir::new(input).sort_by_file_name() {
                let entry = entry.map_err(|e| GraphError::Io {
                    path: input.clone(),
                    source: e.into(),
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                match RdfFormat::from_path(entry.path()) {
                    Some(format) => found.push((entry.path().to_path_buf(), format)),
                    None => debug!(path = %entry.path().display(), "skipping non-RDF file"),
                }
            }
            files.extend(found);
        } else {
            let format = RdfFormat::from_path(input).ok_or_else(|| {
                GraphError::UnsupportedFormat {
                    path: input.clone(),
                }
            })?;
            files.push((input.clone(), format));
        }
    }
    Ok(files)
}

/// Parses one document into `builder`. Blank-node labels are local to a
/// document, so each one is prefixed with `blank_scope`.
fn load_reader<R>(
    reader: R,
    format: RdfFormat,
    path: &Path,
    blank_scope: &str,
    builder: &mut GraphIndexBuilder,
) -> Result<usize, GraphError>
where
    R: std::io::BufRead,
{
    match format {
        RdfFormat::Turtle => drain(turtle::parse_bufread(reader), path, blank_scope, builder),
        RdfFormat::NTriples => drain(nt::parse_bufread(reader), path, blank_scope, builder),
    }
}

fn drain<S>(
    mut source: S,
    path: &Path,
    blank_scope: &str,
    builder: &mut GraphIndexBuilder,
) -> Result<usize, GraphError>
where
    S: TripleSource,
{
    let mut added = 0usize;
    source
        .for_each_triple(|t| {
            if let Some(triple) = convert_triple(&t, blank_scope) {
                if builder.insert(triple) {
                    added += 1;
                }
            }
        })
        .map_err(|e| GraphError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(added)
}

fn convert_triple<T>(t: &T, blank_scope: &str) -> Option<Triple>
where
    T: sophia_api::triple::Triple,
{
    let subject = convert_term(t.s(), blank_scope)?;
    let predicate = t.p().iri()?.as_str().to_string();
    let object = convert_term(t.o(), blank_scope)?;
    Some(Triple::new(subject, predicate, object))
}

fn convert_term<T>(term: T, blank_scope: &str) -> Option<Term>
where
    T: sophia_api::term::Term,
{
    match term.kind() {
        TermKind::Iri => term.iri().map(|iri| Term::Iri(iri.as_str().to_string())),
        TermKind::BlankNode => term
            .bnode_id()
            .map(|id| Term::Blank(format!("{blank_scope}{}", id.as_str()))),
        TermKind::Literal => {
            let value = term.lexical_form()?.to_string();
            let language = term.language_tag().map(|tag| tag.as_str().to_string());
            let datatype = term
                .datatype()
                .map(|dt| dt.as_str().to_string())
                .filter(|dt| dt != XSD_STRING && dt != RDF_LANG_STRING);
            Some(Term::Literal(Literal {
                value,
                language,
                datatype,
            }))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Direction;

    const TTL: &str = r#"
@prefix crm: <http://www.cidoc-crm.org/cidoc-crm/> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix ex: <http://example.org/> .

ex:Asinou a crm:E22_Human-Made_Object ;
    rdfs:label "Asinou"@en, "Panagia Phorbiottisa"@el ;
    crm:P46_is_composed_of ex:NaveA .
"#;

    #[test]
    fn parses_turtle_with_language_tags() {
        let index = parse_str(TTL, RdfFormat::Turtle).expect("valid turtle");
        assert_eq!(index.len(), 4);
        let asinou = Term::iri("http://example.org/Asinou");
        let labels: Vec<&Literal> = index
            .outgoing(&asinou)
            .filter_map(|t| t.object.as_literal())
            .collect();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].value, "Asinou");
        assert_eq!(labels[0].language.as_deref(), Some("en"));
        assert_eq!(labels[1].language.as_deref(), Some("el"));
        assert!(labels[0].datatype.is_none());
    }

    #[test]
    fn parses_ntriples_typed_literal() {
        let nt = "<http://example.org/A> <http://www.opengis.net/ont/geosparql#asWKT> \"POINT(33.0 35.0)\"^^<http://www.opengis.net/ont/geosparql#wktLiteral> .\n";
        let index = parse_str(nt, RdfFormat::NTriples).expect("valid n-triples");
        let about = index.triples_about(&Term::iri("http://example.org/A"));
        assert_eq!(about.len(), 1);
        assert_eq!(about[0].direction, Direction::Outgoing);
        let lit = about[0].triple.object.as_literal().expect("literal object");
        assert_eq!(lit.value, "POINT(33.0 35.0)");
        assert_eq!(
            lit.datatype.as_deref(),
            Some("http://www.opengis.net/ont/geosparql#wktLiteral")
        );
    }

    #[test]
    fn malformed_input_is_a_parse_error() {
        let err = parse_str("<http://example.org/A> <broken", RdfFormat::NTriples);
        assert!(matches!(err, Err(GraphError::Parse { .. })));
    }

    #[test]
    fn no_inputs_is_fatal() {
        assert!(matches!(load_paths(&[]), Err(GraphError::NoInput)));
    }

    #[test]
    fn directory_walk_skips_non_rdf_and_reports_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("notes.txt"), "not rdf").expect("write");
        let err = load_paths(&[dir.path().to_path_buf()]);
        assert!(matches!(err, Err(GraphError::Empty)));

        std::fs::write(dir.path().join("a.ttl"), TTL).expect("write");
        let index = load_paths(&[dir.path().to_path_buf()]).expect("loads");
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn explicit_unknown_extension_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("graph.rdf");
        std::fs::write(&path, "").expect("write");
        assert!(matches!(
            load_paths(&[path]),
            Err(GraphError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn blank_nodes_do_not_merge_across_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["a", "b"] {
            let ttl = format!(
                "@prefix ex: <http://example.org/> .\n\
                 @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .\n\
                 ex:{name} ex:span [ rdfs:label \"span of {name}\" ] .\n\
                 ex:{name} ex:part _:b1 .\n\
                 _:b1 rdfs:label \"part of {name}\" .\n"
            );
            std::fs::write(dir.path().join(format!("{name}.ttl")), ttl).expect("write");
        }
        let index = load_paths(&[dir.path().to_path_buf()]).expect("load");

        let span_of = |name: &str| {
            index
                .outgoing(&Term::iri(format!("http://example.org/{name}")))
                .find(|t| t.predicate == "http://example.org/span")
                .map(|t| t.object.clone())
                .expect("span triple")
        };
        let (span_a, span_b) = (span_of("a"), span_of("b"));
        assert_ne!(span_a, span_b);
        assert_eq!(index.outgoing(&span_a).count(), 1);
        assert_eq!(index.outgoing(&span_b).count(), 1);

        let first = Term::blank("f0_b1");
        let second = Term::blank("f1_b1");
        let label = |node: &Term| {
            index
                .outgoing(node)
                .filter_map(|t| t.object.as_literal())
                .map(|lit| lit.value.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(label(&first), vec!["part of a".to_string()]);
        assert_eq!(label(&second), vec!["part of b".to_string()]);
    }

    #[test]
    fn in_memory_blank_labels_are_kept() {
        let index = parse_str(
            "_:b1 <http://example.org/p> <http://example.org/o> .\n",
            RdfFormat::NTriples,
        )
        .expect("valid n-triples");
        assert_eq!(index.triples()[0].subject, Term::blank("b1"));
    }
}
