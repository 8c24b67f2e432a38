//! Heritage graph model encoded as typed Rust data.
//!
//! The `heritage-graph` crate holds the triple-level view of a cultural-heritage
//! knowledge graph (monuments, artworks, iconographic motifs and their
//! provenance, described with CIDOC-CRM-style relations) and the
//! [`GraphIndex`] that answers "which triples touch this entity" in time
//! proportional to the entity's degree.
//!
//! # Entry Point
//!
//! ```
//! use heritage_graph::{Direction, GraphIndex, Term, Triple};
//!
//! let index = GraphIndex::from_triples([Triple::new(
//!     Term::iri("http://example.org/ChurchA"),
//!     "http://www.cidoc-crm.org/cidoc-crm/P46_is_composed_of",
//!     Term::iri("http://example.org/NaveA"),
//! )]);
//! let about = index.triples_about(&Term::iri("http://example.org/NaveA"));
//! assert_eq!(about.len(), 1);
//! assert_eq!(about[0].direction, Direction::Incoming);
//! ```
//!
//! # Loading
//!
//! ```no_run
//! use std::path::PathBuf;
//!
//! let index = heritage_graph::loader::load_paths(&[PathBuf::from("data/")])
//!     .expect("graph must load");
//! println!("{} triples", index.len());
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod error;
pub mod index;
pub mod loader;
pub mod model;
pub mod vocab;

pub use error::GraphError;
pub use index::{GraphIndex, GraphIndexBuilder, TripleRef};
pub use model::{local_name, Direction, Literal, Term, Triple};
