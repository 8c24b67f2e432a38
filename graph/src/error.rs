//! Errors raised while constructing the Graph Index.
//!
//! Every variant here is fatal for a generation run: without a Graph Index
//! no document can be attempted.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to construct a [`GraphIndex`](crate::GraphIndex).
#[derive(Debug, Error)]
pub enum GraphError {
    /// No input files or directories were supplied.
    #[error("no input graph supplied")]
    NoInput,

    /// An input path could not be opened or read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// The offending path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An input file is not valid Turtle / N-Triples.
    #[error("cannot parse {path}: {message}")]
    Parse {
        /// The offending path.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },

    /// An input file was named explicitly but its extension is not a
    /// supported RDF serialization.
    #[error("unsupported RDF serialization: {path} (expected .ttl or .nt)")]
    UnsupportedFormat {
        /// The offending path.
        path: PathBuf,
    },

    /// All inputs were read but they contained no triples.
    #[error("input graph contains no triples")]
    Empty,
}
