//! Error types for the document generator.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while configuring the generator or persisting documents.
#[derive(Debug, Error)]
pub enum DocsError {
    /// The generator configuration file is unreadable or invalid.
    #[error("invalid generator config {path}: {message}")]
    Config {
        /// The offending file (or `<inline>`).
        path: PathBuf,
        /// What was wrong with it.
        message: String,
    },

    /// The predicate mapping table is unreadable or invalid.
    #[error("invalid predicate table {path}: {message}")]
    PredicateTable {
        /// The offending file (or `<bundled>` / `<inline>`).
        path: PathBuf,
        /// What was wrong with it.
        message: String,
    },

    /// A document, manifest, or output-directory entry could not be written
    /// or removed.
    #[error("cannot write {path}: {source}")]
    Persistence {
        /// The target path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
