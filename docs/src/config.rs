//! Generator configuration, read from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration.
//!
//! ```toml
//! preferred_language = "en"
//! max_comment_chars = 600
//! truncation_marker = " [...]"
//! max_label_chars = 80
//! format = "markdown"
//! predicates = "predicates.toml"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::DocsError;

/// Serialization of generated documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown text, written as `.md`.
    #[default]
    Markdown,
    /// Markdown rendered to a standalone HTML page, written as `.html`.
    Html,
}

impl OutputFormat {
    /// File extension used for documents in this format.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Html => "html",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "html" => Ok(OutputFormat::Html),
            other => Err(format!("unknown output format '{other}' (expected markdown or html)")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Markdown => f.write_str("markdown"),
            OutputFormat::Html => f.write_str("html"),
        }
    }
}

/// Tunables for entity resolution, rendering, and naming.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Language tag whose label wins canonical-label selection. `None` means
    /// first-seen label.
    pub preferred_language: Option<String>,
    /// Comments longer than this many characters are cut and suffixed with
    /// `truncation_marker`. `None` disables truncation.
    pub max_comment_chars: Option<usize>,
    /// Appended to truncated comments.
    pub truncation_marker: String,
    /// Maximum number of characters taken from the cleaned label when
    /// deriving a filename.
    pub max_label_chars: usize,
    /// Document serialization.
    pub format: OutputFormat,
    /// External predicate mapping table layered over the bundled one.
    pub predicates: Option<PathBuf>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            preferred_language: None,
            max_comment_chars: None,
            truncation_marker: String::from(" [...]"),
            max_label_chars: 80,
            format: OutputFormat::Markdown,
            predicates: None,
        }
    }
}

impl GeneratorConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`DocsError::Config`] if the text is not valid TOML or has
    /// unknown keys or out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, DocsError> {
        Self::parse(text, Path::new("<inline>"))
    }

    /// Reads and parses a configuration file. Relative `predicates` paths
    /// are resolved against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`DocsError::Config`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, DocsError> {
        let text = std::fs::read_to_string(path).map_err(|e| DocsError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let mut config = Self::parse(&text, path)?;
        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        config.predicates = config.predicates.map(|predicates| {
            if predicates.is_relative() {
                dir.join(predicates)
            } else {
                predicates
            }
        });
        Ok(config)
    }

    fn parse(text: &str, path: &Path) -> Result<Self, DocsError> {
        let config: Self = toml::from_str(text).map_err(|e| DocsError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if config.max_label_chars == 0 {
            return Err(DocsError::Config {
                path: path.to_path_buf(),
                message: "max_label_chars must be at least 1".to_string(),
            });
        }
        Ok(config)
    }
}
