//! Types for catalog sources.

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Extension of locally cached catalog files.
pub const CACHE_FILE_EXTENSION: &str = "tsv";

/// A remote catalog file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Catalog type tag, e.g. `PS3_GAMES`. Unique within a registry.
    #[serde(rename = "SourceType")]
    pub source_type: String,
    #[serde(rename = "SourceUrl")]
    pub source_url: String,
}

impl Source {
    pub fn new(source_type: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            source_type: source_type.into(),
            source_url: source_url.into(),
        }
    }

    /// File name of the local cache copy: `<source_type>.tsv`.
    pub fn cache_file_name(&self) -> String {
        format!("{}.{}", self.source_type, CACHE_FILE_EXTENSION)
    }

    /// Whether the URL carries an HTTP scheme marker. Nothing else is checked.
    pub fn has_http_scheme(&self) -> bool {
        self.source_url.contains("http")
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.source_type, self.source_url)
    }
}

/// Errors for source registry operations.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read source registry {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write source registry {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid source registry document: {0}")]
    Deserialization(#[source] serde_json::Error),

    #[error("Failed to serialize source registry: {0}")]
    Serialization(#[source] serde_json::Error),
}
