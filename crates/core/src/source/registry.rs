//! JSON-backed source registry.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Source, SourceError};

/// Ordered collection of catalog sources.
///
/// Serialized as a bare JSON array of `{"SourceType", "SourceUrl"}` objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceRegistry {
    sources: Vec<Source>,
}

impl SourceRegistry {
    pub fn new(sources: Vec<Source>) -> Self {
        let registry = Self { sources };
        registry.warn_on_duplicates();
        registry
    }

    /// Load a registry from a JSON file. Only reads `path`.
    pub fn from_file(path: &Path) -> Result<Self, SourceError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SourceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_json_str(&contents)?;
        debug!(path = %path.display(), sources = registry.len(), "Loaded source registry");
        Ok(registry)
    }

    pub fn from_json_str(json: &str) -> Result<Self, SourceError> {
        let sources: Vec<Source> =
            serde_json::from_str(json).map_err(SourceError::Deserialization)?;
        Ok(Self::new(sources))
    }

    /// Pretty-printed JSON document.
    pub fn to_json_string(&self) -> Result<String, SourceError> {
        serde_json::to_string_pretty(self).map_err(SourceError::Serialization)
    }

    /// Write the registry to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), SourceError> {
        let json = self.to_json_string()?;
        std::fs::write(path, json).map_err(|source| SourceError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Source> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// First source with this type tag.
    pub fn get(&self, source_type: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.source_type == source_type)
    }

    /// Add a source, replacing the one with the same type tag in place.
    /// Returns the replaced source.
    pub fn insert(&mut self, source: Source) -> Option<Source> {
        match self
            .sources
            .iter_mut()
            .find(|s| s.source_type == source.source_type)
        {
            Some(existing) => Some(std::mem::replace(existing, source)),
            None => {
                self.sources.push(source);
                None
            }
        }
    }

    /// Remove every source with this type tag. Returns the first removed.
    pub fn remove(&mut self, source_type: &str) -> Option<Source> {
        let index = self
            .sources
            .iter()
            .position(|s| s.source_type == source_type)?;
        let removed = self.sources.remove(index);
        self.sources.retain(|s| s.source_type != source_type);
        Some(removed)
    }

    // Two sources with one type tag share a cache file.
    fn warn_on_duplicates(&self) {
        let mut seen = HashSet::new();
        for source in &self.sources {
            if !seen.insert(source.source_type.as_str()) {
                warn!(
                    source_type = %source.source_type,
                    "Duplicate source type; sources will overwrite each other's cache file"
                );
            }
        }
    }
}

impl<'a> IntoIterator for &'a SourceRegistry {
    type Item = &'a Source;
    type IntoIter = std::slice::Iter<'a, Source>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Source> for SourceRegistry {
    fn from_iter<I: IntoIterator<Item = Source>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
