//! Types for TSV table reading.

use std::collections::HashMap;

use thiserror::Error;

/// One data line of a table, keyed by header column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMapping {
    /// 1-based index of the data row (the header is not counted).
    row: usize,
    values: HashMap<String, String>,
}

impl RowMapping {
    /// Build a row from `(column, value)` pairs. Later duplicates win.
    pub fn from_pairs<K, V, I>(row: usize, pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { row, values }
    }

    /// 1-based data row index.
    pub fn row(&self) -> usize {
        self.row
    }

    /// Value of a column, if the column exists.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    /// Number of distinct columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// Errors that abort reading a table.
#[derive(Debug, Error)]
pub enum TsvError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read table: {0}")]
    Read(#[from] csv::Error),

    #[error("Table has no header line")]
    MissingHeader,

    #[error("Malformed row at line {line}: expected {expected} fields, got {actual}")]
    MalformedRow {
        /// 1-based physical line number in the file (header is line 1).
        line: usize,
        expected: usize,
        actual: usize,
    },
}
