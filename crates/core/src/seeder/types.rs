//! Types for row mapping and seeding.

use thiserror::Error;

use crate::store::StoreError;
use crate::title::NaturalKey;
use crate::tsv::TsvError;

/// A row that could not be turned into a title record.
///
/// `row` is the 1-based data row index within the table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("Row {row}: missing column {column:?}")]
    MissingField { row: usize, column: String },

    #[error("Row {row}: invalid value {value:?} for enum column {column:?}")]
    InvalidEnum {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Row {row}: invalid date {value:?} in column {column:?}")]
    InvalidDate {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Row {row}: invalid number {value:?} in column {column:?}")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },
}

impl MappingError {
    /// Short machine-friendly name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            MappingError::MissingField { .. } => "missing_field",
            MappingError::InvalidEnum { .. } => "invalid_enum",
            MappingError::InvalidDate { .. } => "invalid_date",
            MappingError::InvalidNumber { .. } => "invalid_number",
        }
    }
}

/// Why a single row failed during seeding.
#[derive(Debug, Error)]
pub enum RowError {
    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error("Store rejected {key}: {source}")]
    Store {
        key: NaturalKey,
        #[source]
        source: StoreError,
    },
}

/// Errors that stop a whole seeding run before any row is written.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read table: {0}")]
    Table(#[from] TsvError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// A failed row, kept for the report.
#[derive(Debug)]
pub struct RowFailure {
    pub row: usize,
    pub error: RowError,
}

/// Outcome of seeding one table.
#[derive(Debug, Default)]
pub struct SeedReport {
    pub source_type: String,
    pub total: u64,
    pub inserted: u64,
    pub updated: u64,
    pub failed: u64,
    pub failures: Vec<RowFailure>,
}

impl SeedReport {
    pub fn new(source_type: impl Into<String>) -> Self {
        Self {
            source_type: source_type.into(),
            ..Default::default()
        }
    }

    /// Rows written to the store, new or updated.
    pub fn succeeded(&self) -> u64 {
        self.inserted + self.updated
    }

    /// True only when no row failed.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}
