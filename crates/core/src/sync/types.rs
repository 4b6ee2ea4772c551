//! Types for sync runs.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::fetch::FetchOutcome;
use crate::seeder::SeedReport;

/// Errors that stop a sync run before any source is processed.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Failed to prepare working directory {path}: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unknown source type: {0}")]
    UnknownSource(String),
}

/// What happened to one source.
#[derive(Debug)]
pub enum SourceOutcome {
    /// The table was read and seeded. Individual rows may still have failed.
    Ingested(SeedReport),
    /// The transfer failed; nothing was ingested.
    FetchFailed(String),
    /// The cache file could not be read or the store could not be prepared.
    IngestFailed(String),
}

impl SourceOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceOutcome::Ingested(_) => "ingested",
            SourceOutcome::FetchFailed(_) => "fetch_failed",
            SourceOutcome::IngestFailed(_) => "ingest_failed",
        }
    }
}

/// Result of syncing one source.
#[derive(Debug)]
pub struct SourceReport {
    pub source_type: String,
    pub cache_path: PathBuf,
    /// `None` when fetching was skipped or failed.
    pub fetch: Option<FetchOutcome>,
    pub outcome: SourceOutcome,
}

impl SourceReport {
    /// Ingested with zero failed rows.
    pub fn is_success(&self) -> bool {
        matches!(&self.outcome, SourceOutcome::Ingested(seed) if seed.is_success())
    }

    pub fn seed_report(&self) -> Option<&SeedReport> {
        match &self.outcome {
            SourceOutcome::Ingested(seed) => Some(seed),
            _ => None,
        }
    }
}

/// Aggregate counts over a sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncTotals {
    pub sources: usize,
    pub failed_sources: usize,
    pub rows: u64,
    pub inserted: u64,
    pub updated: u64,
    pub failed_rows: u64,
}

/// Result of a sync run, one entry per source in registry order.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub sources: Vec<SourceReport>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.sources.iter().all(SourceReport::is_success)
    }

    pub fn totals(&self) -> SyncTotals {
        let mut totals = SyncTotals {
            sources: self.sources.len(),
            ..Default::default()
        };
        for report in &self.sources {
            if !report.is_success() {
                totals.failed_sources += 1;
            }
            if let Some(seed) = report.seed_report() {
                totals.rows += seed.total;
                totals.inserted += seed.inserted;
                totals.updated += seed.updated;
                totals.failed_rows += seed.failed;
            }
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingested(source_type: &str, inserted: u64, failed: u64) -> SourceReport {
        let mut seed = SeedReport::new(source_type);
        seed.total = inserted + failed;
        seed.inserted = inserted;
        seed.failed = failed;
        SourceReport {
            source_type: source_type.to_string(),
            cache_path: PathBuf::from(format!("{source_type}.tsv")),
            fetch: None,
            outcome: SourceOutcome::Ingested(seed),
        }
    }

    #[test]
    fn test_totals() {
        let report = SyncReport {
            sources: vec![
                ingested("A", 3, 0),
                ingested("B", 1, 1),
                SourceReport {
                    source_type: "C".to_string(),
                    cache_path: PathBuf::from("C.tsv"),
                    fetch: None,
                    outcome: SourceOutcome::FetchFailed("404".to_string()),
                },
            ],
        };

        let totals = report.totals();
        assert_eq!(totals.sources, 3);
        assert_eq!(totals.failed_sources, 2);
        assert_eq!(totals.rows, 5);
        assert_eq!(totals.inserted, 4);
        assert_eq!(totals.failed_rows, 1);
        assert!(!report.is_success());
    }

    #[test]
    fn test_empty_report_is_success() {
        assert!(SyncReport::default().is_success());
    }
}
