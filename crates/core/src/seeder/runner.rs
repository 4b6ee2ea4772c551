//! Table seeding.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info};

use super::{MappingError, RowError, RowFailure, SeedError, SeedReport, TitleMapper};
use crate::metrics;
use crate::store::{TitleStore, UpsertOutcome};
use crate::tsv::{read_table, RowMapping};

/// Writes mapped catalog rows to a title store.
pub struct Seeder {
    store: Arc<dyn TitleStore>,
    mapper: TitleMapper,
}

impl Seeder {
    pub fn new(store: Arc<dyn TitleStore>, mapper: TitleMapper) -> Self {
        Self { store, mapper }
    }

    /// Seeder with the standard catalog columns.
    pub fn with_default_mapper(store: Arc<dyn TitleStore>) -> Self {
        Self::new(store, TitleMapper::default())
    }

    pub fn mapper(&self) -> &TitleMapper {
        &self.mapper
    }

    /// Map and store a single row.
    pub fn seed_row(&self, row: &RowMapping) -> Result<UpsertOutcome, RowError> {
        let record = self.mapper.map(row)?;
        self.store
            .upsert(&record)
            .map_err(|source| RowError::Store {
                key: record.natural_key(),
                source,
            })
    }

    /// Seed every row in order. Failed rows are logged and counted; the rest
    /// still go through.
    pub fn seed_rows<I>(&self, source_type: &str, rows: I) -> SeedReport
    where
        I: IntoIterator<Item = RowMapping>,
    {
        let mut report = SeedReport::new(source_type);

        for row in rows {
            report.total += 1;
            match self.seed_row(&row) {
                Ok(outcome) => {
                    match outcome {
                        UpsertOutcome::Inserted(_) => report.inserted += 1,
                        UpsertOutcome::Updated(_) => report.updated += 1,
                    }
                    metrics::ROWS_INGESTED
                        .with_label_values(&[source_type, outcome.as_str()])
                        .inc();
                    info!(
                        source_type = %source_type,
                        row = row.row(),
                        title_id = row.get(super::columns::TITLE_ID).unwrap_or_default(),
                        id = outcome.id(),
                        action = outcome.as_str(),
                        "Stored title"
                    );
                }
                Err(e) => {
                    metrics::ROWS_FAILED
                        .with_label_values(&[source_type, error_kind(&e)])
                        .inc();
                    error!(source_type = %source_type, row = row.row(), error = %e, "Failed to ingest row");
                    report.failed += 1;
                    report.failures.push(RowFailure {
                        row: row.row(),
                        error: e,
                    });
                }
            }
        }

        info!(
            source_type = %source_type,
            total = report.total,
            inserted = report.inserted,
            updated = report.updated,
            failed = report.failed,
            "Seeding finished"
        );
        report
    }

    /// Read a catalog file and seed it. A table that fails to parse writes
    /// nothing.
    pub fn seed_file(&self, source_type: &str, path: &Path) -> Result<SeedReport, SeedError> {
        debug!(source_type = %source_type, path = %path.display(), "Seeding from file");
        self.store.ensure_schema()?;
        let rows = read_table(path)?;
        Ok(self.seed_rows(source_type, rows))
    }
}

fn error_kind(error: &RowError) -> &'static str {
    match error {
        RowError::Mapping(e) => MappingError::kind(e),
        RowError::Store { .. } => "store",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{SqliteTitleStore, StoreError};
    use crate::title::{NaturalKey, Region, TitleRecord};
    use crate::tsv::TsvError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "Title ID\tRegion\tName\tPKG direct link\tRAP\tContent ID\tLast Modification Date\tDownload .RAP file\tFile Size\tSHA256";

    fn line(title_id: &str, region: &str, name: &str, content_id: &str) -> String {
        format!(
            "{title_id}\t{region}\t{name}\thttp://example.com/{title_id}.pkg\tNOT REQUIRED\t{content_id}\t2019-03-01 12:00:00\t\t1024\tabcdef"
        )
    }

    fn table_file(lines: &[String]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for l in lines {
            writeln!(file, "{l}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn seeder() -> (Seeder, Arc<SqliteTitleStore>) {
        let store = Arc::new(SqliteTitleStore::in_memory().unwrap());
        (Seeder::with_default_mapper(store.clone()), store)
    }

    #[test]
    fn test_two_valid_rows() {
        let (seeder, store) = seeder();
        let file = table_file(&[
            line("NPEB00001", "EU", "Euro Game", "EP-1"),
            line("NPUB00002", "US", "US Game", "UP-2"),
        ]);

        let report = seeder.seed_file("PS3_GAMES", file.path()).unwrap();

        assert_eq!(report.total, 2);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed, 0);
        assert!(report.is_success());
        assert_eq!(store.count().unwrap(), 2);

        let eu = store.get(&NaturalKey::new("NPEB00001", "EP-1")).unwrap().unwrap();
        assert_eq!(eu.region, Region::EU);
        assert_eq!(eu.name, "Euro Game");
        assert!(!eu.is_rap_required);
        let us = store.get(&NaturalKey::new("NPUB00002", "UP-2")).unwrap().unwrap();
        assert_eq!(us.region, Region::US);
    }

    #[test]
    fn test_unknown_region_fails_only_that_row() {
        let (seeder, store) = seeder();
        let file = table_file(&[
            line("NPEB00001", "EU", "Good", "EP-1"),
            line("NPXX00002", "XX", "Bad", "XX-2"),
            line("NPJB00003", "JP", "Also Good", "JP-3"),
        ]);

        let report = seeder.seed_file("PS3_GAMES", file.path()).unwrap();

        assert_eq!(report.total, 3);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.failed, 1);
        assert!(!report.is_success());

        let failure = &report.failures[0];
        assert_eq!(failure.row, 2);
        assert!(matches!(
            &failure.error,
            RowError::Mapping(MappingError::InvalidEnum { value, .. }) if value == "XX"
        ));
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_duplicate_key_keeps_latest_name() {
        let (seeder, store) = seeder();
        let file = table_file(&[
            line("NPEB00001", "EU", "First Name", "EP-1"),
            line("NPEB00001", "EU", "Second Name", "EP-1"),
        ]);

        let report = seeder.seed_file("PS3_GAMES", file.path()).unwrap();

        assert_eq!(report.inserted, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(store.count().unwrap(), 1);
        let stored = store.get(&NaturalKey::new("NPEB00001", "EP-1")).unwrap().unwrap();
        assert_eq!(stored.name, "Second Name");
    }

    #[test]
    fn test_reingest_updates_in_place() {
        let (seeder, store) = seeder();
        let file = table_file(&[line("NPEB00001", "EU", "Game", "EP-1")]);

        seeder.seed_file("PS3_GAMES", file.path()).unwrap();
        let first_id = store.query_all().unwrap()[0].id;
        let report = seeder.seed_file("PS3_GAMES", file.path()).unwrap();

        assert_eq!(report.updated, 1);
        assert_eq!(store.query_all().unwrap()[0].id, first_id);
    }

    #[test]
    fn test_malformed_table_writes_nothing() {
        let (seeder, store) = seeder();
        let file = table_file(&[
            line("NPEB00001", "EU", "Game", "EP-1"),
            "only\tthree\tfields".to_string(),
        ]);

        let err = seeder.seed_file("PS3_GAMES", file.path()).unwrap_err();
        assert!(matches!(
            err,
            SeedError::Table(TsvError::MalformedRow { line: 3, expected: 10, actual: 3 })
        ));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_oversized_file_size_fails_row_and_keeps_store_readable() {
        let (seeder, store) = seeder();
        let oversized = line("NPEB00002", "EU", "Huge", "EP-2")
            .replace("\t1024\t", "\t18446744073709551615\t");
        let file = table_file(&[line("NPEB00001", "EU", "Game", "EP-1"), oversized]);

        let report = seeder.seed_file("PS3_GAMES", file.path()).unwrap();

        assert_eq!(report.inserted, 1);
        assert_eq!(report.failed, 1);
        assert!(matches!(
            &report.failures[0].error,
            RowError::Mapping(MappingError::InvalidNumber { value, .. }) if value == "18446744073709551615"
        ));
        assert_eq!(store.query_all().unwrap().len(), 1);
    }

    struct FailingStore;

    impl TitleStore for FailingStore {
        fn ensure_schema(&self) -> Result<(), StoreError> {
            Ok(())
        }
        fn upsert(&self, _record: &TitleRecord) -> Result<UpsertOutcome, StoreError> {
            Err(StoreError::Database("disk full".to_string()))
        }
        fn query_all(&self) -> Result<Vec<TitleRecord>, StoreError> {
            Ok(Vec::new())
        }
        fn get(&self, _key: &NaturalKey) -> Result<Option<TitleRecord>, StoreError> {
            Ok(None)
        }
        fn count(&self) -> Result<u64, StoreError> {
            Ok(0)
        }
    }

    #[test]
    fn test_store_failure_is_counted_per_row() {
        let seeder = Seeder::with_default_mapper(Arc::new(FailingStore));
        let file = table_file(&[
            line("NPEB00001", "EU", "A", "EP-1"),
            line("NPEB00002", "EU", "B", "EP-2"),
        ]);

        let report = seeder.seed_file("PS3_GAMES", file.path()).unwrap();

        assert_eq!(report.failed, 2);
        assert!(matches!(
            &report.failures[1].error,
            RowError::Store { key, .. } if key.title_id == "NPEB00002"
        ));
    }
}
