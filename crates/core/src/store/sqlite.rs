//! SQLite-backed title store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::{StoreError, TitleStore, UpsertOutcome};
use crate::title::{NaturalKey, Region, TitleRecord};

/// Dates are stored as ISO 8601 text without offset; catalog dates carry none.
const STORED_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const SELECT_COLUMNS: &str = "id, title_id, content_id, region, name, last_modified_date,
    pkg_file_url, pkg_file_size, pkg_file_hash, rap, rap_file_url,
    is_rap_required, is_license_unlocked_by_dlc";

/// SQLite-backed title store.
///
/// The connection sits behind a mutex, so concurrent ingestion jobs are
/// serialized here; each upsert is its own transaction.
pub struct SqliteTitleStore {
    conn: Mutex<Connection>,
}

impl SqliteTitleStore {
    /// Open (or create) the database file and make sure the schema exists.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.ensure_schema()?;
        debug!(path = %path.display(), "Opened title store");
        Ok(store)
    }

    /// Create an in-memory SQLite store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Internal("title store mutex poisoned".to_string()))
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<TitleRecord> {
        let region_str: String = row.get(3)?;
        let region = region_str
            .parse::<Region>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

        let last_modified_date = row
            .get::<_, Option<String>>(5)?
            .map(|s| NaiveDateTime::parse_from_str(&s, STORED_DATE_FORMAT))
            .transpose()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

        Ok(TitleRecord {
            id: Some(row.get(0)?),
            title_id: row.get(1)?,
            content_id: row.get(2)?,
            region,
            name: row.get(4)?,
            last_modified_date,
            pkg_file_url: row.get(6)?,
            pkg_file_size: row.get(7)?,
            pkg_file_hash: row.get(8)?,
            rap: row.get(9)?,
            rap_file_url: row.get(10)?,
            is_rap_required: row.get(11)?,
            is_license_unlocked_by_dlc: row.get(12)?,
        })
    }
}

impl TitleStore for SqliteTitleStore {
    fn ensure_schema(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
            -- One row per (title_id, content_id); id is the surrogate key
            CREATE TABLE IF NOT EXISTS titles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title_id TEXT NOT NULL,
                content_id TEXT NOT NULL,
                region TEXT NOT NULL,
                name TEXT NOT NULL,
                last_modified_date TEXT,
                pkg_file_url TEXT,
                pkg_file_size INTEGER NOT NULL DEFAULT 0,
                pkg_file_hash TEXT NOT NULL DEFAULT '',
                rap TEXT NOT NULL DEFAULT '',
                rap_file_url TEXT,
                is_rap_required BOOLEAN NOT NULL DEFAULT 0,
                is_license_unlocked_by_dlc BOOLEAN NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL,
                UNIQUE(title_id, content_id)
            );

            CREATE INDEX IF NOT EXISTS idx_titles_region ON titles(region);
            CREATE INDEX IF NOT EXISTS idx_titles_name ON titles(name);
            "#,
        )?;
        Ok(())
    }

    fn upsert(&self, record: &TitleRecord) -> Result<UpsertOutcome, StoreError> {
        let pkg_file_size = i64::try_from(record.pkg_file_size).map_err(|_| {
            StoreError::Internal(format!(
                "File size {} of {} does not fit the titles table",
                record.pkg_file_size,
                record.natural_key()
            ))
        })?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let now_str = Utc::now().to_rfc3339();
        let last_modified = record
            .last_modified_date
            .map(|d| d.format(STORED_DATE_FORMAT).to_string());

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM titles WHERE title_id = ?1 AND content_id = ?2",
                params![&record.title_id, &record.content_id],
                |row| row.get(0),
            )
            .optional()?;

        let outcome = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE titles SET
                        region = ?2,
                        name = ?3,
                        last_modified_date = ?4,
                        pkg_file_url = ?5,
                        pkg_file_size = ?6,
                        pkg_file_hash = ?7,
                        rap = ?8,
                        rap_file_url = ?9,
                        is_rap_required = ?10,
                        is_license_unlocked_by_dlc = ?11,
                        updated_at = ?12
                     WHERE id = ?1",
                    params![
                        id,
                        record.region.as_str(),
                        &record.name,
                        &last_modified,
                        &record.pkg_file_url,
                        pkg_file_size,
                        &record.pkg_file_hash,
                        &record.rap,
                        &record.rap_file_url,
                        record.is_rap_required,
                        record.is_license_unlocked_by_dlc,
                        &now_str,
                    ],
                )?;
                UpsertOutcome::Updated(id)
            }
            None => {
                tx.execute(
                    "INSERT INTO titles (title_id, content_id, region, name, last_modified_date,
                        pkg_file_url, pkg_file_size, pkg_file_hash, rap, rap_file_url,
                        is_rap_required, is_license_unlocked_by_dlc, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                    params![
                        &record.title_id,
                        &record.content_id,
                        record.region.as_str(),
                        &record.name,
                        &last_modified,
                        &record.pkg_file_url,
                        pkg_file_size,
                        &record.pkg_file_hash,
                        &record.rap,
                        &record.rap_file_url,
                        record.is_rap_required,
                        record.is_license_unlocked_by_dlc,
                        &now_str,
                    ],
                )?;
                UpsertOutcome::Inserted(tx.last_insert_rowid())
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    fn query_all(&self) -> Result<Vec<TitleRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("SELECT {SELECT_COLUMNS} FROM titles ORDER BY id"))?;
        let rows = stmt.query_map([], Self::row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn get(&self, key: &NaturalKey) -> Result<Option<TitleRecord>, StoreError> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                &format!(
                    "SELECT {SELECT_COLUMNS} FROM titles WHERE title_id = ?1 AND content_id = ?2"
                ),
                params![&key.title_id, &key.content_id],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn count(&self) -> Result<u64, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM titles", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn record(title_id: &str, content_id: &str, name: &str) -> TitleRecord {
        TitleRecord {
            id: None,
            title_id: title_id.to_string(),
            content_id: content_id.to_string(),
            region: Region::EU,
            name: name.to_string(),
            last_modified_date: None,
            pkg_file_url: Some("http://example.com/game.pkg".to_string()),
            pkg_file_size: 1024,
            pkg_file_hash: "ab".repeat(32),
            rap: String::new(),
            rap_file_url: None,
            is_rap_required: false,
            is_license_unlocked_by_dlc: false,
        }
    }

    #[test]
    fn test_insert_then_get() {
        let store = SqliteTitleStore::in_memory().unwrap();
        let outcome = store.upsert(&record("NPEB00001", "EP-1", "Game")).unwrap();
        assert!(matches!(outcome, UpsertOutcome::Inserted(_)));

        let stored = store
            .get(&NaturalKey::new("NPEB00001", "EP-1"))
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, Some(outcome.id()));
        assert_eq!(stored.name, "Game");
        assert_eq!(stored.region, Region::EU);
        assert_eq!(stored.pkg_file_size, 1024);
    }

    #[test]
    fn test_upsert_same_key_overwrites_and_keeps_id() {
        let store = SqliteTitleStore::in_memory().unwrap();
        let first = store.upsert(&record("NPEB00001", "EP-1", "Old")).unwrap();

        let mut changed = record("NPEB00001", "EP-1", "New");
        changed.pkg_file_url = None;
        changed.rap = "00112233445566778899aabbccddeeff".to_string();
        let second = store.upsert(&changed).unwrap();

        assert_eq!(second, UpsertOutcome::Updated(first.id()));
        assert_eq!(store.count().unwrap(), 1);

        let stored = store.query_all().unwrap().remove(0);
        assert_eq!(stored.name, "New");
        assert_eq!(stored.pkg_file_url, None);
        assert_eq!(stored.rap, "00112233445566778899aabbccddeeff");
    }

    #[test]
    fn test_same_title_id_different_content_id_are_distinct() {
        let store = SqliteTitleStore::in_memory().unwrap();
        store.upsert(&record("NPEB00001", "EP-1", "Game")).unwrap();
        store.upsert(&record("NPEB00001", "EP-2", "Game DLC")).unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_date_round_trip() {
        let store = SqliteTitleStore::in_memory().unwrap();
        let mut r = record("NPUB30001", "UP-1", "Dated");
        r.last_modified_date = Some(
            NaiveDate::from_ymd_opt(2018, 5, 14)
                .unwrap()
                .and_hms_opt(3, 45, 28)
                .unwrap(),
        );
        store.upsert(&r).unwrap();

        let stored = store.get(&r.natural_key()).unwrap().unwrap();
        assert_eq!(stored.last_modified_date, r.last_modified_date);
    }

    #[test]
    fn test_query_all_ordered_by_id() {
        let store = SqliteTitleStore::in_memory().unwrap();
        store.upsert(&record("B", "2", "second")).unwrap();
        store.upsert(&record("A", "1", "first")).unwrap();

        let names: Vec<_> = store
            .query_all()
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["second", "first"]);
    }

    #[test]
    fn test_get_missing_is_none() {
        let store = SqliteTitleStore::in_memory().unwrap();
        assert!(store.get(&NaturalKey::new("X", "Y")).unwrap().is_none());
    }

    #[test]
    fn test_file_store_persists_and_schema_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("titles.db");

        {
            let store = SqliteTitleStore::new(&path).unwrap();
            store.upsert(&record("NPJB00001", "JP-1", "Persisted")).unwrap();
            store.ensure_schema().unwrap();
        }

        let reopened = SqliteTitleStore::new(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
    }

    #[test]
    fn test_oversized_file_size_is_rejected() {
        let store = SqliteTitleStore::in_memory().unwrap();
        let mut oversized = record("NPEB00001", "EP-1", "Huge");
        oversized.pkg_file_size = u64::MAX;

        let err = store.upsert(&oversized).unwrap_err();
        assert!(matches!(err, StoreError::Internal(_)));
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.query_all().unwrap().is_empty());

        oversized.pkg_file_size = i64::MAX as u64;
        store.upsert(&oversized).unwrap();
        assert_eq!(store.query_all().unwrap()[0].pkg_file_size, i64::MAX as u64);
    }
}
