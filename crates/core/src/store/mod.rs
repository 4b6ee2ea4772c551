//! Title persistence.
//!
//! The seeder only talks to the [`TitleStore`] trait. Writes are keyed by the
//! natural key `(title_id, content_id)`; the surrogate id belongs to the store.

mod sqlite;
mod types;

pub use sqlite::SqliteTitleStore;
pub use types::*;

use crate::title::{NaturalKey, TitleRecord};

/// Trait for title storage backends.
pub trait TitleStore: Send + Sync {
    /// Create tables and indexes if they don't exist. Idempotent.
    fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Insert a record, or overwrite every field of the record already stored
    /// under the same natural key. The stored id is kept on update.
    fn upsert(&self, record: &TitleRecord) -> Result<UpsertOutcome, StoreError>;

    /// All stored records, ordered by id.
    fn query_all(&self) -> Result<Vec<TitleRecord>, StoreError>;

    /// Look up a record by natural key.
    fn get(&self, key: &NaturalKey) -> Result<Option<TitleRecord>, StoreError>;

    /// Number of stored records.
    fn count(&self) -> Result<u64, StoreError>;
}
