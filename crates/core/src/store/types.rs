//! Types for title storage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "id", rename_all = "snake_case")]
pub enum UpsertOutcome {
    /// A new row was created with this id.
    Inserted(i64),
    /// The existing row with this id was overwritten.
    Updated(i64),
}

impl UpsertOutcome {
    pub fn id(&self) -> i64 {
        match self {
            UpsertOutcome::Inserted(id) | UpsertOutcome::Updated(id) => *id,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UpsertOutcome::Inserted(_) => "inserted",
            UpsertOutcome::Updated(_) => "updated",
        }
    }
}

/// Errors for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}
