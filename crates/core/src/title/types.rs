//! Types for catalog title records.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Region a title was published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Region {
    #[default]
    None,
    EU,
    US,
    JP,
    ASIA,
}

impl Region {
    pub const ALL: [Region; 5] = [
        Region::None,
        Region::EU,
        Region::US,
        Region::JP,
        Region::ASIA,
    ];

    /// The exact tag used in catalog files and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::None => "None",
            Region::EU => "EU",
            Region::US => "US",
            Region::JP => "JP",
            Region::ASIA => "ASIA",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown region: {0:?}")]
pub struct UnknownRegion(pub String);

impl FromStr for Region {
    type Err = UnknownRegion;

    /// Case-sensitive: "eu" is not a region.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownRegion(s.to_string()))
    }
}

/// Business key of a title: unique per `(title_id, content_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NaturalKey {
    pub title_id: String,
    pub content_id: String,
}

impl NaturalKey {
    pub fn new(title_id: impl Into<String>, content_id: impl Into<String>) -> Self {
        Self {
            title_id: title_id.into(),
            content_id: content_id.into(),
        }
    }
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.title_id, self.content_id)
    }
}

/// A catalog title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleRecord {
    /// Store-assigned surrogate key. `None` until the record has been stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title_id: String,
    pub content_id: String,
    pub region: Region,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_date: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pkg_file_url: Option<String>,
    pub pkg_file_size: u64,
    /// SHA-256 of the package as published by the source. Never verified here.
    pub pkg_file_hash: String,
    /// License key material; empty when the catalog has none.
    pub rap: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rap_file_url: Option<String>,
    pub is_rap_required: bool,
    pub is_license_unlocked_by_dlc: bool,
}

impl TitleRecord {
    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey::new(self.title_id.clone(), self.content_id.clone())
    }
}

impl fmt::Display for TitleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}] {}",
            self.title_id, self.content_id, self.region, self.name
        )
    }
}
