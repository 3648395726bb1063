//! Storage module for persisting captures and catalog data
//!
//! This module handles all database operations for the harvester, including:
//! - SQLite database initialization and schema management
//! - The raw capture cache keyed by (source, local-id)
//! - Natural-key upserts for catalog items, performers and tags
//! - Insert-if-absent association rows and media assets

mod schema;
mod sqlite;
mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::HarvestError;
use chrono::NaiveDate;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(HarvestError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, HarvestError> {
    SqliteStorage::new(path)
}

/// Normalizes a (source, local-id) pair into its natural key form
///
/// Both halves are trimmed and lowercased so that `ABC-001` and ` abc-001`
/// address the same row.
pub fn natural_key(source: &str, local_id: &str) -> (String, String) {
    (
        source.trim().to_lowercase(),
        local_id.trim().to_lowercase(),
    )
}

/// Formats a date the way it is stored
pub(crate) fn date_to_db(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parses a stored date
pub(crate) fn date_from_db(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// A cached fetch result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCapture {
    pub source: String,
    pub local_id: String,
    pub url: String,
    pub text: String,
    pub content_hash: String,
    pub fetched_at: String,
    pub processed_at: Option<String>,
}

impl RawCapture {
    /// Returns true once the capture has been folded into the catalog
    pub fn is_processed(&self) -> bool {
        self.processed_at.is_some()
    }
}

/// What a capture write did to the stored row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureWrite {
    /// No row existed for the key
    Inserted,
    /// The stored hash matched; the processed flag was left alone
    Unchanged,
    /// The content differed; the row was replaced and flagged for reprocessing
    Changed,
}

/// Field values for a catalog item upsert
///
/// `None` means "unknown"; it never clears a stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub duration_minutes: Option<u32>,
    pub cover_url: Option<String>,
}

/// A catalog item row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItemRecord {
    pub id: i64,
    pub source: String,
    pub local_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub duration_minutes: Option<u32>,
    pub cover_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Attribute values for a performer upsert
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerformerFields {
    pub reading: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub height_cm: Option<u32>,
    pub blood_type: Option<String>,
    pub birthplace: Option<String>,
}

/// A performer row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformerRecord {
    pub id: i64,
    pub name: String,
    pub reading: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub height_cm: Option<u32>,
    pub blood_type: Option<String>,
    pub birthplace: Option<String>,
}

/// Result of a natural-key upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Upserted {
    /// Surrogate id of the row
    pub id: i64,
    /// True if the row was inserted by this call
    pub created: bool,
    /// Number of previously-null columns filled by this call
    pub filled: usize,
}

/// Kind of media attached to a catalog item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Thumbnail,
    Sample,
}

impl MediaKind {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Thumbnail => "thumbnail",
            Self::Sample => "sample",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "thumbnail" => Some(Self::Thumbnail),
            "sample" => Some(Self::Sample),
            _ => None,
        }
    }
}

/// A media asset row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAssetRecord {
    pub item_id: i64,
    pub url: String,
    pub kind: MediaKind,
    pub display_order: u32,
    pub origin: String,
}
