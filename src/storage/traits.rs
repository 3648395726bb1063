//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{
    CaptureWrite, CatalogFields, CatalogItemRecord, MediaAssetRecord, MediaKind, PerformerFields,
    PerformerRecord, RawCapture, Upserted,
};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Catalog item not found: {0}")]
    ItemNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines every database operation the harvester needs. All
/// writes are keyed by natural keys and are safe to repeat: rows are inserted
/// when absent, and existing rows only have null columns filled.
pub trait Storage {
    // ===== Capture Cache =====

    /// Gets the live capture for a (source, local-id) key
    fn get_capture(&self, source: &str, local_id: &str) -> StorageResult<Option<RawCapture>>;

    /// Writes a capture, comparing its hash to the stored one
    ///
    /// An unchanged hash leaves `processed_at` untouched. A changed or absent
    /// row is upserted with `processed_at` cleared.
    fn put_capture(
        &mut self,
        source: &str,
        local_id: &str,
        url: &str,
        text: &str,
        content_hash: &str,
    ) -> StorageResult<CaptureWrite>;

    /// Stamps `processed_at` on a capture
    fn mark_capture_processed(&mut self, source: &str, local_id: &str) -> StorageResult<()>;

    /// Lists captures for a source that still need processing, ordered by local id
    fn pending_captures(&self, source: &str) -> StorageResult<Vec<RawCapture>>;

    // ===== Batching =====

    /// Opens a write batch (transaction)
    fn begin_batch(&mut self) -> StorageResult<()>;

    /// Commits the current write batch
    fn commit_batch(&mut self) -> StorageResult<()>;

    /// Abandons the current write batch
    fn rollback_batch(&mut self) -> StorageResult<()>;

    // ===== Catalog Items =====

    /// Inserts a catalog item, or fills null columns of the existing one
    fn upsert_catalog_item(
        &mut self,
        source: &str,
        local_id: &str,
        fields: &CatalogFields,
    ) -> StorageResult<Upserted>;

    /// Gets a catalog item by natural key
    fn get_catalog_item(
        &self,
        source: &str,
        local_id: &str,
    ) -> StorageResult<Option<CatalogItemRecord>>;

    // ===== Performers =====

    /// Inserts a performer by exact name, or fills null attributes
    fn upsert_performer(&mut self, name: &str, fields: &PerformerFields)
        -> StorageResult<Upserted>;

    /// Gets a performer by exact name
    fn get_performer_by_name(&self, name: &str) -> StorageResult<Option<PerformerRecord>>;

    /// Records an alternate name for a performer; returns true if inserted
    fn add_performer_alias(
        &mut self,
        performer_id: i64,
        alias: &str,
        source: &str,
        is_primary: bool,
    ) -> StorageResult<bool>;

    /// Gets all aliases of a performer
    fn get_performer_aliases(&self, performer_id: i64) -> StorageResult<Vec<String>>;

    /// Links a performer to an item; returns true if the pair was new
    fn link_performer(&mut self, item_id: i64, performer_id: i64) -> StorageResult<bool>;

    /// Gets the performer names linked to an item
    fn get_item_performers(&self, item_id: i64) -> StorageResult<Vec<String>>;

    // ===== Tags =====

    /// Inserts a tag by name if absent and returns its id
    fn upsert_tag(&mut self, name: &str) -> StorageResult<i64>;

    /// Links a tag to an item; returns true if the pair was new
    fn link_tag(&mut self, item_id: i64, tag_id: i64) -> StorageResult<bool>;

    /// Gets the tag names linked to an item
    fn get_item_tags(&self, item_id: i64) -> StorageResult<Vec<String>>;

    // ===== Media =====

    /// Attaches a media asset to an item if the URL is not attached yet
    fn add_media_asset(
        &mut self,
        item_id: i64,
        url: &str,
        kind: MediaKind,
        display_order: u32,
        origin: &str,
    ) -> StorageResult<bool>;

    /// Gets the media assets of an item in display order
    fn get_media_assets(&self, item_id: i64) -> StorageResult<Vec<MediaAssetRecord>>;

    // ===== Statistics =====

    /// Counts catalog items
    fn count_catalog_items(&self) -> StorageResult<u64>;

    /// Counts catalog items per source, largest first
    fn count_items_by_source(&self) -> StorageResult<Vec<(String, u64)>>;

    /// Counts performers
    fn count_performers(&self) -> StorageResult<u64>;

    /// Counts tags
    fn count_tags(&self) -> StorageResult<u64>;

    /// Counts item–performer association rows
    fn count_performer_links(&self) -> StorageResult<u64>;

    /// Counts captures by processed state
    fn count_captures(&self, processed: bool) -> StorageResult<u64>;
}
