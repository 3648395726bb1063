//! Test backend that fails selected operations
//!
//! Delegates everything to an in-memory [`SqliteStorage`] except the
//! operations told to fail.

use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    CaptureWrite, CatalogFields, CatalogItemRecord, MediaAssetRecord, MediaKind, PerformerFields,
    PerformerRecord, RawCapture, SqliteStorage, Upserted,
};

pub(crate) struct FaultyStorage {
    pub inner: SqliteStorage,
    /// Number of upcoming commits that fail, leaving the transaction open
    pub failing_commits: usize,
    /// Capture lookups fail while set
    pub failing_lookups: bool,
}

impl FaultyStorage {
    pub fn new() -> Self {
        Self {
            inner: SqliteStorage::new_in_memory().unwrap(),
            failing_commits: 0,
            failing_lookups: false,
        }
    }
}

impl Storage for FaultyStorage {
    fn get_capture(&self, source: &str, local_id: &str) -> StorageResult<Option<RawCapture>> {
        if self.failing_lookups {
            return Err(StorageError::Database("disk I/O error".to_string()));
        }
        self.inner.get_capture(source, local_id)
    }

    fn put_capture(
        &mut self,
        source: &str,
        local_id: &str,
        url: &str,
        text: &str,
        content_hash: &str,
    ) -> StorageResult<CaptureWrite> {
        self.inner.put_capture(source, local_id, url, text, content_hash)
    }

    fn mark_capture_processed(&mut self, source: &str, local_id: &str) -> StorageResult<()> {
        self.inner.mark_capture_processed(source, local_id)
    }

    fn pending_captures(&self, source: &str) -> StorageResult<Vec<RawCapture>> {
        self.inner.pending_captures(source)
    }

    fn begin_batch(&mut self) -> StorageResult<()> {
        self.inner.begin_batch()
    }

    fn commit_batch(&mut self) -> StorageResult<()> {
        if self.failing_commits > 0 {
            self.failing_commits -= 1;
            return Err(StorageError::Database("database is locked".to_string()));
        }
        self.inner.commit_batch()
    }

    fn rollback_batch(&mut self) -> StorageResult<()> {
        self.inner.rollback_batch()
    }

    fn upsert_catalog_item(
        &mut self,
        source: &str,
        local_id: &str,
        fields: &CatalogFields,
    ) -> StorageResult<Upserted> {
        self.inner.upsert_catalog_item(source, local_id, fields)
    }

    fn get_catalog_item(
        &self,
        source: &str,
        local_id: &str,
    ) -> StorageResult<Option<CatalogItemRecord>> {
        self.inner.get_catalog_item(source, local_id)
    }

    fn upsert_performer(
        &mut self,
        name: &str,
        fields: &PerformerFields,
    ) -> StorageResult<Upserted> {
        self.inner.upsert_performer(name, fields)
    }

    fn get_performer_by_name(&self, name: &str) -> StorageResult<Option<PerformerRecord>> {
        self.inner.get_performer_by_name(name)
    }

    fn add_performer_alias(
        &mut self,
        performer_id: i64,
        alias: &str,
        source: &str,
        is_primary: bool,
    ) -> StorageResult<bool> {
        self.inner
            .add_performer_alias(performer_id, alias, source, is_primary)
    }

    fn get_performer_aliases(&self, performer_id: i64) -> StorageResult<Vec<String>> {
        self.inner.get_performer_aliases(performer_id)
    }

    fn link_performer(&mut self, item_id: i64, performer_id: i64) -> StorageResult<bool> {
        self.inner.link_performer(item_id, performer_id)
    }

    fn get_item_performers(&self, item_id: i64) -> StorageResult<Vec<String>> {
        self.inner.get_item_performers(item_id)
    }

    fn upsert_tag(&mut self, name: &str) -> StorageResult<i64> {
        self.inner.upsert_tag(name)
    }

    fn link_tag(&mut self, item_id: i64, tag_id: i64) -> StorageResult<bool> {
        self.inner.link_tag(item_id, tag_id)
    }

    fn get_item_tags(&self, item_id: i64) -> StorageResult<Vec<String>> {
        self.inner.get_item_tags(item_id)
    }

    fn add_media_asset(
        &mut self,
        item_id: i64,
        url: &str,
        kind: MediaKind,
        display_order: u32,
        origin: &str,
    ) -> StorageResult<bool> {
        self.inner
            .add_media_asset(item_id, url, kind, display_order, origin)
    }

    fn get_media_assets(&self, item_id: i64) -> StorageResult<Vec<MediaAssetRecord>> {
        self.inner.get_media_assets(item_id)
    }

    fn count_catalog_items(&self) -> StorageResult<u64> {
        self.inner.count_catalog_items()
    }

    fn count_items_by_source(&self) -> StorageResult<Vec<(String, u64)>> {
        self.inner.count_items_by_source()
    }

    fn count_performers(&self) -> StorageResult<u64> {
        self.inner.count_performers()
    }

    fn count_tags(&self) -> StorageResult<u64> {
        self.inner.count_tags()
    }

    fn count_performer_links(&self) -> StorageResult<u64> {
        self.inner.count_performer_links()
    }

    fn count_captures(&self, processed: bool) -> StorageResult<u64> {
        self.inner.count_captures(processed)
    }
}
