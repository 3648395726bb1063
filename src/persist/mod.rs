//! Persistence of extracted records
//!
//! Folds one [`ExtractedRecord`] into the catalog inside a single storage
//! transaction:
//! - Catalog item upsert by natural key, filling only null columns
//! - Cover and sample media, insert-if-absent with display order
//! - Performers by normalized name, with primary and alternate aliases
//! - Tags, and the item joins for both

use crate::extract::{normalize_name, ExtractedRecord, PerformerCandidate};
use crate::storage::{MediaKind, PerformerFields, Storage, StorageResult};

/// Result of persisting one record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistOutcome {
    /// Catalog item id
    pub item_id: i64,
    /// True if the item row was created by this call
    pub created: bool,
    /// Null columns of an existing item that were filled
    pub filled: usize,
    /// New performer joins
    pub performers_linked: usize,
    /// New tag joins
    pub tags_linked: usize,
    /// New media rows
    pub media_added: usize,
}

/// Writes extracted records through a storage backend
pub struct Persister<'a, S: Storage + ?Sized> {
    storage: &'a mut S,
}

impl<'a, S: Storage + ?Sized> Persister<'a, S> {
    pub fn new(storage: &'a mut S) -> Self {
        Self { storage }
    }

    /// Persists a record for `(source, local_id)` atomically
    ///
    /// # Arguments
    ///
    /// * `source` - Site id; also the provenance of media and aliases
    /// * `local_id` - The site-local identifier
    /// * `record` - A validated extraction result
    ///
    /// # Returns
    ///
    /// * `Ok(PersistOutcome)` - All rows written and committed
    /// * `Err(StorageError)` - Nothing was written
    pub fn persist(
        &mut self,
        source: &str,
        local_id: &str,
        record: &ExtractedRecord,
    ) -> StorageResult<PersistOutcome> {
        self.storage.begin_batch()?;

        let written = self.write_record(source, local_id, record);
        match written.and_then(|outcome| self.storage.commit_batch().map(|_| outcome)) {
            Ok(outcome) => Ok(outcome),
            // A failed commit leaves the transaction open; close it before the next record
            Err(e) => {
                if let Err(rollback_err) = self.storage.rollback_batch() {
                    tracing::error!(
                        "Rollback failed for {}/{}: {}",
                        source,
                        local_id,
                        rollback_err
                    );
                }
                Err(e)
            }
        }
    }

    fn write_record(
        &mut self,
        source: &str,
        local_id: &str,
        record: &ExtractedRecord,
    ) -> StorageResult<PersistOutcome> {
        let item = self
            .storage
            .upsert_catalog_item(source, local_id, &record.catalog_fields())?;

        let mut outcome = PersistOutcome {
            item_id: item.id,
            created: item.created,
            filled: item.filled,
            ..Default::default()
        };

        if let Some(cover) = &record.cover_url {
            if self
                .storage
                .add_media_asset(item.id, cover, MediaKind::Thumbnail, 0, source)?
            {
                outcome.media_added += 1;
            }
        }

        for (index, url) in record.sample_urls.iter().enumerate() {
            let order = u32::try_from(index + 1).unwrap_or(u32::MAX);
            if self
                .storage
                .add_media_asset(item.id, url, MediaKind::Sample, order, source)?
            {
                outcome.media_added += 1;
            }
        }

        for performer in &record.performers {
            if self.write_performer(item.id, source, performer)? {
                outcome.performers_linked += 1;
            }
        }

        for tag in &record.tags {
            let name = normalize_name(tag);
            if name.is_empty() {
                continue;
            }
            let tag_id = self.storage.upsert_tag(&name)?;
            if self.storage.link_tag(item.id, tag_id)? {
                outcome.tags_linked += 1;
            }
        }

        tracing::debug!(
            "Persisted {}/{} as item {} (created: {}, filled: {}, +{} performers, +{} tags, +{} media)",
            source,
            local_id,
            outcome.item_id,
            outcome.created,
            outcome.filled,
            outcome.performers_linked,
            outcome.tags_linked,
            outcome.media_added
        );

        Ok(outcome)
    }

    /// Upserts a performer with its aliases and links it; true if the link is new
    fn write_performer(
        &mut self,
        item_id: i64,
        source: &str,
        candidate: &PerformerCandidate,
    ) -> StorageResult<bool> {
        let name = normalize_name(&candidate.name);
        if name.is_empty() {
            return Ok(false);
        }

        let fields = PerformerFields {
            reading: candidate.reading.clone(),
            ..Default::default()
        };
        let performer = self.storage.upsert_performer(&name, &fields)?;

        self.storage
            .add_performer_alias(performer.id, &name, source, true)?;
        for alias in &candidate.aliases {
            let alias = normalize_name(alias);
            if !alias.is_empty() && alias != name {
                self.storage
                    .add_performer_alias(performer.id, &alias, source, false)?;
            }
        }

        self.storage.link_performer(item_id, performer.id)
    }
}
