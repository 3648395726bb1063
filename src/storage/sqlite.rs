//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageResult};
use crate::storage::{
    date_from_db, date_to_db, natural_key, CaptureWrite, CatalogFields, CatalogItemRecord,
    MediaAssetRecord, MediaKind, PerformerFields, PerformerRecord, RawCapture, Upserted,
};
use crate::HarvestError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn now() -> String {
        Utc::now().to_rfc3339()
    }
}

fn capture_from_row(row: &Row<'_>) -> rusqlite::Result<RawCapture> {
    Ok(RawCapture {
        source: row.get(0)?,
        local_id: row.get(1)?,
        url: row.get(2)?,
        text: row.get(3)?,
        content_hash: row.get(4)?,
        fetched_at: row.get(5)?,
        processed_at: row.get(6)?,
    })
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<CatalogItemRecord> {
    Ok(CatalogItemRecord {
        id: row.get(0)?,
        source: row.get(1)?,
        local_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        release_date: row
            .get::<_, Option<String>>(5)?
            .as_deref()
            .and_then(date_from_db),
        duration_minutes: row.get(6)?,
        cover_url: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn performer_from_row(row: &Row<'_>) -> rusqlite::Result<PerformerRecord> {
    Ok(PerformerRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        reading: row.get(2)?,
        birth_date: row
            .get::<_, Option<String>>(3)?
            .as_deref()
            .and_then(date_from_db),
        height_cm: row.get(4)?,
        blood_type: row.get(5)?,
        birthplace: row.get(6)?,
    })
}

/// Counts how many columns go from null to a value
fn fillable<T>(stored: &Option<T>, incoming: &Option<T>) -> usize {
    usize::from(stored.is_none() && incoming.is_some())
}

const CAPTURE_COLUMNS: &str =
    "source, local_id, url, text, content_hash, fetched_at, processed_at";

const ITEM_COLUMNS: &str = "id, source, local_id, title, description, release_date, \
     duration_minutes, cover_url, created_at, updated_at";

const PERFORMER_COLUMNS: &str =
    "id, name, reading, birth_date, height_cm, blood_type, birthplace";

impl Storage for SqliteStorage {
    // ===== Capture Cache =====

    fn get_capture(&self, source: &str, local_id: &str) -> StorageResult<Option<RawCapture>> {
        let (source, local_id) = natural_key(source, local_id);
        let capture = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM raw_captures WHERE source = ?1 AND local_id = ?2",
                    CAPTURE_COLUMNS
                ),
                params![source, local_id],
                capture_from_row,
            )
            .optional()?;
        Ok(capture)
    }

    fn put_capture(
        &mut self,
        source: &str,
        local_id: &str,
        url: &str,
        text: &str,
        content_hash: &str,
    ) -> StorageResult<CaptureWrite> {
        let (source, local_id) = natural_key(source, local_id);
        let now = Self::now();

        let stored_hash: Option<String> = self
            .conn
            .query_row(
                "SELECT content_hash FROM raw_captures WHERE source = ?1 AND local_id = ?2",
                params![source, local_id],
                |row| row.get(0),
            )
            .optional()?;

        match stored_hash {
            Some(hash) if hash == content_hash => {
                // Same content: refresh retrieval metadata only
                self.conn.execute(
                    "UPDATE raw_captures SET url = ?1, fetched_at = ?2
                     WHERE source = ?3 AND local_id = ?4",
                    params![url, now, source, local_id],
                )?;
                Ok(CaptureWrite::Unchanged)
            }
            Some(_) => {
                self.conn.execute(
                    "UPDATE raw_captures
                     SET url = ?1, text = ?2, content_hash = ?3, fetched_at = ?4, processed_at = NULL
                     WHERE source = ?5 AND local_id = ?6",
                    params![url, text, content_hash, now, source, local_id],
                )?;
                Ok(CaptureWrite::Changed)
            }
            None => {
                self.conn.execute(
                    "INSERT INTO raw_captures (source, local_id, url, text, content_hash, fetched_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![source, local_id, url, text, content_hash, now],
                )?;
                Ok(CaptureWrite::Inserted)
            }
        }
    }

    fn mark_capture_processed(&mut self, source: &str, local_id: &str) -> StorageResult<()> {
        let (source, local_id) = natural_key(source, local_id);
        self.conn.execute(
            "UPDATE raw_captures SET processed_at = ?1 WHERE source = ?2 AND local_id = ?3",
            params![Self::now(), source, local_id],
        )?;
        Ok(())
    }

    fn pending_captures(&self, source: &str) -> StorageResult<Vec<RawCapture>> {
        let (source, _) = natural_key(source, "");
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM raw_captures WHERE source = ?1 AND processed_at IS NULL
             ORDER BY local_id",
            CAPTURE_COLUMNS
        ))?;

        let captures = stmt
            .query_map(params![source], capture_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(captures)
    }

    // ===== Batching =====

    fn begin_batch(&mut self) -> StorageResult<()> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn commit_batch(&mut self) -> StorageResult<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback_batch(&mut self) -> StorageResult<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    // ===== Catalog Items =====

    fn upsert_catalog_item(
        &mut self,
        source: &str,
        local_id: &str,
        fields: &CatalogFields,
    ) -> StorageResult<Upserted> {
        let now = Self::now();
        let release_date = fields.release_date.map(date_to_db);

        let Some(existing) = self.get_catalog_item(source, local_id)? else {
            let (source, local_id) = natural_key(source, local_id);
            self.conn.execute(
                "INSERT INTO catalog_items
                 (source, local_id, title, description, release_date, duration_minutes,
                  cover_url, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                params![
                    source,
                    local_id,
                    fields.title,
                    fields.description,
                    release_date,
                    fields.duration_minutes,
                    fields.cover_url,
                    now,
                ],
            )?;
            return Ok(Upserted {
                id: self.conn.last_insert_rowid(),
                created: true,
                filled: 0,
            });
        };

        let filled = fillable(&existing.title, &fields.title)
            + fillable(&existing.description, &fields.description)
            + fillable(&existing.release_date, &fields.release_date)
            + fillable(&existing.duration_minutes, &fields.duration_minutes)
            + fillable(&existing.cover_url, &fields.cover_url);

        if filled > 0 {
            self.conn.execute(
                "UPDATE catalog_items SET
                   title = COALESCE(title, ?1),
                   description = COALESCE(description, ?2),
                   release_date = COALESCE(release_date, ?3),
                   duration_minutes = COALESCE(duration_minutes, ?4),
                   cover_url = COALESCE(cover_url, ?5),
                   updated_at = ?6
                 WHERE id = ?7",
                params![
                    fields.title,
                    fields.description,
                    release_date,
                    fields.duration_minutes,
                    fields.cover_url,
                    now,
                    existing.id,
                ],
            )?;
        }

        Ok(Upserted {
            id: existing.id,
            created: false,
            filled,
        })
    }

    fn get_catalog_item(
        &self,
        source: &str,
        local_id: &str,
    ) -> StorageResult<Option<CatalogItemRecord>> {
        let (source, local_id) = natural_key(source, local_id);
        let item = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM catalog_items WHERE source = ?1 AND local_id = ?2",
                    ITEM_COLUMNS
                ),
                params![source, local_id],
                item_from_row,
            )
            .optional()?;
        Ok(item)
    }

    // ===== Performers =====

    fn upsert_performer(
        &mut self,
        name: &str,
        fields: &PerformerFields,
    ) -> StorageResult<Upserted> {
        let birth_date = fields.birth_date.map(date_to_db);

        let Some(existing) = self.get_performer_by_name(name)? else {
            self.conn.execute(
                "INSERT INTO performers
                 (name, reading, birth_date, height_cm, blood_type, birthplace, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    name,
                    fields.reading,
                    birth_date,
                    fields.height_cm,
                    fields.blood_type,
                    fields.birthplace,
                    Self::now(),
                ],
            )?;
            return Ok(Upserted {
                id: self.conn.last_insert_rowid(),
                created: true,
                filled: 0,
            });
        };

        let filled = fillable(&existing.reading, &fields.reading)
            + fillable(&existing.birth_date, &fields.birth_date)
            + fillable(&existing.height_cm, &fields.height_cm)
            + fillable(&existing.blood_type, &fields.blood_type)
            + fillable(&existing.birthplace, &fields.birthplace);

        if filled > 0 {
            self.conn.execute(
                "UPDATE performers SET
                   reading = COALESCE(reading, ?1),
                   birth_date = COALESCE(birth_date, ?2),
                   height_cm = COALESCE(height_cm, ?3),
                   blood_type = COALESCE(blood_type, ?4),
                   birthplace = COALESCE(birthplace, ?5)
                 WHERE id = ?6",
                params![
                    fields.reading,
                    birth_date,
                    fields.height_cm,
                    fields.blood_type,
                    fields.birthplace,
                    existing.id,
                ],
            )?;
        }

        Ok(Upserted {
            id: existing.id,
            created: false,
            filled,
        })
    }

    fn get_performer_by_name(&self, name: &str) -> StorageResult<Option<PerformerRecord>> {
        let performer = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM performers WHERE name = ?1",
                    PERFORMER_COLUMNS
                ),
                params![name],
                performer_from_row,
            )
            .optional()?;
        Ok(performer)
    }

    fn add_performer_alias(
        &mut self,
        performer_id: i64,
        alias: &str,
        source: &str,
        is_primary: bool,
    ) -> StorageResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO performer_aliases (performer_id, alias, source, is_primary)
             VALUES (?1, ?2, ?3, ?4)",
            params![performer_id, alias, source, is_primary],
        )?;
        Ok(inserted > 0)
    }

    fn get_performer_aliases(&self, performer_id: i64) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT alias FROM performer_aliases WHERE performer_id = ?1
             ORDER BY is_primary DESC, id",
        )?;

        let aliases = stmt
            .query_map(params![performer_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(aliases)
    }

    fn link_performer(&mut self, item_id: i64, performer_id: i64) -> StorageResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO item_performers (item_id, performer_id) VALUES (?1, ?2)",
            params![item_id, performer_id],
        )?;
        Ok(inserted > 0)
    }

    fn get_item_performers(&self, item_id: i64) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.name FROM item_performers ip
             JOIN performers p ON p.id = ip.performer_id
             WHERE ip.item_id = ?1
             ORDER BY p.id",
        )?;

        let names = stmt
            .query_map(params![item_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(names)
    }

    // ===== Tags =====

    fn upsert_tag(&mut self, name: &str) -> StorageResult<i64> {
        let existing: Option<i64> = self
            .conn
            .query_row("SELECT id FROM tags WHERE name = ?1", params![name], |row| {
                row.get(0)
            })
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        self.conn
            .execute("INSERT INTO tags (name) VALUES (?1)", params![name])?;
        Ok(self.conn.last_insert_rowid())
    }

    fn link_tag(&mut self, item_id: i64, tag_id: i64) -> StorageResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO item_tags (item_id, tag_id) VALUES (?1, ?2)",
            params![item_id, tag_id],
        )?;
        Ok(inserted > 0)
    }

    fn get_item_tags(&self, item_id: i64) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.name FROM item_tags it
             JOIN tags t ON t.id = it.tag_id
             WHERE it.item_id = ?1
             ORDER BY t.id",
        )?;

        let names = stmt
            .query_map(params![item_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(names)
    }

    // ===== Media =====

    fn add_media_asset(
        &mut self,
        item_id: i64,
        url: &str,
        kind: MediaKind,
        display_order: u32,
        origin: &str,
    ) -> StorageResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO media_assets (item_id, url, kind, display_order, origin)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![item_id, url, kind.to_db_string(), display_order, origin],
        )?;
        Ok(inserted > 0)
    }

    fn get_media_assets(&self, item_id: i64) -> StorageResult<Vec<MediaAssetRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT item_id, url, kind, display_order, origin FROM media_assets
             WHERE item_id = ?1
             ORDER BY kind DESC, display_order",
        )?;

        let assets = stmt
            .query_map(params![item_id], |row| {
                Ok(MediaAssetRecord {
                    item_id: row.get(0)?,
                    url: row.get(1)?,
                    kind: MediaKind::from_db_string(&row.get::<_, String>(2)?)
                        .unwrap_or(MediaKind::Sample),
                    display_order: row.get(3)?,
                    origin: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(assets)
    }

    // ===== Statistics =====

    fn count_catalog_items(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM catalog_items", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_items_by_source(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT source, COUNT(*) as count FROM catalog_items
             GROUP BY source ORDER BY count DESC, source",
        )?;

        let counts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as u64)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }

    fn count_performers(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM performers", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_tags(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_performer_links(&self) -> StorageResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM item_performers", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_captures(&self, processed: bool) -> StorageResult<u64> {
        let sql = if processed {
            "SELECT COUNT(*) FROM raw_captures WHERE processed_at IS NOT NULL"
        } else {
            "SELECT COUNT(*) FROM raw_captures WHERE processed_at IS NULL"
        };
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn storage() -> SqliteStorage {
        SqliteStorage::new_in_memory().unwrap()
    }

    #[test]
    fn test_capture_insert_then_lookup() {
        let mut storage = storage();
        let write = storage
            .put_capture("siteA", "ABC-001", "https://a.example/1", "<html>1</html>", "h1")
            .unwrap();
        assert_eq!(write, CaptureWrite::Inserted);

        let capture = storage.get_capture("sitea", "abc-001").unwrap().unwrap();
        assert_eq!(capture.text, "<html>1</html>");
        assert_eq!(capture.content_hash, "h1");
        assert!(!capture.is_processed());
    }

    #[test]
    fn test_capture_unchanged_keeps_processed_flag() {
        let mut storage = storage();
        storage.put_capture("s", "1", "u", "t", "h").unwrap();
        storage.mark_capture_processed("s", "1").unwrap();

        let write = storage.put_capture("s", "1", "u", "t", "h").unwrap();
        assert_eq!(write, CaptureWrite::Unchanged);
        assert!(storage.get_capture("s", "1").unwrap().unwrap().is_processed());
    }

    #[test]
    fn test_capture_changed_clears_processed_flag() {
        let mut storage = storage();
        storage.put_capture("s", "1", "u", "old", "h1").unwrap();
        storage.mark_capture_processed("s", "1").unwrap();

        let write = storage.put_capture("s", "1", "u", "new", "h2").unwrap();
        assert_eq!(write, CaptureWrite::Changed);

        let capture = storage.get_capture("s", "1").unwrap().unwrap();
        assert_eq!(capture.text, "new");
        assert_eq!(capture.content_hash, "h2");
        assert!(!capture.is_processed());
    }

    #[test]
    fn test_pending_captures() {
        let mut storage = storage();
        storage.put_capture("s", "2", "u", "t", "h").unwrap();
        storage.put_capture("s", "1", "u", "t", "h").unwrap();
        storage.put_capture("other", "1", "u", "t", "h").unwrap();
        storage.mark_capture_processed("s", "2").unwrap();

        let pending = storage.pending_captures("s").unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].local_id, "1");
        assert_eq!(storage.count_captures(false).unwrap(), 2);
        assert_eq!(storage.count_captures(true).unwrap(), 1);
    }

    #[test]
    fn test_item_upsert_fills_only_null_fields() {
        let mut storage = storage();
        let first = storage
            .upsert_catalog_item(
                "s",
                "x1",
                &CatalogFields {
                    title: Some("Original".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(first.created);

        let second = storage
            .upsert_catalog_item(
                "S",
                "X1",
                &CatalogFields {
                    title: Some("Replacement".to_string()),
                    duration_minutes: Some(120),
                    release_date: NaiveDate::from_ymd_opt(2022, 2, 2),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(!second.created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.filled, 2);

        let item = storage.get_catalog_item("s", "x1").unwrap().unwrap();
        assert_eq!(item.title.as_deref(), Some("Original"));
        assert_eq!(item.duration_minutes, Some(120));
        assert_eq!(item.release_date, NaiveDate::from_ymd_opt(2022, 2, 2));
        assert_eq!(item.description, None);
        assert_eq!(storage.count_catalog_items().unwrap(), 1);
    }

    #[test]
    fn test_performer_upsert_is_idempotent() {
        let mut storage = storage();
        let a = storage
            .upsert_performer("Performer One", &PerformerFields::default())
            .unwrap();
        let b = storage
            .upsert_performer(
                "Performer One",
                &PerformerFields {
                    reading: Some("reading".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(a.created);
        assert!(!b.created);
        assert_eq!(a.id, b.id);
        assert_eq!(b.filled, 1);
        assert_eq!(storage.count_performers().unwrap(), 1);
    }

    #[test]
    fn test_link_pairs_are_inserted_once() {
        let mut storage = storage();
        let item = storage
            .upsert_catalog_item("s", "1", &CatalogFields::default())
            .unwrap();
        let performer = storage
            .upsert_performer("Someone", &PerformerFields::default())
            .unwrap();
        let tag = storage.upsert_tag("drama").unwrap();

        assert!(storage.link_performer(item.id, performer.id).unwrap());
        assert!(!storage.link_performer(item.id, performer.id).unwrap());
        assert!(storage.link_tag(item.id, tag).unwrap());
        assert!(!storage.link_tag(item.id, tag).unwrap());
        assert_eq!(storage.upsert_tag("drama").unwrap(), tag);

        assert_eq!(storage.count_performer_links().unwrap(), 1);
        assert_eq!(storage.get_item_tags(item.id).unwrap(), vec!["drama"]);
    }

    #[test]
    fn test_aliases_are_unique_per_performer() {
        let mut storage = storage();
        let performer = storage
            .upsert_performer("Name", &PerformerFields::default())
            .unwrap();

        assert!(storage
            .add_performer_alias(performer.id, "Name", "s", true)
            .unwrap());
        assert!(storage
            .add_performer_alias(performer.id, "Alt Name", "s", false)
            .unwrap());
        assert!(!storage
            .add_performer_alias(performer.id, "Alt Name", "other", false)
            .unwrap());

        assert_eq!(
            storage.get_performer_aliases(performer.id).unwrap(),
            vec!["Name", "Alt Name"]
        );
    }

    #[test]
    fn test_media_assets_dedup_by_url() {
        let mut storage = storage();
        let item = storage
            .upsert_catalog_item("s", "1", &CatalogFields::default())
            .unwrap();

        assert!(storage
            .add_media_asset(item.id, "https://cdn/1.jpg", MediaKind::Sample, 1, "s")
            .unwrap());
        assert!(!storage
            .add_media_asset(item.id, "https://cdn/1.jpg", MediaKind::Sample, 1, "s")
            .unwrap());
        assert!(storage
            .add_media_asset(item.id, "https://cdn/t.jpg", MediaKind::Thumbnail, 0, "s")
            .unwrap());

        let assets = storage.get_media_assets(item.id).unwrap();
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].kind, MediaKind::Thumbnail);
    }

    #[test]
    fn test_batch_rollback_discards_writes() {
        let mut storage = storage();
        storage.begin_batch().unwrap();
        storage
            .upsert_catalog_item("s", "1", &CatalogFields::default())
            .unwrap();
        storage.rollback_batch().unwrap();

        assert_eq!(storage.count_catalog_items().unwrap(), 0);
    }

    #[test]
    fn test_count_items_by_source() {
        let mut storage = storage();
        for id in ["1", "2"] {
            storage
                .upsert_catalog_item("a", id, &CatalogFields::default())
                .unwrap();
        }
        storage
            .upsert_catalog_item("b", "1", &CatalogFields::default())
            .unwrap();

        assert_eq!(
            storage.count_items_by_source().unwrap(),
            vec![("a".to_string(), 2), ("b".to_string(), 1)]
        );
    }
}
