//! Statistics generation from the catalog database
//!
//! This module provides functionality for extracting and displaying
//! catalog statistics and per-run summaries.

use crate::crawler::RunSummary;
use crate::storage::Storage;
use crate::HarvestError;
use std::fmt::Write;

/// Catalog statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogStatistics {
    /// Total number of catalog items
    pub total_items: u64,

    /// Item counts per source, largest first
    pub items_by_source: Vec<(String, u64)>,

    pub performers: u64,

    /// Item-performer joins
    pub performer_links: u64,

    pub tags: u64,

    /// Raw captures already folded into the catalog
    pub captures_processed: u64,

    /// Raw captures awaiting processing
    pub captures_pending: u64,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CatalogStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<CatalogStatistics, HarvestError> {
    let mut items_by_source = storage.count_items_by_source()?;
    items_by_source.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    Ok(CatalogStatistics {
        total_items: storage.count_catalog_items()?,
        items_by_source,
        performers: storage.count_performers()?,
        performer_links: storage.count_performer_links()?,
        tags: storage.count_tags()?,
        captures_processed: storage.count_captures(true)?,
        captures_pending: storage.count_captures(false)?,
    })
}

/// Renders statistics as a text report
pub fn render_statistics(stats: &CatalogStatistics) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Catalog Statistics ===\n");
    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Catalog items: {}", stats.total_items);
    let _ = writeln!(out, "  Performers: {}", stats.performers);
    let _ = writeln!(out, "  Performer links: {}", stats.performer_links);
    let _ = writeln!(out, "  Tags: {}", stats.tags);
    let _ = writeln!(out);

    if !stats.items_by_source.is_empty() {
        let _ = writeln!(out, "Items by Source:");
        for (source, count) in &stats.items_by_source {
            let percentage = if stats.total_items > 0 {
                (*count as f64 / stats.total_items as f64) * 100.0
            } else {
                0.0
            };
            let _ = writeln!(out, "  {}: {} ({:.1}%)", source, count, percentage);
        }
        let _ = writeln!(out);
    }

    let total_captures = stats.captures_processed + stats.captures_pending;
    let _ = writeln!(out, "Raw Captures:");
    let _ = writeln!(out, "  Processed: {}", stats.captures_processed);
    let _ = writeln!(out, "  Pending: {}", stats.captures_pending);
    if total_captures > 0 {
        let _ = writeln!(
            out,
            "  Processed rate: {:.1}%",
            stats.captures_processed as f64 / total_captures as f64 * 100.0
        );
    }

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CatalogStatistics) {
    print!("{}", render_statistics(stats));
}

/// Prints one line per site run, plus totals when several sites ran
pub fn print_run_summaries(summaries: &[RunSummary]) {
    println!("=== Run Summary ===\n");
    for summary in summaries {
        println!("{}", summary);
    }

    if summaries.len() > 1 {
        let imported: u64 = summaries.iter().map(|s| s.imported).sum();
        let requests: u64 = summaries.iter().map(|s| s.requests).sum();
        println!();
        println!(
            "Total: {} sites, {} imported, {} requests",
            summaries.len(),
            imported,
            requests
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RawCache;
    use crate::storage::{CatalogFields, SqliteStorage};

    #[test]
    fn test_load_statistics() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let fields = CatalogFields {
            title: Some("Title".to_string()),
            ..Default::default()
        };
        let a = storage.upsert_catalog_item("alpha", "1", &fields).unwrap();
        storage.upsert_catalog_item("alpha", "2", &fields).unwrap();
        storage.upsert_catalog_item("beta", "1", &fields).unwrap();

        let performer = storage
            .upsert_performer("Jane Roe", &Default::default())
            .unwrap();
        storage.link_performer(a.id, performer.id).unwrap();
        storage.upsert_tag("Drama").unwrap();

        storage.store("alpha", "1", "u", "text").unwrap();
        storage.store("alpha", "2", "u", "text").unwrap();
        storage.mark_processed("alpha", "1").unwrap();

        let stats = load_statistics(&storage).unwrap();
        assert_eq!(stats.total_items, 3);
        assert_eq!(
            stats.items_by_source,
            vec![("alpha".to_string(), 2), ("beta".to_string(), 1)]
        );
        assert_eq!(stats.performers, 1);
        assert_eq!(stats.performer_links, 1);
        assert_eq!(stats.tags, 1);
        assert_eq!(stats.captures_processed, 1);
        assert_eq!(stats.captures_pending, 1);
    }

    #[test]
    fn test_render_statistics() {
        let stats = CatalogStatistics {
            total_items: 4,
            items_by_source: vec![("alpha".to_string(), 3), ("beta".to_string(), 1)],
            captures_processed: 3,
            captures_pending: 1,
            ..Default::default()
        };

        let report = render_statistics(&stats);
        assert!(report.contains("Catalog items: 4"));
        assert!(report.contains("alpha: 3 (75.0%)"));
        assert!(report.contains("Processed rate: 75.0%"));
    }

    #[test]
    fn test_render_empty_statistics() {
        let report = render_statistics(&CatalogStatistics::default());
        assert!(report.contains("Catalog items: 0"));
        assert!(!report.contains("Items by Source"));
        assert!(!report.contains("Processed rate"));
    }
}
