//! Output module for run summaries and catalog statistics
//!
//! This module handles:
//! - Printing per-site run summaries after a crawl
//! - Loading and printing catalog statistics for `--stats`

pub mod stats;

pub use stats::{
    load_statistics, print_run_summaries, print_statistics, render_statistics, CatalogStatistics,
};
