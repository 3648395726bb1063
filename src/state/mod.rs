//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: Where the per-candidate loop is (seeking, fetched, parsed, persisted)
//! - `Termination`: Why a site crawl stopped

mod crawl_state;

pub use crawl_state::{CrawlState, Termination};
