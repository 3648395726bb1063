//! Catalog Harvest: an incremental listing crawler
//!
//! This crate walks the identifier space of third-party listing sites one
//! candidate at a time, caches what it fetches, extracts typed product fields
//! and folds them idempotently into a shared SQLite catalog.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod encoding;
pub mod extract;
pub mod output;
pub mod persist;
pub mod sequence;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Catalog Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Sequence error: {0}")]
    Sequence(#[from] sequence::SequenceError),

    #[error("Unknown site: {0}")]
    UnknownSite(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL template in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid identifier scheme: {0}")]
    InvalidScheme(String),

    #[error("Invalid extraction rule: {0}")]
    InvalidRule(String),
}

/// Result type alias for Catalog Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, SiteConfig};
pub use crawler::{CrawlController, Fetcher, HttpFetcher, RunOptions, RunSummary};
pub use sequence::{Cursor, Direction, IdScheme, Step};
pub use state::{CrawlState, Termination};
