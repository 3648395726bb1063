//! Configuration module for Catalog Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use catalog_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! for site in &config.sites {
//!     println!("{} starts at {}", site.id, site.start_id);
//! }
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    Config, FetcherConfig, InvalidPolicy, SiteConfig, StorageConfig, ID_PLACEHOLDER,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
