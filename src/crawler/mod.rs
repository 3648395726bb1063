//! Crawler module for walking site identifier spaces
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with a hard timeout and response classification
//! - Request throttling with delay and jitter
//! - The per-site crawl controller and its run summary

mod controller;
mod fetcher;
mod summary;
mod throttle;

pub use controller::{CrawlController, RunOptions};
pub use fetcher::{build_http_client, FetchOutcome, FetchedPage, Fetcher, HttpFetcher};
pub use summary::RunSummary;
pub use throttle::RequestThrottle;

use crate::config::{Config, SiteConfig};
use crate::storage::Storage;
use crate::HarvestError;

/// Selects the sites named on the command line
///
/// # Arguments
///
/// * `config` - The loaded configuration
/// * `selector` - A site id, or `all` for every configured site in order
///
/// # Returns
///
/// * `Ok(Vec<&SiteConfig>)` - The selected sites
/// * `Err(HarvestError::UnknownSite)` - No site has the given id
pub fn select_sites<'c>(config: &'c Config, selector: &str) -> Result<Vec<&'c SiteConfig>, HarvestError> {
    if selector.eq_ignore_ascii_case("all") {
        return Ok(config.sites.iter().collect());
    }
    config
        .site(selector)
        .map(|site| vec![site])
        .ok_or_else(|| HarvestError::UnknownSite(selector.to_string()))
}

/// Crawls each site in turn with a shared fetcher and storage
///
/// Sites run sequentially; a site whose configuration fails to compile
/// aborts the whole run.
pub async fn crawl_sites<F, S>(
    fetcher: &F,
    storage: &mut S,
    sites: &[&SiteConfig],
    options: &RunOptions,
) -> Result<Vec<RunSummary>, HarvestError>
where
    F: Fetcher + ?Sized,
    S: Storage + ?Sized,
{
    let mut summaries = Vec::with_capacity(sites.len());
    for site in sites {
        let mut controller = CrawlController::new(fetcher, &mut *storage, site)?;
        summaries.push(controller.run(options).await?);
    }
    Ok(summaries)
}

/// Reprocesses pending captures for each site without network access
pub fn reprocess_sites<F, S>(
    fetcher: &F,
    storage: &mut S,
    sites: &[&SiteConfig],
) -> Result<Vec<RunSummary>, HarvestError>
where
    F: Fetcher + ?Sized,
    S: Storage + ?Sized,
{
    let mut summaries = Vec::with_capacity(sites.len());
    for site in sites {
        let mut controller = CrawlController::new(fetcher, &mut *storage, site)?;
        summaries.push(controller.reprocess()?);
    }
    Ok(summaries)
}
