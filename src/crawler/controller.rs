//! Per-site crawl loop
//!
//! The controller walks a site's identifier space one candidate at a time:
//! - Consults the raw cache before touching the network
//! - Throttles every network request
//! - Decodes, caches, extracts and persists each page
//! - Stops on exhaustion, the end identifier, the import limit, or after
//!   `breaker_threshold` consecutive failures

use crate::cache::RawCache;
use crate::config::{InvalidPolicy, SiteConfig};
use crate::crawler::fetcher::{FetchOutcome, Fetcher};
use crate::crawler::summary::RunSummary;
use crate::crawler::throttle::RequestThrottle;
use crate::encoding::EncodingResolver;
use crate::extract::{Extraction, Extractor, Page};
use crate::persist::Persister;
use crate::sequence::{Cursor, Step};
use crate::state::{CrawlState, Termination};
use crate::storage::{Storage, StorageError};
use crate::{ConfigError, HarvestError};

/// Candidates between progress log lines
const PROGRESS_INTERVAL: u64 = 25;

/// Per-run overrides from the command line
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Stop after this many imports
    pub limit: Option<u64>,
    /// Identifier to start from instead of the configured start id
    pub start: Option<String>,
    /// Bypass the cache and fetch every candidate
    pub refetch: bool,
}

/// Decoded text for a candidate, however it was obtained
struct Acquired {
    text: String,
    url: String,
    /// An already-processed cache hit
    processed: bool,
}

/// What acquiring a candidate produced
enum Acquire {
    Page(Acquired),
    NotFound,
    Transient(String),
}

/// How one candidate ended, for breaker accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Imported,
    Skipped,
    Failed,
    StorageFailed,
}

/// Crawls one site
pub struct CrawlController<'a, F: Fetcher + ?Sized, S: Storage + ?Sized> {
    fetcher: &'a F,
    storage: &'a mut S,
    site: &'a SiteConfig,
    resolver: EncodingResolver,
    extractor: Extractor,
    throttle: RequestThrottle,
    state: CrawlState,
}

impl<'a, F: Fetcher + ?Sized, S: Storage + ?Sized> CrawlController<'a, F, S> {
    /// Creates a controller for a site
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlController)` - Ready to run
    /// * `Err(ConfigError)` - The site's extraction rules do not compile
    pub fn new(fetcher: &'a F, storage: &'a mut S, site: &'a SiteConfig) -> Result<Self, ConfigError> {
        let mut resolver = EncodingResolver::new();
        if let (Some(label), Some(host)) = (&site.encoding, site.host()) {
            if !resolver.add_host_hint(&host, label) {
                tracing::warn!("Site '{}': ignoring unknown encoding '{}'", site.id, label);
            }
        }

        Ok(Self {
            fetcher,
            storage,
            site,
            resolver,
            extractor: Extractor::new(site)?,
            throttle: RequestThrottle::from_millis(site.delay_ms, site.jitter_ms),
            state: CrawlState::Seeking,
        })
    }

    /// Current loop state
    pub fn state(&self) -> CrawlState {
        self.state
    }

    fn transition(&mut self, next: CrawlState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        tracing::trace!("{}: {} -> {}", self.site.id, self.state, next);
        self.state = next;
    }

    fn terminate(&mut self, summary: &mut RunSummary, reason: Termination) {
        self.transition(CrawlState::Terminated(reason));
        summary.termination = reason;
    }

    /// Runs the crawl until a termination condition fires
    ///
    /// # Returns
    ///
    /// * `Ok(RunSummary)` - The crawl ran to a termination condition
    /// * `Err(HarvestError::Sequence)` - The start or end identifier is invalid
    pub async fn run(&mut self, options: &RunOptions) -> Result<RunSummary, HarvestError> {
        let site = self.site;
        let scheme = &site.scheme;
        let direction = site.direction;
        let start_id = options.start.as_deref().unwrap_or(&site.start_id);
        let mut cursor: Cursor = scheme.parse_strict(start_id)?;
        let end = site
            .end_id
            .as_deref()
            .map(|id| scheme.parse_strict(id))
            .transpose()?;

        tracing::info!(
            "Crawling '{}' from {} ({}, {} scheme, breaker {})",
            site.id,
            scheme.render(&cursor),
            direction,
            scheme.name(),
            site.breaker_threshold
        );

        let mut summary = RunSummary::new(&site.id);
        let mut consecutive_failures: u32 = 0;
        let mut consecutive_storage_failures: u32 = 0;

        loop {
            if options.limit.is_some_and(|limit| summary.imported >= limit) {
                self.terminate(&mut summary, Termination::LimitReached);
                break;
            }
            if let Some(end) = &end {
                if scheme.is_beyond(&cursor, end, direction) {
                    self.terminate(&mut summary, Termination::EndBoundary);
                    break;
                }
            }

            let local_id = scheme.render(&cursor);
            summary.candidates += 1;

            match self.visit(&local_id, options.refetch, &mut summary).await {
                Visit::Imported | Visit::Skipped => {
                    consecutive_failures = 0;
                    consecutive_storage_failures = 0;
                }
                Visit::Failed => {
                    consecutive_failures += 1;
                    consecutive_storage_failures = 0;
                }
                // Storage trouble says nothing about the id space; tracked separately
                Visit::StorageFailed => consecutive_storage_failures += 1,
            }
            self.transition(CrawlState::Seeking);
            summary.last_id = Some(local_id);

            if summary.candidates % PROGRESS_INTERVAL == 0 {
                tracing::info!(
                    "{}: {} candidates, {} imported, {} skipped, {} failed, at {}",
                    site.id,
                    summary.candidates,
                    summary.imported,
                    summary.skipped,
                    summary.failures(),
                    summary.last_id.as_deref().unwrap_or("-")
                );
            }

            if consecutive_failures >= site.breaker_threshold {
                tracing::info!(
                    "{}: {} consecutive failures, stopping",
                    site.id,
                    consecutive_failures
                );
                self.terminate(&mut summary, Termination::Breaker);
                break;
            }
            if consecutive_storage_failures >= site.breaker_threshold {
                tracing::warn!(
                    "{}: {} consecutive storage errors, stopping",
                    site.id,
                    consecutive_storage_failures
                );
                self.terminate(&mut summary, Termination::Breaker);
                break;
            }

            match scheme.next(&cursor, direction) {
                Step::Next(next) => cursor = next,
                Step::Exhausted => {
                    self.terminate(&mut summary, Termination::Exhausted);
                    break;
                }
            }
        }

        tracing::info!("Finished {}", summary);
        Ok(summary)
    }

    /// Handles one candidate from lookup to persistence
    async fn visit(&mut self, local_id: &str, refetch: bool, summary: &mut RunSummary) -> Visit {
        self.transition(CrawlState::Seeking);

        let source = self.site.id.clone();
        let url = self.site.page_url_for(local_id);

        let acquired = match self.acquire(&source, local_id, &url, refetch, summary).await {
            Ok(Acquire::Page(page)) => page,
            Ok(Acquire::NotFound) => {
                tracing::debug!("{}/{}: not found", source, local_id);
                summary.not_found += 1;
                return Visit::Failed;
            }
            Ok(Acquire::Transient(reason)) => {
                tracing::debug!("{}/{}: {}", source, local_id, reason);
                summary.transient_errors += 1;
                return Visit::Failed;
            }
            Err(e) => {
                tracing::warn!("{}/{}: cache error: {}", source, local_id, e);
                summary.storage_errors += 1;
                return Visit::StorageFailed;
            }
        };

        self.transition(CrawlState::Fetched);
        summary.found += 1;

        if acquired.processed && !refetch {
            tracing::debug!("{}/{}: already processed", source, local_id);
            summary.skipped += 1;
            return Visit::Skipped;
        }

        let api = self.acquire_side_channel(local_id, refetch, summary).await;
        self.process(local_id, &acquired, api.as_ref(), summary)
    }

    /// Extracts and persists an acquired page
    fn process(
        &mut self,
        local_id: &str,
        acquired: &Acquired,
        api: Option<&serde_json::Value>,
        summary: &mut RunSummary,
    ) -> Visit {
        let site = self.site;
        let page = Page {
            text: &acquired.text,
            api,
            url: &acquired.url,
        };

        let record = match self.extractor.extract(&page) {
            Extraction::Valid(record) => record,
            Extraction::Invalid(reason) => {
                self.transition(CrawlState::ParsedInvalid);
                tracing::debug!("{}/{}: rejected: {}", site.id, local_id, reason);
                summary.invalid += 1;
                if site.on_invalid == InvalidPolicy::Skip {
                    self.mark_processed(local_id, summary);
                }
                return Visit::Failed;
            }
        };
        self.transition(CrawlState::ParsedValid);

        match Persister::new(&mut *self.storage).persist(&site.id, local_id, &record) {
            Ok(outcome) => {
                self.transition(CrawlState::Persisted);
                summary.imported += 1;
                tracing::debug!(
                    "{}/{}: imported '{}' as item {}{}",
                    site.id,
                    local_id,
                    record.title,
                    outcome.item_id,
                    if outcome.created { " (new)" } else { "" }
                );
                self.mark_processed(local_id, summary);
                Visit::Imported
            }
            Err(e) => {
                tracing::warn!("{}/{}: persist failed: {}", site.id, local_id, e);
                summary.storage_errors += 1;
                Visit::StorageFailed
            }
        }
    }

    fn mark_processed(&mut self, local_id: &str, summary: &mut RunSummary) {
        let mut sources = vec![self.site.id.clone()];
        if self.site.api_url.is_some() {
            sources.push(self.site.api_source());
        }

        for source in sources {
            if let Err(e) = self.storage.mark_processed(&source, local_id) {
                tracing::warn!("{}/{}: could not mark processed: {}", source, local_id, e);
                summary.storage_errors += 1;
            }
        }
    }

    /// Gets decoded text from the cache, or from the network on a miss
    async fn acquire(
        &mut self,
        source: &str,
        local_id: &str,
        url: &str,
        refetch: bool,
        summary: &mut RunSummary,
    ) -> Result<Acquire, StorageError> {
        if !refetch {
            if let Some(capture) = self.storage.lookup(source, local_id)? {
                tracing::trace!("{}/{}: cache hit", source, local_id);
                return Ok(Acquire::Page(Acquired {
                    processed: capture.is_processed(),
                    text: capture.text,
                    url: capture.url,
                }));
            }
        }

        self.throttle.pause().await;
        summary.requests += 1;

        let outcome = self
            .fetcher
            .fetch(url, self.site.consent_cookie.as_deref())
            .await;
        self.throttle.mark_done();

        let page = match outcome {
            FetchOutcome::Fetched(page) => page,
            FetchOutcome::NotFound => return Ok(Acquire::NotFound),
            FetchOutcome::Transient(reason) => return Ok(Acquire::Transient(reason)),
        };

        let decoded =
            self.resolver
                .decode(&page.bytes, page.content_type.as_deref(), Some(&page.final_url));
        tracing::trace!(
            "{}/{}: decoded as {} ({:?})",
            source,
            local_id,
            decoded.encoding.name(),
            decoded.source
        );

        let stored = self
            .storage
            .store(source, local_id, &page.final_url, &decoded.text)?;

        Ok(Acquire::Page(Acquired {
            text: decoded.text,
            url: page.final_url,
            processed: !stored.needs_processing() && !refetch,
        }))
    }

    /// Acquires and parses the JSON side channel; failures are logged only
    async fn acquire_side_channel(
        &mut self,
        local_id: &str,
        refetch: bool,
        summary: &mut RunSummary,
    ) -> Option<serde_json::Value> {
        let url = self.site.api_url_for(local_id)?;
        let source = self.site.api_source();

        let text = match self.acquire(&source, local_id, &url, refetch, summary).await {
            Ok(Acquire::Page(page)) => page.text,
            Ok(Acquire::NotFound) => {
                tracing::debug!("{}/{}: side channel not found", source, local_id);
                return None;
            }
            Ok(Acquire::Transient(reason)) => {
                tracing::debug!("{}/{}: side channel failed: {}", source, local_id, reason);
                return None;
            }
            Err(e) => {
                tracing::warn!("{}/{}: side channel cache error: {}", source, local_id, e);
                summary.storage_errors += 1;
                return None;
            }
        };

        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!("{}/{}: side channel is not JSON: {}", source, local_id, e);
                None
            }
        }
    }

    /// Folds pending raw captures into the catalog without network access
    pub fn reprocess(&mut self) -> Result<RunSummary, StorageError> {
        let mut summary = RunSummary::new(&self.site.id);
        let pending = self.storage.pending(&self.site.id)?;
        tracing::info!("Reprocessing {} pending captures for '{}'", pending.len(), self.site.id);

        for capture in pending {
            self.transition(CrawlState::Seeking);
            summary.candidates += 1;

            let api = match self.storage.lookup(&self.site.api_source(), &capture.local_id) {
                Ok(api) => api.and_then(|c| serde_json::from_str(&c.text).ok()),
                Err(e) => {
                    tracing::warn!("{}: side channel cache error: {}", capture.local_id, e);
                    summary.storage_errors += 1;
                    None
                }
            };

            self.transition(CrawlState::Fetched);
            summary.found += 1;
            let acquired = Acquired {
                text: capture.text,
                url: capture.url,
                processed: false,
            };
            self.process(&capture.local_id, &acquired, api.as_ref(), &mut summary);
            summary.last_id = Some(capture.local_id);
        }

        self.transition(CrawlState::Seeking);
        self.terminate(&mut summary, Termination::Exhausted);
        tracing::info!("Finished {}", summary);
        Ok(summary)
    }
}
