use crate::extract::ExtractionProfile;
use crate::sequence::{Direction, IdScheme};
use serde::Deserialize;
use url::Url;

/// Placeholder substituted with the rendered local identifier
pub const ID_PLACEHOLDER: &str = "{id}";

fn default_timeout_secs() -> u64 {
    30
}

fn default_min_title_chars() -> usize {
    2
}

fn default_max_name_chars() -> usize {
    40
}

/// Main configuration structure for Catalog Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub fetcher: FetcherConfig,
    pub storage: StorageConfig,
    #[serde(rename = "site", default)]
    pub sites: Vec<SiteConfig>,
}

impl Config {
    /// Finds a site by id
    pub fn site(&self, id: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|s| s.id == id)
    }
}

/// HTTP identity and limits shared by every site
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Hard per-request timeout
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl FetcherConfig {
    /// User-Agent header sent with every request
    pub fn user_agent(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// What happens to captures whose extraction is rejected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidPolicy {
    /// Mark the capture processed and move on
    #[default]
    Skip,

    /// Leave the capture unprocessed for review or a reprocess run
    Flag,
}

/// One crawlable site
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Source key stored with every item
    pub id: String,

    /// Human readable name
    pub name: String,

    /// Page URL template containing `{id}`
    #[serde(rename = "page-url")]
    pub page_url: String,

    /// Optional JSON side-channel URL template containing `{id}`
    #[serde(rename = "api-url", default)]
    pub api_url: Option<String>,

    pub scheme: IdScheme,

    #[serde(default)]
    pub direction: Direction,

    /// First identifier visited
    #[serde(rename = "start-id")]
    pub start_id: String,

    /// Last identifier visited (inclusive)
    #[serde(rename = "end-id", default)]
    pub end_id: Option<String>,

    /// Consecutive failures after which the crawl stops
    #[serde(rename = "breaker-threshold")]
    pub breaker_threshold: u32,

    /// Minimum delay between network requests (milliseconds)
    #[serde(rename = "delay-ms")]
    pub delay_ms: u64,

    /// Upper bound of random extra delay (milliseconds)
    #[serde(rename = "jitter-ms", default)]
    pub jitter_ms: u64,

    /// Static cookie sent with every request, e.g. an age-consent flag
    #[serde(rename = "consent-cookie", default)]
    pub consent_cookie: Option<String>,

    /// Encoding to assume when the site omits or mislabels its charset
    #[serde(default)]
    pub encoding: Option<String>,

    /// Site names and placeholders that are never a valid title
    #[serde(rename = "site-names", default)]
    pub site_names: Vec<String>,

    #[serde(default)]
    pub extraction: ExtractionProfile,

    #[serde(rename = "on-invalid", default)]
    pub on_invalid: InvalidPolicy,

    #[serde(rename = "min-title-chars", default = "default_min_title_chars")]
    pub min_title_chars: usize,

    #[serde(rename = "max-name-chars", default = "default_max_name_chars")]
    pub max_name_chars: usize,

    /// Extra words that are never performer names on this site
    #[serde(rename = "generic-words", default)]
    pub generic_words: Vec<String>,
}

impl SiteConfig {
    /// Renders the page URL for a local identifier
    pub fn page_url_for(&self, local_id: &str) -> String {
        self.page_url.replace(ID_PLACEHOLDER, local_id)
    }

    /// Renders the side-channel URL for a local identifier, if configured
    pub fn api_url_for(&self, local_id: &str) -> Option<String> {
        self.api_url
            .as_ref()
            .map(|template| template.replace(ID_PLACEHOLDER, local_id))
    }

    /// Host of the page URL template
    pub fn host(&self) -> Option<String> {
        Url::parse(&self.page_url_for("0"))
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
    }

    /// Cache source key for side-channel captures
    pub fn api_source(&self) -> String {
        format!("{}:api", self.id)
    }
}
