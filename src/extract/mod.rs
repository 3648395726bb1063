//! Extraction pipeline
//!
//! This module turns decoded page text (plus an optional JSON side channel)
//! into a typed catalog record:
//! - Ordered per-field strategies, first plausible result wins
//! - Date and runtime parsing with plausibility bounds
//! - Performer name splitting, normalization and filtering
//! - Title validation that rejects site names and placeholders
//!
//! Extraction is pure; it never touches the network or the database.

mod fields;
mod html;
mod names;
mod strategy;

pub use fields::{parse_date, parse_duration_minutes, MAX_DURATION_MINUTES};
pub use html::{extract_path, resolve_url};
pub use names::{normalize_name, split_aliases, split_names, NameFilter};
pub use strategy::{ExtractionProfile, FieldRules, ListStrategy, TextStrategy};

use crate::config::SiteConfig;
use crate::storage::CatalogFields;
use crate::ConfigError;
use chrono::NaiveDate;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;

/// Longest tag kept
const MAX_TAG_CHARS: usize = 64;

/// Input to extraction
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    /// Decoded page markup
    pub text: &'a str,
    /// Parsed side-channel document, when one was acquired
    pub api: Option<&'a serde_json::Value>,
    /// URL the page was fetched from, used to resolve relative links
    pub url: &'a str,
}

/// A performer as found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformerCandidate {
    /// Normalized display name
    pub name: String,
    /// Alternate spellings found alongside the name
    pub aliases: Vec<String>,
    /// Phonetic reading, when the source provides one
    pub reading: Option<String>,
}

/// A validated record ready for persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRecord {
    pub title: String,
    pub description: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub duration_minutes: Option<u32>,
    pub cover_url: Option<String>,
    pub sample_urls: Vec<String>,
    pub performers: Vec<PerformerCandidate>,
    pub tags: Vec<String>,
}

impl ExtractedRecord {
    /// Columns of the catalog item row
    pub fn catalog_fields(&self) -> CatalogFields {
        CatalogFields {
            title: Some(self.title.clone()),
            description: self.description.clone(),
            release_date: self.release_date,
            duration_minutes: self.duration_minutes,
            cover_url: self.cover_url.clone(),
        }
    }
}

/// Why a page did not yield a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// No strategy produced a title
    MissingTitle,
    /// The only titles found were site names or placeholders
    PlaceholderTitle,
    /// The only titles found were shorter than the site minimum
    TitleTooShort,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::MissingTitle => "missing title",
            Self::PlaceholderTitle => "placeholder title",
            Self::TitleTooShort => "title too short",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Valid(ExtractedRecord),
    Invalid(RejectReason),
}

enum TextRule {
    Api(String),
    Meta(Selector),
    Css(Selector),
    CssAttr(Selector, String),
    PageTitle,
    Regex(Regex),
    Label(String),
}

enum ListRule {
    ApiList {
        path: String,
        key: Option<String>,
        reading_key: Option<String>,
    },
    CssAll(Selector),
    CssAttrAll(Selector, String),
    RegexAll(Regex),
    Label(String),
}

/// A raw list entry before field-specific cleanup
struct ListEntry {
    value: String,
    reading: Option<String>,
}

impl ListEntry {
    fn plain(value: String) -> Self {
        Self {
            value,
            reading: None,
        }
    }
}

fn compile_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector)
        .map_err(|e| ConfigError::InvalidRule(format!("invalid selector '{}': {:?}", selector, e)))
}

fn compile_regex(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern)
        .map_err(|e| ConfigError::InvalidRule(format!("invalid pattern '{}': {}", pattern, e)))
}

fn compile_text(strategy: &TextStrategy) -> Result<TextRule, ConfigError> {
    Ok(match strategy {
        TextStrategy::Api(path) => TextRule::Api(path.clone()),
        TextStrategy::Meta(name) => TextRule::Meta(compile_selector(&html::meta_selector(name))?),
        TextStrategy::Css(selector) => TextRule::Css(compile_selector(selector)?),
        TextStrategy::CssAttr { selector, attr } => {
            TextRule::CssAttr(compile_selector(selector)?, attr.clone())
        }
        TextStrategy::PageTitle => TextRule::PageTitle,
        TextStrategy::Regex(pattern) => TextRule::Regex(compile_regex(pattern)?),
        TextStrategy::Label(label) => TextRule::Label(label.clone()),
    })
}

fn compile_list(strategy: &ListStrategy) -> Result<ListRule, ConfigError> {
    Ok(match strategy {
        ListStrategy::ApiList {
            path,
            key,
            reading_key,
        } => ListRule::ApiList {
            path: path.clone(),
            key: key.clone(),
            reading_key: reading_key.clone(),
        },
        ListStrategy::CssAll(selector) => ListRule::CssAll(compile_selector(selector)?),
        ListStrategy::CssAttrAll { selector, attr } => {
            ListRule::CssAttrAll(compile_selector(selector)?, attr.clone())
        }
        ListStrategy::RegexAll(pattern) => ListRule::RegexAll(compile_regex(pattern)?),
        ListStrategy::Label(label) => ListRule::Label(label.clone()),
    })
}

fn compile_all<S, R>(
    strategies: &[S],
    compile: impl Fn(&S) -> Result<R, ConfigError>,
) -> Result<Vec<R>, ConfigError> {
    strategies.iter().map(compile).collect()
}

/// Compiled extraction rules for one site
pub struct Extractor {
    title: Vec<TextRule>,
    description: Vec<TextRule>,
    release_date: Vec<TextRule>,
    duration: Vec<TextRule>,
    cover: Vec<TextRule>,
    samples: Vec<ListRule>,
    performers: Vec<ListRule>,
    tags: Vec<ListRule>,
    site_names: Vec<String>,
    min_title_chars: usize,
    names: NameFilter,
    today: NaiveDate,
}

/// Document state shared by the strategies of one extraction
struct Context<'a> {
    page: Page<'a>,
    document: Html,
    site_names: &'a [String],
}

impl Extractor {
    /// Compiles a site's extraction profile
    ///
    /// # Returns
    ///
    /// * `Ok(Extractor)` - All selectors and patterns compiled
    /// * `Err(ConfigError::InvalidRule)` - A selector or pattern is malformed
    pub fn new(site: &SiteConfig) -> Result<Self, ConfigError> {
        let rules = site.extraction.rules();

        let mut site_names = site.site_names.clone();
        if !site_names.iter().any(|n| n.eq_ignore_ascii_case(&site.name)) {
            site_names.push(site.name.clone());
        }

        Ok(Self {
            title: compile_all(&rules.title, compile_text)?,
            description: compile_all(&rules.description, compile_text)?,
            release_date: compile_all(&rules.release_date, compile_text)?,
            duration: compile_all(&rules.duration, compile_text)?,
            cover: compile_all(&rules.cover, compile_text)?,
            samples: compile_all(&rules.samples, compile_list)?,
            performers: compile_all(&rules.performers, compile_list)?,
            tags: compile_all(&rules.tags, compile_list)?,
            site_names,
            min_title_chars: site.min_title_chars,
            names: NameFilter::new(&site.generic_words, site.max_name_chars),
            today: chrono::Utc::now().date_naive(),
        })
    }

    /// Overrides the reference date for release-date plausibility
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Extracts a record from a page
    pub fn extract(&self, page: &Page<'_>) -> Extraction {
        let cx = Context {
            page: *page,
            document: Html::parse_document(page.text),
            site_names: &self.site_names,
        };

        let title = match self.extract_title(&cx) {
            Ok(title) => title,
            Err(reason) => {
                tracing::trace!("Rejected {}: {}", page.url, reason);
                return Extraction::Invalid(reason);
            }
        };

        let description = first_text(&cx, &self.description, |s| {
            fields::plausible_description(&s).then_some(s)
        });
        let release_date = first_text(&cx, &self.release_date, |s| {
            fields::parse_date(&s).filter(|d| fields::plausible_date(*d, self.today))
        });
        let duration_minutes = first_text(&cx, &self.duration, |s| {
            fields::parse_duration_minutes(&s).filter(|m| fields::plausible_duration(*m))
        });
        let cover_url = first_text(&cx, &self.cover, |s| html::resolve_url(page.url, &s));

        let sample_urls = first_list(&cx, &self.samples, |entries| {
            dedup(
                entries
                    .into_iter()
                    .filter_map(|e| html::resolve_url(page.url, &e.value)),
            )
        });
        let performers = first_list(&cx, &self.performers, |entries| self.performer_list(entries));
        let tags = first_list(&cx, &self.tags, tag_list);

        tracing::trace!(
            "Extracted '{}' from {} ({} performers, {} tags)",
            title,
            page.url,
            performers.len(),
            tags.len()
        );

        Extraction::Valid(ExtractedRecord {
            title,
            description,
            release_date,
            duration_minutes,
            cover_url,
            sample_urls,
            performers,
            tags,
        })
    }

    fn extract_title(&self, cx: &Context<'_>) -> Result<String, RejectReason> {
        let mut reason = RejectReason::MissingTitle;

        for rule in &self.title {
            let Some(candidate) = text_value(cx, rule) else {
                continue;
            };
            let candidate = html::strip_site_names(&candidate, &self.site_names);
            let candidate = candidate.as_str();

            if self.is_placeholder(candidate) {
                reason = RejectReason::PlaceholderTitle;
                continue;
            }
            if candidate.chars().count() < self.min_title_chars {
                if reason == RejectReason::MissingTitle {
                    reason = RejectReason::TitleTooShort;
                }
                continue;
            }
            return Ok(candidate.to_string());
        }

        Err(reason)
    }

    fn is_placeholder(&self, title: &str) -> bool {
        let title = title.trim();
        self.site_names
            .iter()
            .any(|n| n.trim().to_lowercase() == title.to_lowercase())
    }

    fn performer_list(&self, entries: Vec<ListEntry>) -> Vec<PerformerCandidate> {
        let mut seen = HashSet::new();
        let mut performers = Vec::new();

        for entry in entries {
            let reading = entry.reading.map(|r| normalize_name(&r)).filter(|r| !r.is_empty());
            for raw in split_names(&entry.value) {
                let (name, aliases) = split_aliases(&raw);
                if !self.names.accepts(&name) || !seen.insert(name.to_lowercase()) {
                    continue;
                }
                let aliases = aliases
                    .into_iter()
                    .filter(|a| self.names.accepts(a))
                    .collect();
                performers.push(PerformerCandidate {
                    name,
                    aliases,
                    reading: reading.clone(),
                });
            }
        }

        performers
    }
}

fn tag_list(entries: Vec<ListEntry>) -> Vec<String> {
    dedup(
        entries
            .iter()
            .flat_map(|e| split_names(&e.value))
            .map(|t| normalize_name(&t))
            .filter(|t| !t.is_empty() && t.chars().count() <= MAX_TAG_CHARS && !t.contains("://")),
    )
}

fn dedup(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(v.to_lowercase()))
        .collect()
}

/// Runs text rules in order and returns the first accepted value
fn first_text<T>(
    cx: &Context<'_>,
    rules: &[TextRule],
    accept: impl Fn(String) -> Option<T>,
) -> Option<T> {
    rules
        .iter()
        .filter_map(|rule| text_value(cx, rule))
        .find_map(accept)
}

/// Runs list rules in order and returns the first non-empty accepted list
fn first_list<T>(
    cx: &Context<'_>,
    rules: &[ListRule],
    accept: impl Fn(Vec<ListEntry>) -> Vec<T>,
) -> Vec<T> {
    rules
        .iter()
        .map(|rule| list_values(cx, rule))
        .filter(|entries| !entries.is_empty())
        .map(accept)
        .find(|values| !values.is_empty())
        .unwrap_or_default()
}

fn text_value(cx: &Context<'_>, rule: &TextRule) -> Option<String> {
    let value = match rule {
        TextRule::Api(path) => cx
            .page
            .api
            .and_then(|api| html::json_text(html::extract_path(api, path))),
        TextRule::Meta(selector) => html::meta_content(&cx.document, selector),
        TextRule::Css(selector) => cx.document.select(selector).map(html::element_text).find(|t| !t.is_empty()),
        TextRule::CssAttr(selector, attr) => cx
            .document
            .select(selector)
            .filter_map(|e| e.value().attr(attr))
            .map(html::clean_text)
            .find(|t| !t.is_empty()),
        TextRule::PageTitle => html::page_title(&cx.document, cx.site_names),
        TextRule::Regex(re) => re.captures(cx.page.text).and_then(|caps| {
            caps.get(1)
                .or_else(|| caps.get(0))
                .map(|m| html::clean_text(m.as_str()))
        }),
        TextRule::Label(label) => html::label_value(&cx.document, label).map(|v| v.text),
    };

    value.filter(|v| !v.is_empty())
}

fn list_values(cx: &Context<'_>, rule: &ListRule) -> Vec<ListEntry> {
    match rule {
        ListRule::ApiList {
            path,
            key,
            reading_key,
        } => {
            let Some(api) = cx.page.api else {
                return Vec::new();
            };
            match html::extract_path(api, path) {
                serde_json::Value::Array(items) => items
                    .iter()
                    .filter_map(|item| {
                        let value = match key {
                            Some(key) => html::json_text(html::extract_path(item, key)),
                            None => html::json_text(item),
                        }?;
                        let reading = reading_key
                            .as_ref()
                            .and_then(|k| html::json_text(html::extract_path(item, k)));
                        Some(ListEntry { value, reading })
                    })
                    .collect(),
                other => html::json_text(other)
                    .map(ListEntry::plain)
                    .into_iter()
                    .collect(),
            }
        }
        ListRule::CssAll(selector) => cx
            .document
            .select(selector)
            .map(html::element_text)
            .filter(|t| !t.is_empty())
            .map(ListEntry::plain)
            .collect(),
        ListRule::CssAttrAll(selector, attr) => cx
            .document
            .select(selector)
            .filter_map(|e| e.value().attr(attr))
            .map(html::clean_text)
            .filter(|t| !t.is_empty())
            .map(ListEntry::plain)
            .collect(),
        ListRule::RegexAll(re) => re
            .captures_iter(cx.page.text)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(0)))
            .map(|m| html::clean_text(m.as_str()))
            .filter(|t| !t.is_empty())
            .map(ListEntry::plain)
            .collect(),
        ListRule::Label(label) => match html::label_value(&cx.document, label) {
            Some(value) => {
                let links = value.link_texts();
                if links.is_empty() {
                    vec![ListEntry::plain(value.text)]
                } else {
                    links.into_iter().map(ListEntry::plain).collect()
                }
            }
            None => Vec::new(),
        },
    }
}
