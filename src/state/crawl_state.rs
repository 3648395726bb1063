/// Crawl state definitions for the per-candidate loop
///
/// This module defines the states a site crawl moves through for every
/// candidate identifier, and the reasons a crawl can stop.
use std::fmt;

/// Why a site crawl stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    /// The identifier space has no further candidates
    Exhausted,

    /// The requested number of imports was reached
    LimitReached,

    /// The configured end identifier was passed
    EndBoundary,

    /// Too many consecutive candidates failed
    Breaker,
}

impl Termination {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Exhausted => "exhausted",
            Self::LimitReached => "limit_reached",
            Self::EndBoundary => "end_boundary",
            Self::Breaker => "breaker",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "exhausted" => Some(Self::Exhausted),
            "limit_reached" => Some(Self::LimitReached),
            "end_boundary" => Some(Self::EndBoundary),
            "breaker" => Some(Self::Breaker),
            _ => None,
        }
    }

    /// Returns true if the crawl stopped because of failures rather than by plan
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Breaker)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Represents where the crawl loop is for the current candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    // ===== Active States =====
    /// Looking up or fetching the current candidate
    Seeking,

    /// Decoded text is available, from the cache or the network
    Fetched,

    // ===== Extraction Outcomes =====
    /// Extraction produced a valid record
    ParsedValid,

    /// Extraction rejected the page
    ParsedInvalid,

    /// The record was written to the catalog
    Persisted,

    // ===== Terminal State =====
    Terminated(Termination),
}

impl CrawlState {
    /// Returns true if the crawl has stopped
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated(_))
    }

    /// Returns true if `next` is a legal successor of this state
    ///
    /// Failed fetches, rejected pages and storage errors return straight to
    /// `Seeking` for the next candidate.
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        use CrawlState::*;

        match (*self, next) {
            (Terminated(_), _) => false,
            (Seeking, Fetched | Seeking | Terminated(_)) => true,
            (Fetched, ParsedValid | ParsedInvalid | Seeking) => true,
            (ParsedValid, Persisted | Seeking) => true,
            (ParsedInvalid, Seeking) => true,
            (Persisted, Seeking) => true,
            _ => false,
        }
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Seeking => "seeking",
            Self::Fetched => "fetched",
            Self::ParsedValid => "parsed_valid",
            Self::ParsedInvalid => "parsed_invalid",
            Self::Persisted => "persisted",
            Self::Terminated(_) => "terminated",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminated(reason) => write!(f, "terminated ({})", reason),
            other => write!(f, "{}", other.to_db_string()),
        }
    }
}
