use crate::state::Termination;
use std::fmt;

/// Counters for one site crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Site id
    pub site: String,
    /// Candidate identifiers examined
    pub candidates: u64,
    /// Pages obtained, from the cache or the network
    pub found: u64,
    /// Records persisted
    pub imported: u64,
    /// Cache hits that were already processed
    pub skipped: u64,
    pub not_found: u64,
    /// Pages whose extraction was rejected
    pub invalid: u64,
    pub transient_errors: u64,
    pub storage_errors: u64,
    /// Network requests sent, including side-channel requests
    pub requests: u64,
    /// Last identifier examined
    pub last_id: Option<String>,
    pub termination: Termination,
}

impl RunSummary {
    pub fn new(site: &str) -> Self {
        Self {
            site: site.to_string(),
            candidates: 0,
            found: 0,
            imported: 0,
            skipped: 0,
            not_found: 0,
            invalid: 0,
            transient_errors: 0,
            storage_errors: 0,
            requests: 0,
            last_id: None,
            termination: Termination::Exhausted,
        }
    }

    /// Candidates that counted toward the breaker
    pub fn failures(&self) -> u64 {
        self.not_found + self.invalid + self.transient_errors
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} candidates, {} found, {} imported, {} skipped, {} not found, {} invalid, \
             {} transient errors, {} storage errors, {} requests, last id {}, stopped: {}",
            self.site,
            self.candidates,
            self.found,
            self.imported,
            self.skipped,
            self.not_found,
            self.invalid,
            self.transient_errors,
            self.storage_errors,
            self.requests,
            self.last_id.as_deref().unwrap_or("-"),
            self.termination
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failures_and_display() {
        let mut summary = RunSummary::new("alpha");
        summary.not_found = 2;
        summary.invalid = 1;
        summary.transient_errors = 3;
        summary.storage_errors = 4;
        summary.last_id = Some("ABC-010".to_string());
        summary.termination = Termination::Breaker;

        assert_eq!(summary.failures(), 6);
        let line = summary.to_string();
        assert!(line.starts_with("alpha: "));
        assert!(line.contains("last id ABC-010"));
        assert!(line.ends_with("stopped: breaker"));
    }
}
