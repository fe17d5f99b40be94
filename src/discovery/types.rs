//! Data types flowing through the discovery loop.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Raw (title, url) pair extracted from a result page. Transient; produced
/// per page and never persisted directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub title: String,
    pub url: String,
}

impl Candidate {
    #[must_use]
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Candidate that passed every filter stage and was committed to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedResult {
    pub title: String,
    pub url: String,
}

impl From<Candidate> for AcceptedResult {
    fn from(candidate: Candidate) -> Self {
        Self {
            title: candidate.title,
            url: candidate.url,
        }
    }
}

/// Why a keyword's discovery loop terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The per-keyword quota of new results was met.
    QuotaMet,
    /// The page ceiling was reached before the quota.
    PageLimit,
    /// The last page contributed zero newly accepted results.
    Stagnated,
    /// The engine reported no further pages.
    Exhausted,
    /// A page fetch or extraction failed; the batch is partial.
    FetchFailed,
    /// A shutdown was requested before the next page fetch.
    Cancelled,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::QuotaMet => "quota met",
            Self::PageLimit => "page limit reached",
            Self::Stagnated => "no new results on last page",
            Self::Exhausted => "no more pages",
            Self::FetchFailed => "page fetch failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Everything one keyword's discovery pass produced.
#[derive(Debug, Clone)]
pub struct DiscoveryOutcome {
    pub keyword: String,
    pub accepted: Vec<AcceptedResult>,
    pub pages_fetched: usize,
    pub stop: StopReason,
}

/// Loop tuning knobs, carried as one copyable bundle.
#[derive(Debug, Clone, Copy)]
pub struct DiscoverySettings {
    /// New results to collect per keyword. Validated >= 1 at config load.
    pub required_results: usize,
    /// Hard ceiling on result pages fetched per keyword.
    pub max_pages: usize,
    /// Time allowed for each page fetch/extract step.
    pub page_timeout: Duration,
}
