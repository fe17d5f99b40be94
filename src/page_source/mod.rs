//! Page acquisition boundary for the discovery loop.
//!
//! The loop only ever sees this trait; the production implementation drives
//! real result pages through a browser, while tests script pages in memory.
//! "No more pages" is a normal [`PageFetch::Exhausted`] value, never an
//! error, and extraction returns a possibly-empty sequence rather than
//! failing on absent elements.

mod browser;
mod google;

pub use browser::{BrowserHandle, BrowserManager};
pub use google::GoogleResultSource;

use thiserror::Error;

use crate::discovery::Candidate;

/// Failures surfaced by a page source. `Timeout` is kept distinguishable so
/// the loop can report slow pages separately from broken ones.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("page fetch timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("search engine blocked the session: {0}")]
    Blocked(String),

    #[error("browser failure: {0}")]
    Browser(String),
}

impl ExtractError {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Outcome of asking for the page after `current`.
#[derive(Debug)]
pub enum PageFetch<P> {
    Page(P),
    Exhausted,
}

/// A paginated source of result-page candidates for one query.
pub trait PageSource {
    type Handle;

    /// Navigate to the first result page for `query`.
    async fn first_page(&self, query: &str) -> Result<Self::Handle, ExtractError>;

    /// Advance past `current`. Absence of a next page is `Exhausted`.
    async fn next_page(&self, current: Self::Handle)
    -> Result<PageFetch<Self::Handle>, ExtractError>;

    /// Extract raw candidates from `page`, in display order.
    async fn candidates(&self, page: &Self::Handle) -> Result<Vec<Candidate>, ExtractError>;
}
