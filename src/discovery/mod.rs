//! Per-keyword incremental discovery.
//!
//! Walks result pages for one keyword, filters each candidate, commits
//! every acceptance to the dedup ledger before counting it, and stops on
//! quota, page cap, stagnation, exhaustion, fetch failure, or cancellation.

mod filter;
mod types;

pub use filter::{Rejection, evaluate};
pub use types::{AcceptedResult, Candidate, DiscoveryOutcome, DiscoverySettings, StopReason};

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::config::ExclusionSet;
use crate::ledger::SeenLedger;
use crate::page_source::{ExtractError, PageFetch, PageSource};

/// Drives one keyword at a time through a [`PageSource`].
pub struct DiscoveryLoop<'a, S: PageSource> {
    source: &'a S,
    ledger: &'a SeenLedger,
    exclusions: &'a ExclusionSet,
    settings: DiscoverySettings,
    cancel: Arc<AtomicBool>,
}

impl<'a, S: PageSource> DiscoveryLoop<'a, S> {
    #[must_use]
    pub fn new(
        source: &'a S,
        ledger: &'a SeenLedger,
        exclusions: &'a ExclusionSet,
        settings: DiscoverySettings,
    ) -> Self {
        Self {
            source,
            ledger,
            exclusions,
            settings,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share a cancellation flag with the caller. The loop checks it before
    /// every page fetch; a set flag stops the keyword without touching
    /// already-committed ledger state.
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run discovery for `keyword` to completion.
    ///
    /// Never fails: fetch errors end the pass early and whatever was
    /// accumulated so far is returned as a partial batch.
    pub async fn run(&self, keyword: &str) -> DiscoveryOutcome {
        let mut accepted: Vec<AcceptedResult> = Vec::new();
        // intra-run working set for O(1) duplicate suppression; the ledger
        // stays the source of truth across runs
        let mut batch_urls: HashSet<String> = HashSet::new();
        let mut pages_fetched = 0usize;

        if self.cancelled() {
            return self.outcome(keyword, accepted, pages_fetched, StopReason::Cancelled);
        }

        info!(keyword, "starting discovery");

        let mut page = match self.bounded(self.source.first_page(keyword)).await {
            Ok(page) => {
                pages_fetched = 1;
                page
            }
            Err(e) => {
                warn!(keyword, error = %e, "first result page unavailable");
                return self.outcome(keyword, accepted, pages_fetched, StopReason::FetchFailed);
            }
        };

        let stop = loop {
            let candidates = match self.bounded(self.source.candidates(&page)).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!(keyword, page = pages_fetched, error = %e, "extraction failed");
                    break StopReason::FetchFailed;
                }
            };
            debug!(
                keyword,
                page = pages_fetched,
                candidates = candidates.len(),
                "extracted candidates"
            );

            let mut page_accepted = 0usize;
            for candidate in candidates {
                if accepted.len() >= self.settings.required_results {
                    break;
                }

                let already_seen = self.ledger.seen(keyword, &candidate.url).await;
                let in_batch = batch_urls.contains(&candidate.url);
                if let Err(reason) =
                    filter::evaluate(&candidate, self.exclusions, already_seen, in_batch)
                {
                    debug!(keyword, url = %candidate.url, %reason, "candidate rejected");
                    continue;
                }

                // commit before reporting: an accepted result must already be
                // durable in the ledger when it reaches the sink
                match self.ledger.record(keyword, &candidate.url).await {
                    Ok(_) => {
                        info!(keyword, title = %candidate.title, "accepted new result");
                        batch_urls.insert(candidate.url.clone());
                        accepted.push(AcceptedResult::from(candidate));
                        page_accepted += 1;
                    }
                    Err(e) => {
                        warn!(
                            keyword,
                            url = %candidate.url,
                            error = %e,
                            "ledger commit failed, skipping candidate"
                        );
                    }
                }
            }

            if accepted.len() >= self.settings.required_results {
                break StopReason::QuotaMet;
            }
            if pages_fetched >= self.settings.max_pages {
                break StopReason::PageLimit;
            }
            if page_accepted == 0 {
                break StopReason::Stagnated;
            }
            if self.cancelled() {
                break StopReason::Cancelled;
            }

            page = match self.bounded(self.source.next_page(page)).await {
                Ok(PageFetch::Page(next)) => {
                    pages_fetched += 1;
                    next
                }
                Ok(PageFetch::Exhausted) => break StopReason::Exhausted,
                Err(e) => {
                    warn!(keyword, error = %e, "next page unavailable");
                    break StopReason::FetchFailed;
                }
            };
        };

        self.outcome(keyword, accepted, pages_fetched, stop)
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    fn outcome(
        &self,
        keyword: &str,
        accepted: Vec<AcceptedResult>,
        pages_fetched: usize,
        stop: StopReason,
    ) -> DiscoveryOutcome {
        info!(
            keyword,
            accepted = accepted.len(),
            pages_fetched,
            stop = %stop,
            "discovery finished"
        );
        DiscoveryOutcome {
            keyword: keyword.to_string(),
            accepted,
            pages_fetched,
            stop,
        }
    }

    /// Cap a page operation with the configured per-page timeout.
    async fn bounded<T>(
        &self,
        operation: impl Future<Output = Result<T, ExtractError>>,
    ) -> Result<T, ExtractError> {
        match tokio::time::timeout(self.settings.page_timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(ExtractError::Timeout {
                secs: self.settings.page_timeout.as_secs(),
            }),
        }
    }
}
