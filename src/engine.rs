//! Run orchestration: one discovery pass per configured keyword.
//!
//! Keywords run strictly one after another on a shared browser. A failed
//! keyword never aborts the run; its error is logged and the next keyword
//! proceeds. Shortfalls against the quota are reported as warnings, not
//! errors.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::config::{ExclusionSet, MinerConfig};
use crate::discovery::{DiscoveryLoop, DiscoveryOutcome, DiscoverySettings, StopReason};
use crate::ledger::SeenLedger;
use crate::page_source::{BrowserManager, GoogleResultSource};
use crate::sink::ResultSink;

/// What one keyword's pass produced, condensed for the run report.
#[derive(Debug, Clone)]
pub struct KeywordReport {
    pub keyword: String,
    pub accepted: usize,
    pub stop: StopReason,
}

/// End-of-run accounting across all keywords.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub keywords: Vec<KeywordReport>,
}

impl RunSummary {
    #[must_use]
    pub fn total_accepted(&self) -> usize {
        self.keywords.iter().map(|report| report.accepted).sum()
    }
}

/// Owns the long-lived collaborators and drives the keyword sequence.
pub struct MineEngine {
    config: MinerConfig,
    exclusions: ExclusionSet,
    ledger: SeenLedger,
    sink: ResultSink,
    browser: BrowserManager,
    cancel: Arc<AtomicBool>,
}

impl MineEngine {
    pub async fn new(config: MinerConfig) -> Self {
        let exclusions = config.load_exclusions();
        if !exclusions.is_empty() {
            info!(exclusions = exclusions.len(), "exclusion list loaded");
        }
        let ledger = SeenLedger::open(config.history_file()).await;
        let sink = ResultSink::new(config.output_dir(), config.write_csv());
        let browser = BrowserManager::new(config.headless());
        Self {
            config,
            exclusions,
            ledger,
            sink,
            browser,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag checked before every page fetch; set it to wind the run down
    /// without corrupting ledger state.
    #[must_use]
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let keywords = self.config.keywords();
        info!(keywords = keywords.len(), "starting mining run");

        let settings = DiscoverySettings {
            required_results: self.config.results_per_keyword(),
            max_pages: self.config.max_pages(),
            page_timeout: self.config.page_timeout(),
        };

        let mut summary = RunSummary::default();
        for keyword in keywords {
            if self.cancel.load(Ordering::Relaxed) {
                warn!("run cancelled, skipping remaining keywords");
                break;
            }

            info!(keyword, "searching");
            let outcome = match self.mine_keyword(keyword, settings).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(keyword, error = format!("{e:#}"), "keyword pass failed");
                    continue;
                }
            };

            if outcome.accepted.len() < settings.required_results {
                warn!(
                    keyword,
                    found = outcome.accepted.len(),
                    expected = settings.required_results,
                    stop = %outcome.stop,
                    "fewer new results than requested"
                );
            }

            // sink failure intentionally leaves the ledger alone: these URLs
            // stay seen and will not be re-reported next run
            if let Err(e) = self.sink.save(&outcome).await {
                error!(keyword, error = %e, "failed to write results artifact");
            }

            summary.keywords.push(KeywordReport {
                keyword: keyword.clone(),
                accepted: outcome.accepted.len(),
                stop: outcome.stop,
            });
        }

        if let Err(e) = self.browser.shutdown().await {
            warn!(error = format!("{e:#}"), "browser shutdown incomplete");
        }

        info!(
            keywords = summary.keywords.len(),
            new_results = summary.total_accepted(),
            "mining run complete"
        );
        Ok(summary)
    }

    async fn mine_keyword(
        &self,
        keyword: &str,
        settings: DiscoverySettings,
    ) -> Result<DiscoveryOutcome> {
        let page = self
            .browser
            .page()
            .await
            .context("failed to acquire a browser page")?;
        let source = GoogleResultSource::new(page);

        let outcome = DiscoveryLoop::new(&source, &self.ledger, &self.exclusions, settings)
            .with_cancel_flag(self.cancel.clone())
            .run(keyword)
            .await;

        source.close().await;
        Ok(outcome)
    }
}
