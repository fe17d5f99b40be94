//! Google result-page driver.
//!
//! Navigates straight to the results URL, waits for the results container
//! to render instead of sleeping, and pages forward through the "next"
//! control. Selector sets live here so a DOM change stays a one-file fix.

use std::time::{Duration, Instant};

use chromiumoxide::page::Page;
use rand::Rng;
use tracing::{debug, info, warn};
use url::Url;

use super::{ExtractError, PageFetch, PageSource};
use crate::discovery::Candidate;

const SEARCH_URL: &str = "https://www.google.com/search";

/// Result blocks, primary selector first. The fallback is only consulted
/// when the primary finds nothing.
const RESULT_BLOCK_SELECTORS: [&str; 2] = ["#search .g div.yuRUbf", "#rso .g div.yuRUbf"];

const TITLE_SELECTOR: &str = "h3";
const LINK_SELECTOR: &str = "a";
const NEXT_PAGE_SELECTOR: &str = "#pnnext";
const RESULTS_CONTAINER_SELECTOR: &str = "#search";

/// Engine-internal links that look like results but never are.
const ENGINE_INTERNAL_PREFIXES: [&str; 2] = [
    "https://webcache.googleusercontent.com",
    "https://translate.google.com",
];

/// How long to poll for the results container before giving up.
const RENDER_WAIT_MAX: Duration = Duration::from_secs(10);
const RENDER_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Retries for the initial navigation only; paging failures surface
/// directly so the loop can settle for a partial batch.
const NAV_RETRIES: u32 = 2;

/// Opaque handle for one rendered result page.
#[derive(Debug)]
pub struct ResultPage {
    index: usize,
}

/// [`PageSource`] implementation driving a live Google session on a single
/// browser page.
pub struct GoogleResultSource {
    page: Page,
}

impl GoogleResultSource {
    #[must_use]
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// Close the underlying browser page. Failures are logged, not
    /// surfaced; the page dies with the browser either way.
    pub async fn close(self) {
        if let Err(e) = self.page.close().await {
            debug!(error = %e, "result page did not close cleanly");
        }
    }

    async fn navigate(&self, url: &Url) -> Result<(), ExtractError> {
        self.page
            .goto(url.as_str())
            .await
            .map_err(|e| ExtractError::Navigation(e.to_string()))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| ExtractError::Navigation(e.to_string()))?;
        self.wait_for_results().await
    }

    async fn navigate_with_retry(&self, url: &Url) -> Result<(), ExtractError> {
        let mut attempt = 0u32;
        loop {
            match self.navigate(url).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < NAV_RETRIES && !matches!(e, ExtractError::Blocked(_)) => {
                    let delay = 2u64.pow(attempt) * 500 + rand::rng().random_range(0..500);
                    warn!(
                        attempt = attempt + 1,
                        delay_ms = delay,
                        error = %e,
                        "navigation failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Poll until the results container is present. The HTTP response
    /// arriving does not mean the results exist yet; Google renders them
    /// with JavaScript afterwards.
    async fn wait_for_results(&self) -> Result<(), ExtractError> {
        let started = Instant::now();
        loop {
            if self
                .page
                .find_element(RESULTS_CONTAINER_SELECTOR)
                .await
                .is_ok()
            {
                debug!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "results container rendered"
                );
                return Ok(());
            }

            let current = self.current_url().await;
            if current.contains("/sorry/") || current.contains("captcha") {
                return Err(ExtractError::Blocked(format!(
                    "interstitial page at {current}"
                )));
            }

            if started.elapsed() >= RENDER_WAIT_MAX {
                return Err(ExtractError::Navigation(format!(
                    "results container '{RESULTS_CONTAINER_SELECTOR}' absent after {}s at {current}",
                    RENDER_WAIT_MAX.as_secs()
                )));
            }
            tokio::time::sleep(RENDER_POLL_INTERVAL).await;
        }
    }

    async fn current_url(&self) -> String {
        self.page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| "about:blank".to_string())
    }

    /// Hide the automation marker before the first navigation.
    async fn mask_automation(&self) {
        let js = r"
            Object.defineProperty(navigator, 'webdriver', {
                get: () => false
            });
        ";
        if let Err(e) = self.page.evaluate(js).await {
            debug!(error = %e, "automation masking failed");
        }
    }
}

impl PageSource for GoogleResultSource {
    type Handle = ResultPage;

    async fn first_page(&self, query: &str) -> Result<ResultPage, ExtractError> {
        self.mask_automation().await;

        let mut url = Url::parse(SEARCH_URL)
            .map_err(|e| ExtractError::Navigation(format!("bad search url: {e}")))?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("hl", "en");

        info!(query, "navigating to first result page");
        self.navigate_with_retry(&url).await?;
        Ok(ResultPage { index: 0 })
    }

    async fn next_page(&self, current: ResultPage) -> Result<PageFetch<ResultPage>, ExtractError> {
        let Ok(next_control) = self.page.find_element(NEXT_PAGE_SELECTOR).await else {
            debug!(page = current.index, "no next-page control");
            return Ok(PageFetch::Exhausted);
        };

        next_control
            .click()
            .await
            .map_err(|e| ExtractError::Navigation(format!("next-page click failed: {e}")))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| ExtractError::Navigation(e.to_string()))?;
        self.wait_for_results().await?;

        Ok(PageFetch::Page(ResultPage {
            index: current.index + 1,
        }))
    }

    async fn candidates(&self, page: &ResultPage) -> Result<Vec<Candidate>, ExtractError> {
        let mut out = Vec::new();

        for selector in RESULT_BLOCK_SELECTORS {
            let blocks = match self.page.find_elements(selector).await {
                Ok(blocks) => blocks,
                Err(_) => continue,
            };
            debug!(
                page = page.index,
                selector,
                blocks = blocks.len(),
                "scanning result blocks"
            );

            for block in blocks {
                // a block missing its title or link is an ad slot or layout
                // fragment; skip it rather than failing the page
                let Ok(title_el) = block.find_element(TITLE_SELECTOR).await else {
                    continue;
                };
                let Ok(link_el) = block.find_element(LINK_SELECTOR).await else {
                    continue;
                };

                let title = title_el
                    .inner_text()
                    .await
                    .ok()
                    .flatten()
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                let Some(url) = link_el.attribute("href").await.ok().flatten() else {
                    continue;
                };

                if ENGINE_INTERNAL_PREFIXES.iter().any(|p| url.starts_with(p)) {
                    continue;
                }

                out.push(Candidate::new(title, url));
            }

            if !out.is_empty() {
                break;
            }
        }

        Ok(out)
    }
}
