//! Shared helpers for the integration test suite.

#![allow(dead_code)]

use std::sync::Mutex;

use resultminer::{Candidate, ExtractError, PageFetch, PageSource};

/// Page source serving pre-scripted pages of candidates, with fetch
/// accounting for page-cap assertions.
pub struct ScriptedSource {
    pages: Vec<Vec<Candidate>>,
    fetches: Mutex<usize>,
}

impl ScriptedSource {
    pub fn new(pages: Vec<Vec<Candidate>>) -> Self {
        Self {
            pages,
            fetches: Mutex::new(0),
        }
    }

    /// How many pages were actually fetched (first page included).
    pub fn pages_fetched(&self) -> usize {
        *self.fetches.lock().unwrap()
    }

    fn count_fetch(&self) {
        *self.fetches.lock().unwrap() += 1;
    }
}

impl PageSource for ScriptedSource {
    type Handle = usize;

    async fn first_page(&self, _query: &str) -> Result<usize, ExtractError> {
        if self.pages.is_empty() {
            return Err(ExtractError::Navigation("no pages scripted".into()));
        }
        self.count_fetch();
        Ok(0)
    }

    async fn next_page(&self, current: usize) -> Result<PageFetch<usize>, ExtractError> {
        let next = current + 1;
        if next >= self.pages.len() {
            return Ok(PageFetch::Exhausted);
        }
        self.count_fetch();
        Ok(PageFetch::Page(next))
    }

    async fn candidates(&self, page: &usize) -> Result<Vec<Candidate>, ExtractError> {
        Ok(self.pages[*page].clone())
    }
}

/// Source whose paging always fails after the first page.
pub struct BrokenPagingSource {
    first: Vec<Candidate>,
}

impl BrokenPagingSource {
    pub fn new(first: Vec<Candidate>) -> Self {
        Self { first }
    }
}

impl PageSource for BrokenPagingSource {
    type Handle = usize;

    async fn first_page(&self, _query: &str) -> Result<usize, ExtractError> {
        Ok(0)
    }

    async fn next_page(&self, _current: usize) -> Result<PageFetch<usize>, ExtractError> {
        Err(ExtractError::Navigation("connection reset".into()))
    }

    async fn candidates(&self, _page: &usize) -> Result<Vec<Candidate>, ExtractError> {
        Ok(self.first.clone())
    }
}

/// Source that hangs long enough to trip any sub-second page timeout.
pub struct StalledSource;

impl PageSource for StalledSource {
    type Handle = usize;

    async fn first_page(&self, _query: &str) -> Result<usize, ExtractError> {
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        Ok(0)
    }

    async fn next_page(&self, _current: usize) -> Result<PageFetch<usize>, ExtractError> {
        Ok(PageFetch::Exhausted)
    }

    async fn candidates(&self, _page: &usize) -> Result<Vec<Candidate>, ExtractError> {
        Ok(Vec::new())
    }
}

pub fn candidate(title: &str, url: &str) -> Candidate {
    Candidate::new(title, url)
}
