//! Live smoke test against a real browser and the real search engine.

use resultminer::{BrowserManager, GoogleResultSource, PageSource};

#[tokio::test]
#[ignore] // requires a local Chrome/Chromium installation and network access
async fn first_page_yields_candidates() {
    let manager = BrowserManager::new(true);
    let page = manager.page().await.unwrap();
    let source = GoogleResultSource::new(page);

    let handle = source.first_page("rust programming language").await.unwrap();
    let candidates = source.candidates(&handle).await.unwrap();

    assert!(!candidates.is_empty());
    assert!(candidates.iter().all(|c| c.url.starts_with("http")));

    source.close().await;
    manager.shutdown().await.unwrap();
}
