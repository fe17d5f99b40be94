//! Artifact-writing tests for the result sink.

use resultminer::{AcceptedResult, DiscoveryOutcome, ResultSink, StopReason};
use tempfile::TempDir;

fn outcome(keyword: &str, results: &[(&str, &str)]) -> DiscoveryOutcome {
    DiscoveryOutcome {
        keyword: keyword.to_string(),
        accepted: results
            .iter()
            .map(|(title, url)| AcceptedResult {
                title: (*title).to_string(),
                url: (*url).to_string(),
            })
            .collect(),
        pages_fetched: 1,
        stop: StopReason::QuotaMet,
    }
}

#[tokio::test]
async fn empty_batch_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let sink = ResultSink::new(dir.path(), true);

    let written = sink.save(&outcome("rust", &[])).await.unwrap();

    assert!(written.is_empty());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn json_artifact_carries_keyword_date_and_results() {
    let dir = TempDir::new().unwrap();
    let sink = ResultSink::new(dir.path(), false);

    let written = sink
        .save(&outcome(
            "rust safety",
            &[("A", "https://x.com/1"), ("B", "https://x.com/2")],
        ))
        .await
        .unwrap();

    assert_eq!(written.len(), 1);
    let path = &written[0];
    let name = path.file_name().unwrap().to_str().unwrap();
    assert!(name.ends_with("_rust_safety.json"));

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(parsed["keyword"], "rust safety");
    assert!(parsed["date"].as_str().is_some());
    assert_eq!(parsed["results"][0]["title"], "A");
    assert_eq!(parsed["results"][1]["url"], "https://x.com/2");
}

#[tokio::test]
async fn csv_artifact_is_written_when_enabled() {
    let dir = TempDir::new().unwrap();
    let sink = ResultSink::new(dir.path(), true);

    let written = sink
        .save(&outcome(
            "rust",
            &[("Plain title", "https://x.com/1"), ("Comma, title", "https://x.com/2")],
        ))
        .await
        .unwrap();

    assert_eq!(written.len(), 2);
    let csv_path = written.iter().find(|p| p.extension().unwrap() == "csv").unwrap();
    let body = std::fs::read_to_string(csv_path).unwrap();
    let mut lines = body.lines();

    assert_eq!(lines.next(), Some("keyword,date,title,url"));
    let first = lines.next().unwrap();
    assert!(first.starts_with("rust,"));
    assert!(first.ends_with(",Plain title,https://x.com/1"));
    let second = lines.next().unwrap();
    assert!(second.contains("\"Comma, title\""));
}

#[tokio::test]
async fn keyword_separators_never_reach_the_filename() {
    let dir = TempDir::new().unwrap();
    let sink = ResultSink::new(dir.path(), false);

    let written = sink
        .save(&outcome("rust/unsafe code", &[("A", "https://x.com/1")]))
        .await
        .unwrap();

    let name = written[0].file_name().unwrap().to_str().unwrap();
    assert!(!name.contains('/'));
    assert!(name.contains("unsafe_code"));
    assert!(written[0].exists());
}

#[tokio::test]
async fn output_directory_is_provisioned_on_demand() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("runs").join("today");
    let sink = ResultSink::new(&nested, false);

    let written = sink
        .save(&outcome("rust", &[("A", "https://x.com/1")]))
        .await
        .unwrap();

    assert!(nested.is_dir());
    assert!(written[0].exists());
}
