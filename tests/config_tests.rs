//! Config loading and validation tests.

use std::path::Path;

use resultminer::{ConfigError, MinerConfig};
use tempfile::TempDir;

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.json");
    std::fs::write(&path, body).unwrap();
    path
}

fn minimal_config() -> &'static str {
    r#"{
        "keywords": ["rust safety", "borrow checker"],
        "search_settings": { "results_per_keyword": 5 },
        "output_settings": { "output_dir": "output" }
    }"#
}

#[test]
fn minimal_config_loads_with_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, minimal_config());

    let config = MinerConfig::load(&path).unwrap();

    assert_eq!(config.keywords(), ["rust safety", "borrow checker"]);
    assert_eq!(config.results_per_keyword(), 5);
    assert_eq!(config.max_pages(), 3);
    assert_eq!(config.page_timeout().as_secs(), 30);
    assert!(config.headless());
    assert!(!config.write_csv());
    assert_eq!(config.history_file(), Path::new("data/history.json"));
    assert_eq!(config.exclusions_file(), None);
}

#[test]
fn optional_fields_override_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"{
            "keywords": ["rust"],
            "search_settings": {
                "results_per_keyword": 2,
                "max_pages": 5,
                "page_timeout_secs": 10,
                "headless": false
            },
            "output_settings": {
                "output_dir": "out",
                "write_csv": true,
                "history_file": "state/seen.json"
            },
            "exclusions_file": "exclusions.json"
        }"#,
    );

    let config = MinerConfig::load(&path).unwrap();

    assert_eq!(config.max_pages(), 5);
    assert_eq!(config.page_timeout().as_secs(), 10);
    assert!(!config.headless());
    assert!(config.write_csv());
    assert_eq!(config.history_file(), Path::new("state/seen.json"));
    assert_eq!(config.exclusions_file(), Some(Path::new("exclusions.json")));
}

#[test]
fn missing_file_is_unreadable() {
    let dir = TempDir::new().unwrap();
    let result = MinerConfig::load(&dir.path().join("nope.json"));
    assert!(matches!(result, Err(ConfigError::Unreadable { .. })));
}

#[test]
fn missing_required_field_is_malformed() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"{ "keywords": ["rust"], "search_settings": { "results_per_keyword": 5 } }"#,
    );
    assert!(matches!(
        MinerConfig::load(&path),
        Err(ConfigError::Malformed { .. })
    ));
}

#[test]
fn negative_quota_is_malformed() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"{
            "keywords": ["rust"],
            "search_settings": { "results_per_keyword": -1 },
            "output_settings": { "output_dir": "output" }
        }"#,
    );
    assert!(matches!(
        MinerConfig::load(&path),
        Err(ConfigError::Malformed { .. })
    ));
}

#[test]
fn zero_quota_is_invalid() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"{
            "keywords": ["rust"],
            "search_settings": { "results_per_keyword": 0 },
            "output_settings": { "output_dir": "output" }
        }"#,
    );
    assert!(matches!(
        MinerConfig::load(&path),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn empty_keyword_list_is_invalid() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"{
            "keywords": [],
            "search_settings": { "results_per_keyword": 5 },
            "output_settings": { "output_dir": "output" }
        }"#,
    );
    assert!(matches!(
        MinerConfig::load(&path),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn blank_keyword_is_invalid() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"{
            "keywords": ["rust", "   "],
            "search_settings": { "results_per_keyword": 5 },
            "output_settings": { "output_dir": "output" }
        }"#,
    );
    assert!(matches!(
        MinerConfig::load(&path),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn zero_max_pages_is_invalid() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"{
            "keywords": ["rust"],
            "search_settings": { "results_per_keyword": 5, "max_pages": 0 },
            "output_settings": { "output_dir": "output" }
        }"#,
    );
    assert!(matches!(
        MinerConfig::load(&path),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn exclusion_categories_flatten_into_one_lowercase_set() {
    let dir = TempDir::new().unwrap();
    let exclusions_path = dir.path().join("exclusions.json");
    std::fs::write(
        &exclusions_path,
        r#"{
            "engine-internal": ["webcache.googleusercontent.com"],
            "social": ["Facebook.COM", "twitter.com"],
            "noise": ["twitter.com", ""]
        }"#,
    )
    .unwrap();

    let path = write_config(
        &dir,
        &format!(
            r#"{{
                "keywords": ["rust"],
                "search_settings": {{ "results_per_keyword": 5 }},
                "output_settings": {{ "output_dir": "output" }},
                "exclusions_file": {}
            }}"#,
            serde_json::to_string(&exclusions_path).unwrap()
        ),
    );

    let config = MinerConfig::load(&path).unwrap();
    let exclusions = config.load_exclusions();

    // duplicates and blanks collapse
    assert_eq!(exclusions.len(), 3);
    assert!(exclusions.matches("https://www.FACEBOOK.com/page").is_some());
    assert!(exclusions.matches("https://example.com/post").is_none());
}

#[test]
fn missing_exclusion_file_yields_empty_set() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"{
            "keywords": ["rust"],
            "search_settings": { "results_per_keyword": 5 },
            "output_settings": { "output_dir": "output" },
            "exclusions_file": "does-not-exist.json"
        }"#,
    );

    let config = MinerConfig::load(&path).unwrap();
    assert!(config.load_exclusions().is_empty());
}
