//! Configuration structs and validation.
//!
//! The config file is plain JSON. Required fields are the keyword list, the
//! per-keyword quota, and the output directory; everything else has defaults.
//! Validation runs once in [`MinerConfig::load`], before any ledger or
//! browser I/O happens, so a bad config never leaves half-done work behind.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::exclusions::ExclusionSet;

/// Config file used when no path argument is given.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Page-walk ceiling per keyword. Keeps worst-case cost at a small constant.
const DEFAULT_MAX_PAGES: usize = 3;

/// Per-page fetch timeout in seconds.
const DEFAULT_PAGE_TIMEOUT_SECS: u64 = 30;

const DEFAULT_HISTORY_FILE: &str = "data/history.json";

/// Fatal, pre-run configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config file {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinerConfig {
    pub(crate) keywords: Vec<String>,
    pub(crate) search_settings: SearchSettings,
    pub(crate) output_settings: OutputSettings,

    /// Optional JSON file mapping exclusion category -> domain substrings.
    #[serde(default)]
    pub(crate) exclusions_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// How many *new* results to collect per keyword before stopping.
    pub(crate) results_per_keyword: usize,

    #[serde(default = "default_max_pages")]
    pub(crate) max_pages: usize,

    #[serde(default = "default_page_timeout_secs")]
    pub(crate) page_timeout_secs: u64,

    #[serde(default = "default_headless")]
    pub(crate) headless: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    pub(crate) output_dir: PathBuf,

    /// Also emit a flattened row-per-result CSV next to each JSON batch.
    #[serde(default)]
    pub(crate) write_csv: bool,

    #[serde(default = "default_history_file")]
    pub(crate) history_file: PathBuf,
}

fn default_max_pages() -> usize {
    DEFAULT_MAX_PAGES
}

fn default_page_timeout_secs() -> u64 {
    DEFAULT_PAGE_TIMEOUT_SECS
}

fn default_headless() -> bool {
    true
}

fn default_history_file() -> PathBuf {
    PathBuf::from(DEFAULT_HISTORY_FILE)
}

impl MinerConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.keywords.is_empty() {
            return Err(ConfigError::Invalid("keywords must not be empty".into()));
        }
        if self.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "keywords must not contain blank entries".into(),
            ));
        }
        if self.search_settings.results_per_keyword == 0 {
            return Err(ConfigError::Invalid(
                "search_settings.results_per_keyword must be at least 1".into(),
            ));
        }
        if self.search_settings.max_pages == 0 {
            return Err(ConfigError::Invalid(
                "search_settings.max_pages must be at least 1".into(),
            ));
        }
        if self.search_settings.page_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "search_settings.page_timeout_secs must be at least 1".into(),
            ));
        }
        if self.output_settings.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "output_settings.output_dir must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Flatten the configured exclusion file into one set.
    ///
    /// A missing or unreadable file yields an empty set (logged), not an
    /// error: exclusions are an optional refinement, never a reason to skip
    /// the run.
    #[must_use]
    pub fn load_exclusions(&self) -> ExclusionSet {
        match &self.exclusions_file {
            Some(path) => ExclusionSet::load(path),
            None => ExclusionSet::default(),
        }
    }

    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    #[must_use]
    pub fn results_per_keyword(&self) -> usize {
        self.search_settings.results_per_keyword
    }

    #[must_use]
    pub fn max_pages(&self) -> usize {
        self.search_settings.max_pages
    }

    #[must_use]
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.search_settings.page_timeout_secs)
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.search_settings.headless
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_settings.output_dir
    }

    #[must_use]
    pub fn write_csv(&self) -> bool {
        self.output_settings.write_csv
    }

    #[must_use]
    pub fn history_file(&self) -> &Path {
        &self.output_settings.history_file
    }

    #[must_use]
    pub fn exclusions_file(&self) -> Option<&Path> {
        self.exclusions_file.as_deref()
    }
}
