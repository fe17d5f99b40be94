//! Durable keyword -> seen-URL ledger.
//!
//! The ledger is the single source of truth for whether a URL has already
//! been reported for a keyword. Every successful [`SeenLedger::record`] is
//! persisted before it returns, so a crash can never lose a commit that a
//! caller already treated as accepted. The store is one JSON file shaped
//! `{ "<keyword>": { "urls": ["...", ...] }, ... }`, rewritten atomically
//! (temp file + rename) on every mutation.
//!
//! A store that cannot be read at startup degrades to an empty ledger. This
//! trades dedup history for availability: the run proceeds and may re-report
//! old URLs, but it never refuses to start over a corrupt history file.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Ledger persistence failures. Reads never fail (they degrade); only the
/// durable-write path surfaces errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to persist ledger to {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize ledger state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// URLs already reported for one keyword, in first-seen order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub urls: Vec<String>,
}

/// Persistent dedup ledger with a single serialized writer.
///
/// All mutations go through one async mutex, so `record` stays safe if
/// keyword pipelines are ever run concurrently against a shared store.
pub struct SeenLedger {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, LedgerEntry>>,
}

impl SeenLedger {
    /// Open a ledger backed by `path`, loading any existing store eagerly.
    ///
    /// An absent store starts empty with its parent directory provisioned.
    /// A corrupt or unreadable store also starts empty, with a warning.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path).await;
        debug!(
            path = %path.display(),
            keywords = entries.len(),
            "ledger opened"
        );
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Whether `url` has already been recorded for `keyword`.
    ///
    /// An absent keyword is an empty entry, not an error.
    pub async fn seen(&self, keyword: &str, url: &str) -> bool {
        let entries = self.entries.lock().await;
        entries
            .get(keyword)
            .is_some_and(|entry| entry.urls.iter().any(|u| u == url))
    }

    /// Record `url` for `keyword` and persist the full store before
    /// returning. Idempotent: an already-present URL is a no-op.
    ///
    /// Returns `true` when the URL was newly recorded. On a persistence
    /// failure the in-memory entry is rolled back and the caller must not
    /// report the URL as accepted.
    pub async fn record(&self, keyword: &str, url: &str) -> Result<bool, LedgerError> {
        let mut entries = self.entries.lock().await;

        let entry = entries.entry(keyword.to_string()).or_default();
        if entry.urls.iter().any(|u| u == url) {
            return Ok(false);
        }
        entry.urls.push(url.to_string());

        if let Err(e) = persist(&self.path, &entries).await {
            if let Some(entry) = entries.get_mut(keyword) {
                entry.urls.pop();
                if entry.urls.is_empty() {
                    entries.remove(keyword);
                }
            }
            return Err(e);
        }

        Ok(true)
    }

    /// Read-only snapshot of the URLs recorded for `keyword`.
    pub async fn entries_for(&self, keyword: &str) -> Vec<String> {
        let entries = self.entries.lock().await;
        entries
            .get(keyword)
            .map(|entry| entry.urls.clone())
            .unwrap_or_default()
    }

    /// Remove one keyword's entry, or every entry, and persist immediately.
    pub async fn clear(&self, keyword: Option<&str>) -> Result<(), LedgerError> {
        let mut entries = self.entries.lock().await;
        let backup = entries.clone();
        match keyword {
            Some(keyword) => {
                entries.remove(keyword);
            }
            None => entries.clear(),
        }
        if let Err(e) = persist(&self.path, &entries).await {
            *entries = backup;
            return Err(e);
        }
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn load_entries(path: &Path) -> BTreeMap<String, LedgerEntry> {
    match tokio::fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "ledger store is corrupt, starting with an empty ledger"
                );
                BTreeMap::new()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    warn!(
                        path = %parent.display(),
                        error = %e,
                        "could not provision ledger directory"
                    );
                }
            }
            BTreeMap::new()
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "ledger store is unreadable, starting with an empty ledger"
            );
            BTreeMap::new()
        }
    }
}

/// Atomically rewrite the store: serialize, write to a temp file in the same
/// directory, then rename over the target so readers never observe a partial
/// store.
async fn persist(path: &Path, entries: &BTreeMap<String, LedgerEntry>) -> Result<(), LedgerError> {
    let body = serde_json::to_string_pretty(entries)?;
    let target = path.to_path_buf();
    let store_path = target.clone();

    let io = move || -> std::io::Result<()> {
        let parent = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;
        let mut temp = NamedTempFile::new_in(&parent)?;
        temp.write_all(body.as_bytes())?;
        temp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    };

    match tokio::task::spawn_blocking(io).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(LedgerError::Persist {
            path: store_path,
            source,
        }),
        Err(join) => Err(LedgerError::Persist {
            path: store_path,
            source: std::io::Error::other(join),
        }),
    }
}
