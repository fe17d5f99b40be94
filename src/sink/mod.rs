//! Persists accepted batches as per-keyword artifacts.
//!
//! One JSON document per keyword per run, named `{timestamp}_{keyword}`,
//! plus an optional flattened CSV with one row per result. Batches are
//! written atomically (temp file + rename) and are never modified after.
//! A sink failure does not roll back ledger commits: accepted URLs stay
//! seen even when their artifact failed to write.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{info, warn};

use crate::discovery::{AcceptedResult, DiscoveryOutcome};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write artifact {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize batch for '{keyword}': {source}")]
    Serialize {
        keyword: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Persisted batch shape, matching the historical artifact format.
#[derive(Debug, Serialize)]
struct BatchDocument<'a> {
    keyword: &'a str,
    date: &'a str,
    results: &'a [AcceptedResult],
}

/// Writes one artifact set per keyword per run.
pub struct ResultSink {
    output_dir: PathBuf,
    write_csv: bool,
}

impl ResultSink {
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, write_csv: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            write_csv,
        }
    }

    /// Persist one keyword's batch, returning the paths written.
    ///
    /// An empty batch writes nothing and returns an empty list.
    pub async fn save(&self, outcome: &DiscoveryOutcome) -> Result<Vec<PathBuf>, SinkError> {
        if outcome.accepted.is_empty() {
            warn!(keyword = %outcome.keyword, "no new results to save");
            return Ok(Vec::new());
        }

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| SinkError::CreateDir {
                path: self.output_dir.clone(),
                source,
            })?;

        let date = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
        let stem = format!("{date}_{}", file_stem(&outcome.keyword));
        let mut written = Vec::new();

        let document = BatchDocument {
            keyword: &outcome.keyword,
            date: &date,
            results: &outcome.accepted,
        };
        let body =
            serde_json::to_string_pretty(&document).map_err(|source| SinkError::Serialize {
                keyword: outcome.keyword.clone(),
                source,
            })?;

        let json_path = self.output_dir.join(format!("{stem}.json"));
        write_atomic(&json_path, body.into_bytes()).await?;
        info!(
            keyword = %outcome.keyword,
            path = %json_path.display(),
            results = outcome.accepted.len(),
            "results saved"
        );
        written.push(json_path);

        if self.write_csv {
            let csv_path = self.output_dir.join(format!("{stem}.csv"));
            let body = csv_body(&outcome.keyword, &date, &outcome.accepted);
            write_atomic(&csv_path, body.into_bytes()).await?;
            info!(
                keyword = %outcome.keyword,
                path = %csv_path.display(),
                "flattened rows saved"
            );
            written.push(csv_path);
        }

        Ok(written)
    }
}

/// Keyword-derived filename fragment: spaces become underscores, anything
/// the filesystem could choke on is stripped.
fn file_stem(keyword: &str) -> String {
    sanitize_filename::sanitize(keyword.replace(' ', "_"))
}

fn csv_body(keyword: &str, date: &str, results: &[AcceptedResult]) -> String {
    let mut out = String::from("keyword,date,title,url\n");
    for result in results {
        out.push_str(&csv_field(keyword));
        out.push(',');
        out.push_str(&csv_field(date));
        out.push(',');
        out.push_str(&csv_field(&result.title));
        out.push(',');
        out.push_str(&csv_field(&result.url));
        out.push('\n');
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Write-then-rename so readers never observe a partial artifact.
async fn write_atomic(path: &Path, bytes: Vec<u8>) -> Result<(), SinkError> {
    let target = path.to_path_buf();
    let reported = target.clone();

    let io = move || -> std::io::Result<()> {
        let parent = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(&bytes)?;
        temp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    };

    match tokio::task::spawn_blocking(io).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(SinkError::Write {
            path: reported,
            source,
        }),
        Err(join) => Err(SinkError::Write {
            path: reported,
            source: std::io::Error::other(join),
        }),
    }
}
