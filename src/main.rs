use std::path::Path;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use resultminer::config::DEFAULT_CONFIG_PATH;
use resultminer::{MineEngine, MinerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // the only CLI surface: an optional config path
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = MinerConfig::load(Path::new(&config_path))
        .with_context(|| format!("failed to load configuration from {config_path}"))?;

    let engine = MineEngine::new(config).await;

    let cancel = engine.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("shutdown requested, stopping before the next page fetch");
            cancel.store(true, Ordering::Relaxed);
        }
    });

    let summary = engine.run().await?;
    info!(
        keywords = summary.keywords.len(),
        new_results = summary.total_accepted(),
        "run finished"
    );
    Ok(())
}
