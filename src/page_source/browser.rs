//! Browser lifecycle for the result-page driver.
//!
//! Launches chromiumoxide with a throwaway profile and a tracked event
//! handler task, finds a local Chrome/Chromium first and falls back to a
//! managed download, and keeps one lazily-launched instance alive for the
//! whole run with health checking and crash recovery.

use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::{self, JoinHandle};
use tracing::{debug, info, warn};

/// User agent pinned for result-page sessions.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// A launched browser plus the resources that must die with it: the event
/// handler task and the temp profile directory.
pub struct BrowserHandle {
    browser: Browser,
    handler: JoinHandle<()>,
    user_data_dir: Option<PathBuf>,
}

impl BrowserHandle {
    fn new(browser: Browser, handler: JoinHandle<()>, user_data_dir: PathBuf) -> Self {
        Self {
            browser,
            handler,
            user_data_dir: Some(user_data_dir),
        }
    }

    pub(crate) fn browser(&self) -> &Browser {
        &self.browser
    }

    pub(crate) fn browser_mut(&mut self) -> &mut Browser {
        &mut self.browser
    }

    /// Remove the temp profile. Call only after the browser process has
    /// exited; Chrome keeps files locked until then.
    pub(crate) fn cleanup_profile_dir(&mut self) {
        if let Some(path) = self.user_data_dir.take() {
            debug!(path = %path.display(), "removing browser profile dir");
            if let Err(e) = std::fs::remove_dir_all(&path) {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to remove browser profile dir"
                );
            }
        }
    }
}

impl Drop for BrowserHandle {
    fn drop(&mut self) {
        self.handler.abort();
        if self.user_data_dir.is_some() {
            self.cleanup_profile_dir();
        }
    }
}

/// Lazily-launched shared browser.
///
/// The first page request launches the browser; later requests reuse it
/// after a health check, re-launching if the process died in between.
#[derive(Clone)]
pub struct BrowserManager {
    headless: bool,
    slot: Arc<Mutex<Option<BrowserHandle>>>,
}

impl BrowserManager {
    #[must_use]
    pub fn new(headless: bool) -> Self {
        Self {
            headless,
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Open a fresh blank page on the shared browser, launching or
    /// recovering it first if needed.
    pub async fn page(&self) -> Result<Page> {
        let mut slot = self.slot.lock().await;

        if let Some(handle) = slot.as_ref() {
            match handle.browser().version().await {
                Ok(_) => {
                    let page = handle
                        .browser()
                        .new_page("about:blank")
                        .await
                        .context("failed to open page on running browser")?;
                    return Ok(page);
                }
                Err(e) => {
                    warn!(error = %e, "browser health check failed, relaunching");
                    if let Some(mut dead) = slot.take() {
                        let _ = dead.browser_mut().close().await;
                        let _ = dead.browser_mut().wait().await;
                        dead.cleanup_profile_dir();
                    }
                }
            }
        }

        info!("launching browser");
        let (browser, handler, user_data_dir) = launch_browser(self.headless).await?;
        let handle = BrowserHandle::new(browser, handler, user_data_dir);
        let page = handle
            .browser()
            .new_page("about:blank")
            .await
            .context("failed to open page on freshly launched browser")?;
        *slot = Some(handle);
        Ok(page)
    }

    /// Close the browser process and clean up its profile. Safe to call
    /// repeatedly; later calls are no-ops.
    pub async fn shutdown(&self) -> Result<()> {
        let mut slot = self.slot.lock().await;
        if let Some(mut handle) = slot.take() {
            info!("shutting down browser");
            if let Err(e) = handle.browser_mut().close().await {
                warn!(error = %e, "browser did not close cleanly");
            }
            if let Err(e) = handle.browser_mut().wait().await {
                warn!(error = %e, "failed waiting for browser exit");
            }
            handle.cleanup_profile_dir();
        }
        Ok(())
    }
}

/// Find a local Chrome/Chromium executable.
///
/// `CHROMIUM_PATH` overrides everything; otherwise well-known install
/// locations are probed, then `which` on unix-likes.
async fn find_browser_executable() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("CHROMIUM_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            info!(path = %path.display(), "using browser from CHROMIUM_PATH");
            return Ok(path);
        }
        warn!(
            path = %path.display(),
            "CHROMIUM_PATH points at a missing file, falling back to detection"
        );
    }

    let candidates: Vec<PathBuf> = if cfg!(target_os = "windows") {
        [
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\Chromium\Application\chrome.exe",
        ]
        .into_iter()
        .map(PathBuf::from)
        .collect()
    } else if cfg!(target_os = "macos") {
        let mut paths: Vec<PathBuf> = [
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/opt/homebrew/bin/chromium",
        ]
        .into_iter()
        .map(PathBuf::from)
        .collect();
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join("Applications/Google Chrome.app/Contents/MacOS/Google Chrome"));
        }
        paths
    } else {
        [
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/opt/google/chrome/chrome",
        ]
        .into_iter()
        .map(PathBuf::from)
        .collect()
    };

    for path in candidates {
        if path.exists() {
            info!(path = %path.display(), "found browser executable");
            return Ok(path);
        }
    }

    if !cfg!(target_os = "windows") {
        for name in ["chromium", "chromium-browser", "google-chrome", "chrome"] {
            if let Ok(output) = Command::new("which").arg(name).output()
                && output.status.success()
            {
                let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !found.is_empty() {
                    let path = PathBuf::from(found);
                    info!(path = %path.display(), "found browser via which");
                    return Ok(path);
                }
            }
        }
    }

    Err(anyhow::anyhow!("no Chrome/Chromium executable found"))
}

/// Download a managed Chromium into the user cache and return its
/// executable path. Used when no local browser exists, the way the
/// original setup auto-provisioned its driver.
async fn download_managed_browser() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("resultminer")
        .join("chromium");
    std::fs::create_dir_all(&cache_dir).context("failed to create browser cache directory")?;

    info!(path = %cache_dir.display(), "downloading managed Chromium");
    let fetcher = BrowserFetcher::new(
        BrowserFetcherOptions::builder()
            .with_path(&cache_dir)
            .build()
            .context("failed to build browser fetcher options")?,
    );
    let revision = fetcher
        .fetch()
        .await
        .context("failed to download managed browser")?;

    info!(path = %revision.folder_path.display(), "managed Chromium ready");
    Ok(revision.executable_path)
}

/// Launch a browser with a unique temp profile and automation-hardening
/// flags, returning the browser, its tracked handler task, and the profile
/// directory to remove after shutdown.
async fn launch_browser(headless: bool) -> Result<(Browser, JoinHandle<()>, PathBuf)> {
    let executable = match find_browser_executable().await {
        Ok(path) => path,
        Err(_) => download_managed_browser().await?,
    };

    let user_data_dir =
        std::env::temp_dir().join(format!("resultminer_chrome_{}", std::process::id()));
    std::fs::create_dir_all(&user_data_dir).context("failed to create profile directory")?;

    let mut builder = BrowserConfigBuilder::default()
        .request_timeout(Duration::from_secs(30))
        .window_size(1920, 1080)
        .user_data_dir(user_data_dir.clone())
        .chrome_executable(executable);

    builder = if headless {
        builder.headless_mode(HeadlessMode::default())
    } else {
        builder.with_head()
    };

    builder = builder
        .arg(format!("--user-agent={USER_AGENT}"))
        .arg("--disable-blink-features=AutomationControlled")
        .arg("--no-sandbox")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-gpu")
        .arg("--disable-extensions")
        .arg("--disable-infobars")
        .arg("--disable-notifications")
        .arg("--disable-popup-blocking")
        .arg("--disable-save-password-bubble")
        .arg("--disable-translate")
        .arg("--disable-background-networking")
        .arg("--disable-background-timer-throttling")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--mute-audio")
        .arg("--hide-scrollbars")
        .arg("--password-store=basic")
        .arg("--use-mock-keychain");

    let config = builder
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

    let (browser, mut handler) = Browser::launch(config)
        .await
        .context("failed to launch browser")?;

    let handler_task = task::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                // chromiumoxide logs unknown CDP events as errors; they are
                // noise at this level
                debug!(error = %e, "browser handler event error");
            }
        }
        debug!("browser handler task finished");
    });

    Ok((browser, handler_task, user_data_dir))
}
