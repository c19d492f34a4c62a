use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

use super::{BrowserLauncher, PageSession};
use crate::config::{ELEMENT_POLL_INTERVAL, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};
use crate::error::{AppError, Result};

/// Launches one headless Chromium process per session, each with its own
/// temporary profile directory.
pub struct ChromiumLauncher {
    executable: Option<PathBuf>,
    profile_root: PathBuf,
    next_id: AtomicU64,
}

impl ChromiumLauncher {
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self::with_profile_root(executable, std::env::temp_dir())
    }

    pub fn with_profile_root(executable: Option<PathBuf>, profile_root: PathBuf) -> Self {
        Self {
            executable,
            profile_root,
            next_id: AtomicU64::new(0),
        }
    }

    fn profile_dir(&self) -> PathBuf {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.profile_root
            .join(format!("price_sync_{}_{id}", std::process::id()))
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    type Session = ChromiumSession;

    async fn open(&self, user_agent: &str) -> Result<ChromiumSession> {
        let profile_dir = self.profile_dir();

        let mut builder = BrowserConfig::builder()
            .request_timeout(Duration::from_secs(30))
            .window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT)
            .viewport(Viewport {
                width: VIEWPORT_WIDTH,
                height: VIEWPORT_HEIGHT,
                ..Default::default()
            })
            .user_data_dir(&profile_dir)
            .arg(format!("--user-agent={user_agent}"))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-notifications")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox")
            .arg("--mute-audio");
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        // Executable detection happens here; fail before anything touches disk.
        let config = builder.build().map_err(AppError::Launch)?;
        tokio::fs::create_dir_all(&profile_dir).await?;

        let (browser, mut handler) = match Browser::launch(config).await {
            Ok(pair) => pair,
            Err(e) => {
                let _ = tokio::fs::remove_dir_all(&profile_dir).await;
                return Err(e.into());
            }
        };

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    let msg = e.to_string();
                    // chromiumoxide does not know every CDP event Chrome emits
                    if msg.contains("data did not match any variant")
                        || msg.contains("Failed to deserialize WS response")
                    {
                        trace!("Ignored CDP decode error: {msg}");
                    } else {
                        error!("Browser handler error: {msg}");
                    }
                }
            }
            debug!("Browser handler finished");
        });

        let page = browser.new_page("about:blank").await;
        let mut session = ChromiumSession {
            browser: Some(browser),
            page: None,
            handler_task: Some(handler_task),
            profile_dir,
        };

        match page {
            Ok(page) => {
                session.page = Some(page);
                Ok(session)
            }
            Err(e) => {
                if let Err(close_err) = session.release().await {
                    warn!("Failed to release browser after page error: {close_err}");
                }
                Err(e.into())
            }
        }
    }
}

pub struct ChromiumSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: Option<JoinHandle<()>>,
    profile_dir: PathBuf,
}

impl ChromiumSession {
    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| AppError::Launch("session already released".to_string()))
    }
}

#[async_trait]
impl PageSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.page()?.goto(url).await?;
        Ok(())
    }

    async fn click_text(&mut self, text: &str, timeout: Duration) -> Result<bool> {
        let page = self.page()?;
        let xpath = format!("//*[normalize-space(text())='{text}']");
        let start = Instant::now();
        loop {
            if let Ok(element) = page.find_xpath(xpath.as_str()).await {
                element.click().await?;
                return Ok(true);
            }
            if start.elapsed() >= timeout {
                return Ok(false);
            }
            tokio::time::sleep(ELEMENT_POLL_INTERVAL).await;
        }
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<bool> {
        let page = self.page()?;
        let start = Instant::now();
        loop {
            if page.find_element(selector).await.is_ok() {
                debug!("{selector} appeared after {:?}", start.elapsed());
                return Ok(true);
            }
            if start.elapsed() >= timeout {
                return Ok(false);
            }
            tokio::time::sleep(ELEMENT_POLL_INTERVAL).await;
        }
    }

    async fn child_text(&mut self, parent: &str, child: &str) -> Result<Option<String>> {
        let Ok(parent) = self.page()?.find_element(parent).await else {
            return Ok(None);
        };
        let Ok(child) = parent.find_element(child).await else {
            return Ok(None);
        };
        Ok(child.inner_text().await?)
    }

    async fn screenshot(&mut self, path: &Path) -> Result<()> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Jpeg)
            .full_page(true)
            .build();
        self.page()?.save_screenshot(params, path).await?;
        Ok(())
    }

    async fn release(&mut self) -> Result<()> {
        self.page = None;
        let mut result = Ok(());

        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                result = Err(AppError::from(e));
            }
            if let Err(e) = browser.wait().await {
                warn!("Waiting for browser exit failed: {e}");
            }
        }
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
        if let Err(e) = tokio::fs::remove_dir_all(&self.profile_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove profile dir {}: {e}", self.profile_dir.display());
            }
        }

        result
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
    }
}
