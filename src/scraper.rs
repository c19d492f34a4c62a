use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::Rng;
use tracing::{error, info, warn};

use crate::browser::{BrowserLauncher, PageSession, UserAgentPool};
use crate::config::{selectors, Config, CONSENT_CLICK_TIMEOUT, PRICE_WAIT_TIMEOUT};
use crate::error::{AppError, Result};
use crate::price::decode_price;
use crate::types::ScrapeOutcome;

/// Owns one browser session for the duration of a scrape. `close` runs the
/// screenshot-then-release finalizer in place. If the scope is dropped
/// unclosed (cancelled future, panic) `Drop` spawns the same finalizer.
pub struct SessionScope<S: PageSession + 'static> {
    session: Option<S>,
    screenshot_path: PathBuf,
}

impl<S: PageSession + 'static> SessionScope<S> {
    pub fn new(session: S, screenshot_path: &Path) -> Self {
        Self {
            session: Some(session),
            screenshot_path: screenshot_path.to_path_buf(),
        }
    }

    pub fn page(&mut self) -> Result<&mut S> {
        self.session
            .as_mut()
            .ok_or_else(|| AppError::Launch("session already released".to_string()))
    }

    pub async fn close(mut self) {
        if let Some(session) = self.session.take() {
            finalize(session, &self.screenshot_path).await;
        }
    }
}

impl<S: PageSession + 'static> Drop for SessionScope<S> {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        warn!("Browser session dropped before close, releasing in background");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let path = self.screenshot_path.clone();
                handle.spawn(async move { finalize(session, &path).await });
            }
            Err(_) => error!("No runtime left to release browser session"),
        }
    }
}

/// Screenshot (best-effort) then release. Neither failure propagates.
async fn finalize<S: PageSession>(mut session: S, screenshot_path: &Path) {
    match session.screenshot(screenshot_path).await {
        Ok(()) => info!("Screenshot saved at {}", screenshot_path.display()),
        Err(e) => error!("Error saving screenshot: {e}"),
    }
    if let Err(e) = session.release().await {
        error!("Error releasing browser session: {e}");
    }
}

/// Drives one isolated browser session per token page.
pub struct PageScraper<'a, L: BrowserLauncher> {
    cfg: &'a Config,
    launcher: &'a L,
    agents: &'a UserAgentPool,
}

impl<'a, L: BrowserLauncher> PageScraper<'a, L> {
    pub fn new(cfg: &'a Config, launcher: &'a L, agents: &'a UserAgentPool) -> Self {
        Self { cfg, launcher, agents }
    }

    /// Never fails: every error is logged and becomes `ScrapeOutcome::Empty`.
    pub async fn scrape(&self, row: usize, network: &str, address: &str) -> ScrapeOutcome {
        let url = self.cfg.token_url(address);
        info!(row, network, address, "Processing row {row}");

        let user_agent = self.agents.pick().to_string();
        let session = match self.launcher.open(&user_agent).await {
            Ok(s) => s,
            Err(e) => {
                error!(row, "Error scraping row {row}: {e}");
                return ScrapeOutcome::Empty;
            }
        };

        let mut scope = SessionScope::new(session, &self.cfg.screenshot_path);
        let interaction = self.read_raw_price(&mut scope, &url).await;
        scope.close().await;

        match interaction {
            Ok(Some(raw)) => {
                let price_text = decode_price(&raw);
                info!(row, url = %url, "Price for row {row}: {price_text}");
                ScrapeOutcome::Found {
                    price_text,
                    source_url: url,
                }
            }
            Ok(None) => ScrapeOutcome::Empty,
            Err(e) => {
                error!(row, url = %url, "An error occurred: {e}");
                ScrapeOutcome::Empty
            }
        }
    }

    /// Navigate, settle, dismiss the consent popup, then read the price text.
    /// `Ok(None)` when the page rendered without a price.
    async fn read_raw_price(
        &self,
        scope: &mut SessionScope<L::Session>,
        url: &str,
    ) -> Result<Option<String>> {
        let page = scope.page()?;
        page.navigate(url).await?;
        tokio::time::sleep(self.settle_delay()).await;

        if page
            .click_text(selectors::CONSENT_BUTTON_TEXT, CONSENT_CLICK_TIMEOUT)
            .await?
        {
            info!("Pop-up appeared and 'Got it' button was clicked.");
        } else {
            info!("Pop-up did not appear or 'Got it' button was not found.");
        }

        if !page
            .wait_for_selector(selectors::PRICE_CONTAINER, PRICE_WAIT_TIMEOUT)
            .await?
        {
            warn!("Price container {} not found.", selectors::PRICE_CONTAINER);
            return Ok(None);
        }

        let Some(raw) = page
            .child_text(selectors::PRICE_CONTAINER, selectors::PRICE_CHILD)
            .await?
        else {
            warn!("Price element (first child) not found.");
            return Ok(None);
        };

        info!("Raw price text: {raw}");
        Ok(Some(raw))
    }

    fn settle_delay(&self) -> Duration {
        let (min, max) = (self.cfg.settle_min, self.cfg.settle_max);
        if max <= min {
            return min;
        }
        let secs = rand::rng().random_range(min.as_secs_f64()..=max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}
