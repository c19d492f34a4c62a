pub mod chromium;
#[cfg(test)]
pub mod fake;
pub mod user_agents;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub use chromium::ChromiumLauncher;
pub use user_agents::UserAgentPool;

/// Starts isolated browser sessions. Each call must return a session that
/// shares no cookies, storage or process with any other.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    type Session: PageSession + 'static;

    async fn open(&self, user_agent: &str) -> Result<Self::Session>;
}

/// The page operations the scraper needs from one browser session.
///
/// "Absent" is not an error: waits and clicks return `Ok(false)` and reads
/// return `Ok(None)` when the element never shows up.
#[async_trait]
pub trait PageSession: Send {
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Click the first element whose text is exactly `text`.
    async fn click_text(&mut self, text: &str, timeout: Duration) -> Result<bool>;

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<bool>;

    /// Inner text of the first `child` match under the first `parent` match.
    async fn child_text(&mut self, parent: &str, child: &str) -> Result<Option<String>>;

    async fn screenshot(&mut self, path: &Path) -> Result<()>;

    /// Close the browser. Safe to call more than once.
    async fn release(&mut self) -> Result<()>;
}
