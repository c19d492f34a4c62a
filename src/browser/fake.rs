//! Scripted in-memory browser for tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{BrowserLauncher, PageSession};
use crate::error::{AppError, Result};

/// How a fake page behaves once navigated to.
#[derive(Debug, Clone, Default)]
pub struct PageScript {
    pub nav_error: bool,
    pub nav_delay: Duration,
    pub consent_popup: bool,
    pub container: bool,
    pub child_text: Option<String>,
    pub screenshot_fails: bool,
}

impl PageScript {
    pub fn priced(text: &str) -> Self {
        Self {
            container: true,
            child_text: Some(text.to_string()),
            ..Default::default()
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeLauncher {
    scripts: Arc<HashMap<String, PageScript>>,
    fail_open: bool,
    events: Arc<Mutex<Vec<String>>>,
}

impl FakeLauncher {
    /// Scripts are keyed by the last path segment of the URL (the address).
    pub fn new(scripts: &[(&str, PageScript)]) -> Self {
        Self {
            scripts: Arc::new(
                scripts
                    .iter()
                    .map(|(addr, s)| (addr.to_string(), s.clone()))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    pub fn failing_open() -> Self {
        Self {
            fail_open: true,
            ..Default::default()
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    type Session = FakeSession;

    async fn open(&self, user_agent: &str) -> Result<FakeSession> {
        self.events.lock().unwrap().push(format!("open:{user_agent}"));
        if self.fail_open {
            return Err(AppError::Launch("no chromium".to_string()));
        }
        Ok(FakeSession {
            scripts: Arc::clone(&self.scripts),
            script: PageScript::default(),
            address: String::new(),
            events: Arc::clone(&self.events),
        })
    }
}

pub struct FakeSession {
    scripts: Arc<HashMap<String, PageScript>>,
    script: PageScript,
    address: String,
    events: Arc<Mutex<Vec<String>>>,
}

impl FakeSession {
    fn log(&self, event: &str) {
        self.events
            .lock()
            .unwrap()
            .push(format!("{event}:{}", self.address));
    }
}

#[async_trait]
impl PageSession for FakeSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.address = url.rsplit('/').next().unwrap_or_default().to_string();
        self.script = self.scripts.get(&self.address).cloned().unwrap_or_default();
        self.log("nav_start");
        if !self.script.nav_delay.is_zero() {
            tokio::time::sleep(self.script.nav_delay).await;
        }
        self.log("nav_end");
        if self.script.nav_error {
            return Err(AppError::Launch("net::ERR_CONNECTION_RESET".to_string()));
        }
        Ok(())
    }

    async fn click_text(&mut self, _text: &str, _timeout: Duration) -> Result<bool> {
        if self.script.consent_popup {
            self.log("consent");
        }
        Ok(self.script.consent_popup)
    }

    async fn wait_for_selector(&mut self, _selector: &str, _timeout: Duration) -> Result<bool> {
        Ok(self.script.container)
    }

    async fn child_text(&mut self, _parent: &str, _child: &str) -> Result<Option<String>> {
        Ok(self.script.child_text.clone())
    }

    async fn screenshot(&mut self, _path: &Path) -> Result<()> {
        self.log("screenshot");
        if self.script.screenshot_fails {
            return Err(AppError::Io(std::io::Error::other("disk full")));
        }
        Ok(())
    }

    async fn release(&mut self) -> Result<()> {
        self.log("release");
        Ok(())
    }
}
