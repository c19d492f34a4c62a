use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, Result};

pub const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
pub const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const SCRAPE_BASE_URL: &str = "https://gmgn.ai";

/// Target columns for a row update. Fixed by convention, not runtime config.
pub mod columns {
    pub const PRICE: &str = "E";
    pub const URL: &str = "F";
    pub const UPDATED: &str = "T";
}

/// Page selectors for the token page.
pub mod selectors {
    /// Consent interstitial. Matched by exact text, not CSS.
    pub const CONSENT_BUTTON_TEXT: &str = "Got it";
    pub const PRICE_CONTAINER: &str = ".css-1lqrh8c";
    pub const PRICE_CHILD: &str = "div:first-child";
}

/// Timeout for the optional consent click.
pub const CONSENT_CLICK_TIMEOUT: Duration = Duration::from_millis(5000);

/// Timeout for the price container to render.
pub const PRICE_WAIT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Poll interval used while waiting for an element to appear.
pub const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Fixed browser viewport.
pub const VIEWPORT_WIDTH: u32 = 1920;
pub const VIEWPORT_HEIGHT: u32 = 1080;

/// Timeout on every Sheets / OAuth HTTP request.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Refresh the cached access token this many seconds before it expires.
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

const REQUIRED_VARS: &[&str] = &["SPREADSHEET_ID", "GOOGLE_SERVICE_ACCOUNT_KEY"];

#[derive(Debug, Clone)]
pub struct Config {
    pub spreadsheet_id: String,
    /// Service-account key file (GOOGLE_SERVICE_ACCOUNT_KEY)
    pub credentials_path: PathBuf,
    /// OAuth scopes (GOOGLE_SHEETS_SCOPES, comma-separated)
    pub scopes: Vec<String>,
    /// Rows per lock-step batch (MAX_CONCURRENT_TASKS)
    pub max_concurrent_tasks: usize,
    pub sheet_name: String,
    /// 1-based row where scanning starts (START_ROW)
    pub start_row: usize,
    /// Pause between cycles (SLEEP_INTERVAL, seconds)
    pub poll_interval: Duration,
    /// Shared by every session, so concurrent rows overwrite one another.
    /// Only the last capture is meant to survive.
    pub screenshot_path: PathBuf,
    pub log_level: String,
    pub log_file: PathBuf,
    pub scrape_base_url: String,
    /// Path segment between base URL and `/token/` (SCRAPE_NETWORK_SEGMENT)
    pub network_segment: String,
    /// Number of user agents generated at startup (USER_AGENT_POOL_SIZE)
    pub user_agent_pool_size: usize,
    pub chromium_path: Option<PathBuf>,
    /// Post-navigation settle delay bounds, sampled uniformly.
    pub settle_min: Duration,
    pub settle_max: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|key| get(*key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::Config(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let max_concurrent_tasks = parse_or(&get, "MAX_CONCURRENT_TASKS", 5usize)?;
        if max_concurrent_tasks == 0 {
            return Err(AppError::Config(
                "MAX_CONCURRENT_TASKS must be at least 1".to_string(),
            ));
        }
        let start_row = parse_or(&get, "START_ROW", 142usize)?;
        if start_row == 0 {
            return Err(AppError::Config("START_ROW is 1-based and must be at least 1".to_string()));
        }

        Ok(Self {
            spreadsheet_id: get("SPREADSHEET_ID").unwrap_or_default(),
            credentials_path: PathBuf::from(get("GOOGLE_SERVICE_ACCOUNT_KEY").unwrap_or_default()),
            scopes: get("GOOGLE_SHEETS_SCOPES")
                .unwrap_or_else(|| DEFAULT_SCOPE.to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            max_concurrent_tasks,
            sheet_name: get("SHEET_NAME").unwrap_or_else(|| "General".to_string()),
            start_row,
            poll_interval: Duration::from_secs(parse_or(&get, "SLEEP_INTERVAL", 60u64)?),
            screenshot_path: PathBuf::from(
                get("SCREENSHOT_PATH").unwrap_or_else(|| "last.jpg".to_string()),
            ),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_file: PathBuf::from(get("LOG_FILE").unwrap_or_else(|| "logging.log".to_string())),
            scrape_base_url: get("SCRAPE_BASE_URL")
                .unwrap_or_else(|| SCRAPE_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            network_segment: get("SCRAPE_NETWORK_SEGMENT").unwrap_or_else(|| "sol".to_string()),
            user_agent_pool_size: parse_or(&get, "USER_AGENT_POOL_SIZE", 10usize)?.max(1),
            chromium_path: get("CHROMIUM_PATH").map(PathBuf::from),
            settle_min: Duration::from_secs(2),
            settle_max: Duration::from_secs(5),
        })
    }

    /// `<base>/<network-segment>/token/<address>`
    pub fn token_url(&self, address: &str) -> String {
        format!(
            "{}/{}/token/{}",
            self.scrape_base_url, self.network_segment, address
        )
    }
}

fn parse_or<G, T>(get: &G, key: &str, default: T) -> Result<T>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{key} must be a valid number, got {raw:?}"))),
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        spreadsheet_id: "sheet-id".to_string(),
        credentials_path: PathBuf::from("key.json"),
        scopes: vec![DEFAULT_SCOPE.to_string()],
        max_concurrent_tasks: 2,
        sheet_name: "General".to_string(),
        start_row: 1,
        poll_interval: Duration::from_secs(60),
        screenshot_path: PathBuf::from("last.jpg"),
        log_level: "info".to_string(),
        log_file: PathBuf::from("logging.log"),
        scrape_base_url: SCRAPE_BASE_URL.to_string(),
        network_segment: "sol".to_string(),
        user_agent_pool_size: 3,
        chromium_path: None,
        settle_min: Duration::ZERO,
        settle_max: Duration::ZERO,
    }
}
