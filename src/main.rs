mod browser;
mod config;
mod error;
mod pipeline;
mod poller;
mod price;
mod scraper;
mod sheets;
mod types;

use std::path::Path;
use std::time::Duration;

use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::browser::{ChromiumLauncher, UserAgentPool};
use crate::config::{Config, HTTP_TIMEOUT_SECS};
use crate::error::Result;
use crate::poller::Poller;
use crate::sheets::{GoogleSheetsClient, ServiceAccountAuth};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    // Dropping the guard flushes and stops the file writer.
    let _log_guard = init_tracing(&cfg.log_level, &cfg.log_file);

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

/// Stdout plus an append-only plain-text log file.
fn init_tracing(level: &str, log_file: &Path) -> WorkerGuard {
    let dir = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = log_file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "logging.log".into());

    let (file_writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    tracing_subscriber::registry()
        .with(EnvFilter::new(level))
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    guard
}

async fn run(cfg: Config) -> Result<()> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()?;

    let auth = ServiceAccountAuth::from_file(&cfg.credentials_path, &cfg.scopes, http.clone()).await?;
    let store = GoogleSheetsClient::new(http, &cfg.spreadsheet_id, auth)?;
    let launcher = ChromiumLauncher::new(cfg.chromium_path.clone());
    let agents = UserAgentPool::generate(cfg.user_agent_pool_size);

    info!(
        "Syncing sheet '{}' from row {} every {}s ({} concurrent, {} user agents)",
        cfg.sheet_name,
        cfg.start_row,
        cfg.poll_interval.as_secs(),
        cfg.max_concurrent_tasks,
        agents.len(),
    );

    Poller::new(cfg, store, launcher, agents).run().await;
    Ok(())
}
