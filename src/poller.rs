use tracing::{error, info};

use crate::browser::{BrowserLauncher, UserAgentPool};
use crate::config::Config;
use crate::pipeline::run_cycle;
use crate::sheets::SheetStore;

/// Runs a sync cycle, sleeps the configured interval, repeats. Stops only
/// when the process does.
pub struct Poller<S, L> {
    cfg: Config,
    store: S,
    launcher: L,
    agents: UserAgentPool,
}

impl<S: SheetStore, L: BrowserLauncher> Poller<S, L> {
    pub fn new(cfg: Config, store: S, launcher: L, agents: UserAgentPool) -> Self {
        Self {
            cfg,
            store,
            launcher,
            agents,
        }
    }

    pub async fn run(self) {
        loop {
            self.tick().await;
            info!("Sleeping {} seconds", self.cfg.poll_interval.as_secs());
            tokio::time::sleep(self.cfg.poll_interval).await;
        }
    }

    async fn tick(&self) {
        info!("Starting..");
        match run_cycle(&self.cfg, &self.store, &self.launcher, &self.agents).await {
            Ok(report) => info!(
                scanned = report.rows_scanned,
                skipped = report.rows_skipped,
                found = report.found,
                empty = report.empty,
                written = report.written,
                batches = report.batch_sizes.len(),
                "Cycle complete: {} of {} dispatched rows written",
                report.written,
                report.rows_dispatched,
            ),
            Err(e) => error!("Error in sync cycle: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::{FakeLauncher, PageScript};
    use crate::config::test_config;
    use crate::sheets::fake::MemorySheet;

    #[tokio::test]
    async fn failed_cycle_does_not_stop_the_poller() {
        let poller = Poller::new(
            test_config(),
            MemorySheet::failing_reads(),
            FakeLauncher::default(),
            UserAgentPool::fixed(&["ua"]),
        );
        poller.tick().await;
        poller.tick().await;
        // both ticks returned; neither got far enough to open a browser
        assert!(poller.launcher.events().is_empty());
        assert!(poller.store.batch_calls().is_empty());
    }

    #[tokio::test]
    async fn each_tick_rescans_the_table() {
        let poller = Poller::new(
            test_config(),
            MemorySheet::with_rows(&[&["sol", "addrA"]]),
            FakeLauncher::new(&[("addrA", PageScript::priced("$1"))]),
            UserAgentPool::fixed(&["ua"]),
        );
        poller.tick().await;
        poller.tick().await;
        assert_eq!(poller.store.batch_calls().len(), 2);
        assert_eq!(poller.launcher.count("release:"), 2);
    }
}
