pub mod batch;
pub mod row;

use tracing::info;

use crate::browser::{BrowserLauncher, UserAgentPool};
use crate::config::Config;
use crate::error::Result;
use crate::scraper::PageScraper;
use crate::sheets::{SheetStore, SheetWriter};
use crate::types::CycleReport;

pub use batch::run_batches;
pub use row::RowProcessor;

/// One full read → scrape → write pass over the sheet. Sheet transport
/// errors abort the pass; scrape failures only skip their row.
pub async fn run_cycle<S, L>(
    cfg: &Config,
    store: &S,
    launcher: &L,
    agents: &UserAgentPool,
) -> Result<CycleReport>
where
    S: SheetStore,
    L: BrowserLauncher,
{
    let values = store.get(&cfg.sheet_name).await?;
    if values.is_empty() {
        info!("No data found.");
        return Ok(CycleReport::default());
    }

    let processor = RowProcessor::new(PageScraper::new(cfg, launcher, agents));
    let writer = SheetWriter::new(store, &cfg.sheet_name);

    run_batches(&values, cfg.start_row, cfg.max_concurrent_tasks, |row| {
        let processor = &processor;
        let writer = &writer;
        async move {
            let outcome = processor.process(&row).await;
            writer.write(row.number, &outcome).await?;
            Ok(outcome)
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::{FakeLauncher, PageScript};
    use crate::config::test_config;
    use crate::sheets::fake::MemorySheet;

    fn agents() -> UserAgentPool {
        UserAgentPool::fixed(&["ua-1", "ua-2"])
    }

    #[tokio::test]
    async fn scrape_error_mid_navigation_skips_only_that_row() {
        let cfg = test_config();
        let sheet = MemorySheet::with_rows(&[
            &["sol", "addrA"],
            &["sol", "addrBroken"],
            &["sol", "addrC"],
        ]);
        let launcher = FakeLauncher::new(&[
            ("addrA", PageScript::priced("$0.0₅8372")),
            (
                "addrBroken",
                PageScript {
                    nav_error: true,
                    ..Default::default()
                },
            ),
            ("addrC", PageScript::priced("$1.23")),
        ]);

        let report = run_cycle(&cfg, &sheet, &launcher, &agents()).await.unwrap();

        assert_eq!(report.found, 2);
        assert_eq!(report.empty, 1);
        assert_eq!(report.written, 2);
        assert_eq!(report.batch_sizes, vec![2, 1]);

        let ranges = sheet.written_ranges();
        assert!(ranges.contains(&"'General'!E1".to_string()));
        assert!(ranges.contains(&"'General'!E3".to_string()));
        assert!(!ranges.iter().any(|r| r.ends_with("E2") || r.ends_with("F2")));

        let calls = sheet.batch_calls();
        let row1 = calls.iter().find(|c| c[0].range == "'General'!E1").unwrap();
        assert_eq!(row1[0].values[0][0], "$0.00000058372");
        assert_eq!(row1[1].values[0][0], "https://gmgn.ai/sol/token/addrA");

        // every opened session was released
        assert_eq!(launcher.count("open:"), 3);
        assert_eq!(launcher.count("release:"), 3);
    }

    #[tokio::test]
    async fn starts_from_configured_row() {
        let mut cfg = test_config();
        cfg.start_row = 2;
        let sheet = MemorySheet::with_rows(&[
            &["Network", "Address"],
            &["sol", "addrA"],
        ]);
        let launcher = FakeLauncher::new(&[("addrA", PageScript::priced("$2"))]);

        let report = run_cycle(&cfg, &sheet, &launcher, &agents()).await.unwrap();

        assert_eq!(report.rows_dispatched, 1);
        assert_eq!(sheet.written_ranges()[0], "'General'!E2");
    }

    #[tokio::test]
    async fn read_failure_aborts_cycle() {
        let cfg = test_config();
        let sheet = MemorySheet::failing_reads();
        let launcher = FakeLauncher::default();

        assert!(run_cycle(&cfg, &sheet, &launcher, &agents()).await.is_err());
        assert!(launcher.events().is_empty());
    }

    #[tokio::test]
    async fn write_failure_aborts_after_batch() {
        let cfg = test_config();
        let sheet = MemorySheet::with_rows(&[
            &["sol", "a1"],
            &["sol", "a2"],
            &["sol", "a3"],
        ])
        .fail_writes();
        let launcher = FakeLauncher::new(&[
            ("a1", PageScript::priced("$1")),
            ("a2", PageScript::priced("$2")),
            ("a3", PageScript::priced("$3")),
        ]);

        assert!(run_cycle(&cfg, &sheet, &launcher, &agents()).await.is_err());
        // first batch drained, second never started
        assert_eq!(sheet.batch_calls().len(), 2);
        assert_eq!(launcher.count("open:"), 2);
    }

    #[tokio::test]
    async fn empty_sheet_is_a_quiet_cycle() {
        let cfg = test_config();
        let sheet = MemorySheet::default();
        let launcher = FakeLauncher::default();

        let report = run_cycle(&cfg, &sheet, &launcher, &agents()).await.unwrap();
        assert_eq!(report, CycleReport::default());
    }
}
