use tracing::warn;

use crate::browser::BrowserLauncher;
use crate::scraper::PageScraper;
use crate::types::{Row, ScrapeOutcome};

pub struct RowProcessor<'a, L: BrowserLauncher> {
    scraper: PageScraper<'a, L>,
}

impl<'a, L: BrowserLauncher> RowProcessor<'a, L> {
    pub fn new(scraper: PageScraper<'a, L>) -> Self {
        Self { scraper }
    }

    /// Rows missing a network or address are `Empty` without a scrape.
    pub async fn process(&self, row: &Row) -> ScrapeOutcome {
        if row.network.is_empty() || row.address.is_empty() {
            warn!(row = row.number, "Skipping row {} due to missing data", row.number);
            return ScrapeOutcome::Empty;
        }
        self.scraper
            .scrape(row.number, &row.network, &row.address)
            .await
    }
}
