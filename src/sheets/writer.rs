use chrono::Local;
use tracing::info;

use super::SheetStore;
use crate::config::columns;
use crate::error::Result;
use crate::price::with_currency;
use crate::types::{CellWrite, ScrapeOutcome, SheetUpdate};

pub const DATE_FORMAT: &str = "%Y/%m/%d";

/// Turns `Found` outcomes into one batched write per row.
pub struct SheetWriter<'a, S: SheetStore> {
    store: &'a S,
    sheet_name: &'a str,
}

impl<'a, S: SheetStore> SheetWriter<'a, S> {
    pub fn new(store: &'a S, sheet_name: &'a str) -> Self {
        Self { store, sheet_name }
    }

    /// Returns whether a write was issued. `Empty` is a silent skip.
    pub async fn write(&self, row: usize, outcome: &ScrapeOutcome) -> Result<bool> {
        let Some(update) = build_update(row, outcome, &today()) else {
            info!(row, "Skipping preparing data for row {row}: nothing scraped");
            return Ok(false);
        };

        let writes = to_cell_writes(self.sheet_name, &update);
        self.store.batch_update(&writes).await?;
        info!(row, "Row {row} updated ({} cells)", writes.len());
        Ok(true)
    }
}

fn today() -> String {
    Local::now().format(DATE_FORMAT).to_string()
}

pub fn build_update(row: usize, outcome: &ScrapeOutcome, date: &str) -> Option<SheetUpdate> {
    match outcome {
        ScrapeOutcome::Empty => None,
        ScrapeOutcome::Found {
            price_text,
            source_url,
        } => Some(SheetUpdate {
            row,
            cells: vec![
                (columns::PRICE, with_currency(price_text)),
                (columns::URL, source_url.clone()),
                (columns::UPDATED, date.to_string()),
            ],
        }),
    }
}

/// A1 ranges are qualified with the quoted sheet name so writes land on the
/// tab that was read.
pub fn to_cell_writes(sheet_name: &str, update: &SheetUpdate) -> Vec<CellWrite> {
    let sheet = sheet_name.replace('\'', "''");
    update
        .cells
        .iter()
        .map(|(col, value)| {
            CellWrite::single(format!("'{sheet}'!{col}{}", update.row), value.clone())
        })
        .collect()
}
