use serde::Serialize;

// ---------------------------------------------------------------------------
// Source rows
// ---------------------------------------------------------------------------

/// One token row read from the sheet. `number` is the 1-based sheet row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub number: usize,
    /// Lower-cased network identifier
    pub network: String,
    pub address: String,
}

impl Row {
    /// Builds a row from raw sheet cells: column A is the network, B the address.
    pub fn from_cells(number: usize, cells: &[String]) -> Self {
        let cell = |i: usize| cells.get(i).map(|c| c.trim()).unwrap_or_default();
        Self {
            number,
            network: cell(0).to_lowercase(),
            address: cell(1).to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Scrape results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeOutcome {
    /// Nothing usable on the page, or the scrape failed.
    Empty,
    Found {
        /// Canonical decimal string, never a float.
        price_text: String,
        source_url: String,
    },
}

impl ScrapeOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, ScrapeOutcome::Found { .. })
    }
}

// ---------------------------------------------------------------------------
// Sheet writes
// ---------------------------------------------------------------------------

/// Column letter → cell value for a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetUpdate {
    pub row: usize,
    pub cells: Vec<(&'static str, String)>,
}

/// One entry of a `values:batchUpdate` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellWrite {
    pub range: String,
    pub values: Vec<Vec<String>>,
}

impl CellWrite {
    pub fn single(range: String, value: String) -> Self {
        Self {
            range,
            values: vec![vec![value]],
        }
    }
}

// ---------------------------------------------------------------------------
// Cycle accounting
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Rows visited before the blank sentinel (or end of data)
    pub rows_scanned: usize,
    /// Rows with fewer than two populated cells
    pub rows_skipped: usize,
    /// Rows handed to the row processor
    pub rows_dispatched: usize,
    pub found: usize,
    pub empty: usize,
    pub written: usize,
    /// Size of each lock-step batch, in order
    pub batch_sizes: Vec<usize>,
}
