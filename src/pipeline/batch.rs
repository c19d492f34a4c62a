use std::future::Future;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::types::{CycleReport, Row, ScrapeOutcome};

/// Up to `limit` futures that are awaited together at a single join point.
///
/// This is a lock-step barrier, not a sliding-window pool: nothing from the
/// next batch starts until every member of the current one has settled, so
/// one slow row holds back the following batch even while other slots idle.
pub struct LockstepGroup<F: Future> {
    limit: usize,
    pending: Vec<F>,
}

impl<F: Future> LockstepGroup<F> {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            limit,
            pending: Vec::with_capacity(limit),
        }
    }

    pub fn push(&mut self, task: F) {
        self.pending.push(task);
    }

    pub fn is_full(&self) -> bool {
        self.pending.len() >= self.limit
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drive every pending task to completion. A failing task does not
    /// cancel its siblings; outputs come back in push order.
    pub async fn join(&mut self) -> Vec<F::Output> {
        join_all(std::mem::take(&mut self.pending)).await
    }
}

fn populated_cells(cells: &[String]) -> usize {
    cells.iter().filter(|c| !c.trim().is_empty()).count()
}

/// Walk `values` from the 1-based `start_row`, dispatching eligible rows to
/// `task` in lock-step batches of `limit`.
///
/// Iteration ends at the first fully blank row. Rows with fewer than two
/// populated cells are skipped. Once a batch has drained, the first task
/// error (a failed sheet write) aborts the remaining rows.
pub async fn run_batches<T, Fut>(
    values: &[Vec<String>],
    start_row: usize,
    limit: usize,
    task: T,
) -> Result<CycleReport>
where
    T: Fn(Row) -> Fut,
    Fut: Future<Output = Result<ScrapeOutcome>>,
{
    let mut report = CycleReport::default();
    let mut group = LockstepGroup::new(limit);

    for (idx, cells) in values.iter().enumerate().skip(start_row.saturating_sub(1)) {
        let number = idx + 1;
        if populated_cells(cells) == 0 {
            info!("Reached empty row at {number}. Stopping processing.");
            break;
        }
        report.rows_scanned += 1;

        if populated_cells(cells) < 2 {
            warn!(row = number, "Skipping row {number} due to insufficient data");
            report.rows_skipped += 1;
            continue;
        }

        group.push(task(Row::from_cells(number, cells)));
        report.rows_dispatched += 1;

        if group.is_full() {
            settle(&mut report, group.join().await)?;
        }
    }

    if !group.is_empty() {
        settle(&mut report, group.join().await)?;
    }

    Ok(report)
}

fn settle(report: &mut CycleReport, results: Vec<Result<ScrapeOutcome>>) -> Result<()> {
    debug!("Batch {} settled ({} rows)", report.batch_sizes.len() + 1, results.len());
    report.batch_sizes.push(results.len());

    let mut first_error = None;
    for result in results {
        match result {
            Ok(outcome) if outcome.is_found() => {
                report.found += 1;
                report.written += 1;
            }
            Ok(_) => report.empty += 1,
            Err(e) => {
                // the scrape succeeded but its write did not
                report.found += 1;
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
