//! In-memory sheet for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use super::SheetStore;
use crate::error::{AppError, Result};
use crate::types::CellWrite;

#[derive(Default)]
pub struct MemorySheet {
    rows: Vec<Vec<String>>,
    fail_reads: bool,
    fail_writes: bool,
    calls: Mutex<Vec<Vec<CellWrite>>>,
}

impl MemorySheet {
    pub fn with_rows(rows: &[&[&str]]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
            ..Default::default()
        }
    }

    pub fn failing_reads() -> Self {
        Self {
            fail_reads: true,
            ..Default::default()
        }
    }

    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Default::default()
        }
    }

    pub fn fail_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn batch_calls(&self) -> Vec<Vec<CellWrite>> {
        self.calls.lock().unwrap().clone()
    }

    /// Ranges written, flattened across calls.
    pub fn written_ranges(&self) -> Vec<String> {
        self.batch_calls()
            .into_iter()
            .flatten()
            .map(|w| w.range)
            .collect()
    }
}

#[async_trait]
impl SheetStore for MemorySheet {
    async fn get(&self, _range: &str) -> Result<Vec<Vec<String>>> {
        if self.fail_reads {
            return Err(AppError::Sheets {
                status: 503,
                body: "backend unavailable".to_string(),
            });
        }
        Ok(self.rows.clone())
    }

    async fn batch_update(&self, writes: &[CellWrite]) -> Result<()> {
        self.calls.lock().unwrap().push(writes.to_vec());
        if self.fail_writes {
            return Err(AppError::Sheets {
                status: 429,
                body: "quota exceeded".to_string(),
            });
        }
        Ok(())
    }
}
