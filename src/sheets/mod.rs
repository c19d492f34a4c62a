pub mod auth;
pub mod client;
#[cfg(test)]
pub mod fake;
pub mod writer;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::CellWrite;

pub use auth::ServiceAccountAuth;
pub use client::GoogleSheetsClient;
pub use writer::SheetWriter;

/// Key-range view of the spreadsheet.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// All rows of `range`, each an ordered list of cell strings. Trailing
    /// empty cells and rows may be missing.
    async fn get(&self, range: &str) -> Result<Vec<Vec<String>>>;

    /// One non-transactional multi-range write.
    async fn batch_update(&self, writes: &[CellWrite]) -> Result<()>;
}
