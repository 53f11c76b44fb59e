//! Sheet storage abstraction.
//!
//! The pipeline only needs a handful of row-level operations on a worksheet.
//! [`SheetStore`] captures them so the Google backend and the in-memory
//! backend are interchangeable.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::CellValue;

/// Google Sheets REST backend
pub mod google;
/// Service-account token exchange
pub mod auth;
/// In-memory backend
pub mod memory;

pub use google::GoogleSheetsStore;
pub use memory::MemoryStore;

/// How a worksheet is picked out of the spreadsheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorksheetSelector {
    /// The first worksheet by position
    First,
    /// A worksheet by exact title
    Title(String),
}

impl WorksheetSelector {
    /// Selector for an optional title, defaulting to the first worksheet
    #[must_use]
    pub fn from_title(title: Option<&str>) -> Self {
        match title {
            Some(t) if !t.trim().is_empty() => Self::Title(t.to_string()),
            _ => Self::First,
        }
    }
}

/// Snapshot of a worksheet's identity and allocated size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worksheet {
    /// Numeric sheet id within the spreadsheet
    pub sheet_id: i64,
    /// Worksheet title
    pub title: String,
    /// Allocated row capacity, including the header
    pub row_count: u32,
}

/// Row-oriented access to worksheets of one spreadsheet
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Look up a worksheet and its current row capacity
    async fn worksheet(&self, selector: &WorksheetSelector) -> Result<Worksheet>;

    /// Rendered values of one column from row 1 down to its last non-empty
    /// cell; blank cells in between come back as empty strings.
    async fn column_values(&self, worksheet: &Worksheet, column: char) -> Result<Vec<String>>;

    /// Grow the worksheet by `count` rows at the bottom
    async fn add_rows(&self, worksheet: &Worksheet, count: u32) -> Result<()>;

    /// Overwrite one row (columns A..) with `values`, letting the sheet
    /// interpret them as if typed by a user
    async fn write_row(&self, worksheet: &Worksheet, row: u32, values: &[CellValue]) -> Result<()>;

    /// Append `values` as a new row after the worksheet's data
    async fn append_row(&self, worksheet: &Worksheet, values: &[CellValue]) -> Result<()>;
}
