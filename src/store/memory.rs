//! In-memory sheet backend.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use super::{SheetStore, Worksheet, WorksheetSelector};
use crate::error::{LeadIntakeError, Result};
use crate::models::CellValue;

#[derive(Debug, Clone)]
struct MemorySheet {
    sheet_id: i64,
    title: String,
    rows: Vec<Vec<String>>,
    row_count: u32,
}

impl MemorySheet {
    fn last_data_row(&self) -> usize {
        self.rows
            .iter()
            .rposition(|row| row.iter().any(|cell| !cell.is_empty()))
            .map_or(0, |i| i + 1)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    sheets: Vec<MemorySheet>,
    failing: HashSet<String>,
    add_rows_calls: Vec<(String, u32)>,
}

/// Worksheets held in memory, for tests and dry runs.
///
/// Behaves like the Sheets API where the pipeline can tell the difference:
/// writes past the allocated rows are rejected, appends grow the grid.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Empty store with no worksheets
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a worksheet with a header row and `row_count` allocated rows
    #[must_use]
    pub fn with_worksheet(self, title: &str, header: &[&str], row_count: u32) -> Self {
        if let Ok(mut state) = self.state.lock() {
            let sheet_id = i64::try_from(state.sheets.len()).unwrap_or(i64::MAX);
            state.sheets.push(MemorySheet {
                sheet_id,
                title: title.to_string(),
                rows: vec![header.iter().map(ToString::to_string).collect()],
                row_count: row_count.max(1),
            });
        }
        self
    }

    /// Add a data row below the existing ones, growing capacity if needed
    #[must_use]
    pub fn with_row(self, title: &str, cells: &[&str]) -> Self {
        if let Ok(mut state) = self.state.lock() {
            if let Some(sheet) = state.sheets.iter_mut().find(|s| s.title == title) {
                sheet.rows.push(cells.iter().map(ToString::to_string).collect());
                let len = u32::try_from(sheet.rows.len()).unwrap_or(u32::MAX);
                sheet.row_count = sheet.row_count.max(len);
            }
        }
        self
    }

    /// Make every write to `title` fail
    pub fn fail_writes_to(&self, title: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.failing.insert(title.to_string());
        }
    }

    /// Rows currently stored in a worksheet, header included
    #[must_use]
    pub fn rows(&self, title: &str) -> Vec<Vec<String>> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.sheets.iter().find(|s| s.title == title).map(|s| s.rows.clone()))
            .unwrap_or_default()
    }

    /// Allocated row capacity of a worksheet
    #[must_use]
    pub fn row_count(&self, title: &str) -> Option<u32> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.sheets.iter().find(|s| s.title == title).map(|s| s.row_count))
    }

    /// Every `add_rows` call made so far as (worksheet, count)
    #[must_use]
    pub fn add_rows_calls(&self) -> Vec<(String, u32)> {
        self.state.lock().map(|s| s.add_rows_calls.clone()).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| LeadIntakeError::Store("memory store lock poisoned".to_string()))
    }
}

fn sheet_mut<'a>(state: &'a mut MemoryState, worksheet: &Worksheet) -> Result<&'a mut MemorySheet> {
    state
        .sheets
        .iter_mut()
        .find(|s| s.sheet_id == worksheet.sheet_id)
        .ok_or_else(|| LeadIntakeError::WorksheetNotFound(worksheet.title.clone()))
}

fn ensure_writable(state: &MemoryState, worksheet: &Worksheet) -> Result<()> {
    if state.failing.contains(&worksheet.title) {
        return Err(LeadIntakeError::Store(format!(
            "The service is currently unavailable (writes to '{}' are failing)",
            worksheet.title
        )));
    }
    Ok(())
}

#[async_trait]
impl SheetStore for MemoryStore {
    async fn worksheet(&self, selector: &WorksheetSelector) -> Result<Worksheet> {
        let state = self.lock()?;
        let sheet = match selector {
            WorksheetSelector::First => state.sheets.first(),
            WorksheetSelector::Title(title) => state.sheets.iter().find(|s| &s.title == title),
        };

        sheet
            .map(|s| Worksheet {
                sheet_id: s.sheet_id,
                title: s.title.clone(),
                row_count: s.row_count,
            })
            .ok_or_else(|| match selector {
                WorksheetSelector::First => LeadIntakeError::WorksheetNotFound("<first>".to_string()),
                WorksheetSelector::Title(title) => LeadIntakeError::WorksheetNotFound(title.clone()),
            })
    }

    async fn column_values(&self, worksheet: &Worksheet, column: char) -> Result<Vec<String>> {
        let mut state = self.lock()?;
        let sheet = sheet_mut(&mut state, worksheet)?;
        let index = crate::schema::column_index(column);

        let mut values: Vec<String> = sheet
            .rows
            .iter()
            .map(|row| row.get(index).cloned().unwrap_or_default())
            .collect();
        while values.last().is_some_and(String::is_empty) {
            values.pop();
        }
        Ok(values)
    }

    async fn add_rows(&self, worksheet: &Worksheet, count: u32) -> Result<()> {
        let mut state = self.lock()?;
        state.add_rows_calls.push((worksheet.title.clone(), count));
        let sheet = sheet_mut(&mut state, worksheet)?;
        sheet.row_count += count;
        Ok(())
    }

    async fn write_row(&self, worksheet: &Worksheet, row: u32, values: &[CellValue]) -> Result<()> {
        let mut state = self.lock()?;
        ensure_writable(&state, worksheet)?;
        let sheet = sheet_mut(&mut state, worksheet)?;

        if row == 0 || row > sheet.row_count {
            return Err(LeadIntakeError::Store(format!(
                "Range ('{}'!A{row}) exceeds grid limits. Max rows: {}",
                sheet.title, sheet.row_count
            )));
        }

        let index = (row - 1) as usize;
        if sheet.rows.len() <= index {
            sheet.rows.resize(index + 1, Vec::new());
        }
        sheet.rows[index] = values.iter().map(CellValue::render).collect();
        Ok(())
    }

    async fn append_row(&self, worksheet: &Worksheet, values: &[CellValue]) -> Result<()> {
        let mut state = self.lock()?;
        ensure_writable(&state, worksheet)?;
        let sheet = sheet_mut(&mut state, worksheet)?;

        let index = sheet.last_data_row();
        sheet.rows.truncate(index);
        sheet.rows.push(values.iter().map(CellValue::render).collect());
        let len = u32::try_from(sheet.rows.len()).unwrap_or(u32::MAX);
        sheet.row_count = sheet.row_count.max(len);
        Ok(())
    }
}
