//! Google Sheets v4 backend.
//!
//! The spreadsheet is addressed by title, as people know it; the id is looked
//! up once through the Drive API unless configured directly.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use url::Url;

use super::auth::TokenProvider;
use super::{SheetStore, Worksheet, WorksheetSelector};
use crate::error::{LeadIntakeError, Result};
use crate::logging::OperationTimer;
use crate::models::CellValue;
use crate::schema::leads;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/";
const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

/// How to find the spreadsheet
#[derive(Debug, Clone)]
pub enum SpreadsheetRef {
    /// Known spreadsheet id
    Id(String),
    /// Title to search for in Drive
    Name(String),
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
    #[serde(default)]
    index: i64,
    #[serde(default)]
    grid_properties: GridProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridProperties {
    #[serde(default)]
    row_count: u32,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// A1 range on a worksheet, with the title quoted the way Sheets expects.
fn a1_range(title: &str, range: &str) -> String {
    format!("'{}'!{range}", title.replace('\'', "''"))
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Sheets REST client bound to one spreadsheet
pub struct GoogleSheetsStore {
    client: reqwest::Client,
    tokens: Arc<TokenProvider>,
    spreadsheet: SpreadsheetRef,
    spreadsheet_id: OnceCell<String>,
}

impl GoogleSheetsStore {
    /// Create a store for `spreadsheet`; requests time out after `timeout`.
    pub fn new(tokens: Arc<TokenProvider>, spreadsheet: SpreadsheetRef, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            tokens,
            spreadsheet,
            spreadsheet_id: OnceCell::new(),
        })
    }

    async fn spreadsheet_id(&self) -> Result<&str> {
        let id = self
            .spreadsheet_id
            .get_or_try_init(|| async {
                match &self.spreadsheet {
                    SpreadsheetRef::Id(id) => Ok(id.clone()),
                    SpreadsheetRef::Name(name) => self.find_spreadsheet_by_name(name).await,
                }
            })
            .await?;
        Ok(id.as_str())
    }

    async fn find_spreadsheet_by_name(&self, name: &str) -> Result<String> {
        let query = format!(
            "name = '{}' and mimeType = '{SPREADSHEET_MIME}' and trashed = false",
            name.replace('\\', "\\\\").replace('\'', "\\'")
        );
        let token = self.tokens.access_token().await?;

        let resp = self
            .client
            .get(DRIVE_FILES_URL)
            .bearer_auth(token)
            .query(&[("q", query.as_str()), ("fields", "files(id,name)"), ("pageSize", "1")])
            .send()
            .await?;
        let list: DriveFileList = Self::parse(resp).await?;

        let id = list
            .files
            .into_iter()
            .next()
            .map(|f| f.id)
            .ok_or_else(|| LeadIntakeError::Store(format!("Spreadsheet not found: {name}")))?;

        tracing::info!(spreadsheet = name, id = %id, "Resolved spreadsheet id");
        Ok(id)
    }

    async fn url(&self, segments: &[&str]) -> Result<Url> {
        let id = self.spreadsheet_id().await?;
        let mut url = Url::parse(SHEETS_API_BASE).map_err(|e| LeadIntakeError::Other(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| LeadIntakeError::Other("Sheets API base URL cannot take a path".to_string()))?
            .pop_if_empty()
            .push("spreadsheets")
            .push(id)
            .extend(segments);
        Ok(url)
    }

    async fn parse<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(LeadIntakeError::Store(format!("Google API returned {status}: {body}")));
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn check(resp: reqwest::Response) -> Result<()> {
        Self::parse::<serde_json::Value>(resp).await.map(|_| ())
    }
}

#[async_trait]
impl SheetStore for GoogleSheetsStore {
    async fn worksheet(&self, selector: &WorksheetSelector) -> Result<Worksheet> {
        let mut url = self.url(&[]).await?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties(sheetId,title,index,gridProperties.rowCount)");
        let token = self.tokens.access_token().await?;

        let resp = self.client.get(url).bearer_auth(token).send().await?;
        let meta: SpreadsheetMeta = Self::parse(resp).await?;

        let mut sheets: Vec<SheetProperties> = meta.sheets.into_iter().map(|s| s.properties).collect();
        sheets.sort_by_key(|p| p.index);

        let found = match selector {
            WorksheetSelector::First => sheets.into_iter().next(),
            WorksheetSelector::Title(title) => sheets.into_iter().find(|p| &p.title == title),
        };

        found
            .map(|p| Worksheet {
                sheet_id: p.sheet_id,
                title: p.title,
                row_count: p.grid_properties.row_count,
            })
            .ok_or_else(|| match selector {
                WorksheetSelector::First => LeadIntakeError::WorksheetNotFound("<first>".to_string()),
                WorksheetSelector::Title(title) => LeadIntakeError::WorksheetNotFound(title.clone()),
            })
    }

    async fn column_values(&self, worksheet: &Worksheet, column: char) -> Result<Vec<String>> {
        let timer = OperationTimer::new("sheets.column_values");
        let range = a1_range(&worksheet.title, &format!("{column}:{column}"));
        let mut url = self.url(&["values", range.as_str()]).await?;
        url.query_pairs_mut().append_pair("majorDimension", "COLUMNS");
        let token = self.tokens.access_token().await?;

        let resp = self.client.get(url).bearer_auth(token).send().await?;
        let range: ValueRange = Self::parse(resp).await?;
        timer.finish();

        Ok(range
            .values
            .into_iter()
            .next()
            .map(|col| col.iter().map(cell_text).collect())
            .unwrap_or_default())
    }

    async fn add_rows(&self, worksheet: &Worksheet, count: u32) -> Result<()> {
        let id = self.spreadsheet_id().await?;
        let mut url = self.url(&[]).await?;
        let path = format!("{}:batchUpdate", url.path());
        url.set_path(&path);
        let token = self.tokens.access_token().await?;

        let body = json!({
            "requests": [{
                "appendDimension": {
                    "sheetId": worksheet.sheet_id,
                    "dimension": "ROWS",
                    "length": count,
                }
            }]
        });

        let resp = self.client.post(url).bearer_auth(token).json(&body).send().await?;
        Self::check(resp).await?;
        tracing::info!(spreadsheet = id, worksheet = %worksheet.title, count, "Added rows");
        Ok(())
    }

    async fn write_row(&self, worksheet: &Worksheet, row: u32, values: &[CellValue]) -> Result<()> {
        let timer = OperationTimer::new("sheets.write_row");
        let range = a1_range(
            &worksheet.title,
            &format!("{}{row}:{}{row}", leads::FIRST_COLUMN, leads::LAST_COLUMN),
        );
        let mut url = self.url(&["values", range.as_str()]).await?;
        url.query_pairs_mut().append_pair("valueInputOption", "USER_ENTERED");
        let token = self.tokens.access_token().await?;

        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": [values],
        });

        let resp = self.client.put(url).bearer_auth(token).json(&body).send().await?;
        Self::check(resp).await?;
        timer.finish();
        Ok(())
    }

    async fn append_row(&self, worksheet: &Worksheet, values: &[CellValue]) -> Result<()> {
        let timer = OperationTimer::new("sheets.append_row");
        let range = a1_range(&worksheet.title, &format!("{}1", leads::FIRST_COLUMN));
        let segment = format!("{range}:append");
        let mut url = self.url(&["values", segment.as_str()]).await?;
        url.query_pairs_mut().append_pair("valueInputOption", "USER_ENTERED");
        let token = self.tokens.access_token().await?;

        let resp = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "values": [values] }))
            .send()
            .await?;
        Self::check(resp).await?;
        timer.finish();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a1_range_quotes_titles() {
        assert_eq!(a1_range("Sheet1", "D:D"), "'Sheet1'!D:D");
        assert_eq!(a1_range("Dattu's leads", "A1"), "'Dattu''s leads'!A1");
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&json!("+919876543210")), "+919876543210");
        assert_eq!(cell_text(&json!(12)), "12");
        assert_eq!(cell_text(&serde_json::Value::Null), "");
    }

    #[test]
    fn test_metadata_parsing() {
        let meta: SpreadsheetMeta = serde_json::from_value(json!({
            "sheets": [
                {"properties": {"sheetId": 7, "title": "Dattu's leads", "index": 1, "gridProperties": {"rowCount": 40}}},
                {"properties": {"sheetId": 0, "title": "Master", "index": 0, "gridProperties": {"rowCount": 1000}}}
            ]
        }))
        .unwrap();
        assert_eq!(meta.sheets.len(), 2);
        assert_eq!(meta.sheets[0].properties.grid_properties.row_count, 40);
        assert_eq!(meta.sheets[1].properties.title, "Master");
    }
}
