//! Google Sheets v4 backend.
//!
//! Each worksheet is addressed by its title. The first row of a worksheet
//! holds the headers; every following row is one record. Values are
//! appended with `valueInputOption=RAW` so the timestamp text is stored as
//! typed instead of being reinterpreted as a date by the spreadsheet locale.
//!
//! A spreadsheet is selected either by id or by its title, which is looked
//! up among the files shared with the service account through the Drive API.

use std::sync::Arc;

use async_trait::async_trait;
use engine::{BudgetEntry, BudgetTable, LedgerRow, LedgerStore, Transaction, columns};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    SheetsError,
    auth::{ServiceAccountKey, TokenProvider},
    records::{Record, records},
};

pub const SHEETS_API: &str = "https://sheets.googleapis.com";
pub const DRIVE_API: &str = "https://www.googleapis.com";

const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
struct AppendBody<'a> {
    values: [&'a [Value]; 1],
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Authenticated client for one spreadsheet.
///
/// Built unbound; [`with_spreadsheet_id`](Self::with_spreadsheet_id) or
/// [`select_by_title`](Self::select_by_title) picks the spreadsheet.
#[derive(Clone)]
pub struct SheetsClient {
    http: Client,
    base_url: String,
    drive_url: String,
    spreadsheet_id: String,
    auth: Arc<TokenProvider>,
}

impl SheetsClient {
    pub fn new(http: Client, key: ServiceAccountKey) -> Self {
        Self {
            auth: Arc::new(TokenProvider::new(http.clone(), key)),
            http,
            base_url: SHEETS_API.to_string(),
            drive_url: DRIVE_API.to_string(),
            spreadsheet_id: String::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn with_drive_url(mut self, drive_url: &str) -> Self {
        self.drive_url = drive_url.to_string();
        self
    }

    pub fn with_spreadsheet_id(mut self, spreadsheet_id: &str) -> Self {
        self.spreadsheet_id = spreadsheet_id.to_string();
        self
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// Binds the client to the spreadsheet titled `title`. When several
    /// files share the title the first one listed wins.
    pub async fn select_by_title(self, title: &str) -> Result<Self, SheetsError> {
        let invalid = || SheetsError::Url(self.drive_url.clone());
        let mut url = Url::parse(&self.drive_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(["drive", "v3", "files"]);

        let query = format!(
            "name = '{}' and mimeType = '{SPREADSHEET_MIME}' and trashed = false",
            drive_literal(title)
        );
        let token = self.auth.access_token().await?;
        let resp = self
            .http
            .get(url)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id,name)"),
                ("includeItemsFromAllDrives", "true"),
                ("supportsAllDrives", "true"),
            ])
            .bearer_auth(token)
            .send()
            .await?;

        let list = Self::check(resp).await?.json::<FileList>().await?;
        if list.files.len() > 1 {
            tracing::warn!(
                "{} spreadsheets are titled \"{title}\", using the first",
                list.files.len()
            );
        }
        let Some(file) = list.files.into_iter().next() else {
            return Err(SheetsError::SpreadsheetNotFound(title.to_string()));
        };

        tracing::info!("spreadsheet \"{title}\" has id {}", file.id);
        Ok(self.with_spreadsheet_id(&file.id))
    }

    fn values_url(&self, range: &str) -> Result<Url, SheetsError> {
        if self.spreadsheet_id.is_empty() {
            return Err(SheetsError::Url("no spreadsheet selected".to_string()));
        }
        let invalid = || SheetsError::Url(self.base_url.clone());

        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", range]);
        Ok(url)
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, SheetsError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let message = match resp.json::<ErrorBody>().await {
            Ok(err) => err.error.message,
            Err(_) => "sheets api error".to_string(),
        };
        Err(SheetsError::Api { status, message })
    }

    /// Reads every row of `range`, cells rendered as text.
    pub async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>, SheetsError> {
        let token = self.auth.access_token().await?;
        let resp = self
            .http
            .get(self.values_url(range)?)
            .query(&[
                ("majorDimension", "ROWS"),
                ("valueRenderOption", "UNFORMATTED_VALUE"),
            ])
            .bearer_auth(token)
            .send()
            .await?;

        let body = Self::check(resp).await?.json::<ValueRange>().await?;
        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    /// Appends one row after the last row of the table found in `range`.
    pub async fn append_row(&self, range: &str, row: &[Value]) -> Result<(), SheetsError> {
        let token = self.auth.access_token().await?;
        let resp = self
            .http
            .post(self.values_url(&format!("{range}:append"))?)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .bearer_auth(token)
            .json(&AppendBody { values: [row] })
            .send()
            .await?;

        Self::check(resp).await?;
        Ok(())
    }

    /// Reads a worksheet as header-keyed records.
    async fn read_records(&self, sheet: &str) -> Result<Vec<Record>, SheetsError> {
        let mut rows = self.get_values(&sheet_range(sheet)).await?.into_iter();
        let Some(headers) = rows.next() else {
            return Ok(Vec::new());
        };
        Ok(records(&headers, rows))
    }
}

/// String literal of a Drive search query.
fn drive_literal(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\'', "\\'")
}

/// A1 notation for a whole worksheet: the title quoted, inner quotes doubled.
fn sheet_range(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}

fn cell_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Bool(b) => (if b { "TRUE" } else { "FALSE" }).to_string(),
        other => other.to_string(),
    }
}

fn strings(cells: &[&str]) -> Vec<Value> {
    cells.iter().map(|c| Value::String(c.to_string())).collect()
}

/// Ledger worksheet.
#[derive(Clone)]
pub struct GoogleLedger {
    client: SheetsClient,
    sheet: String,
}

impl GoogleLedger {
    pub fn new(client: SheetsClient, sheet: &str) -> Self {
        Self {
            client,
            sheet: sheet.to_string(),
        }
    }

    /// Writes the header row when the worksheet is still empty.
    pub async fn ensure_header(&self) -> Result<(), SheetsError> {
        let range = sheet_range(&self.sheet);
        if self.client.get_values(&range).await?.is_empty() {
            tracing::info!("writing header row to empty worksheet \"{}\"", self.sheet);
            self.client.append_row(&range, &strings(&columns::ALL)).await?;
        }
        Ok(())
    }
}

/// Row as sent to the API; the amount stays numeric so spreadsheet formulas
/// can sum the column.
fn transaction_cells(transaction: &Transaction) -> Vec<Value> {
    let row = transaction.to_row();
    let mut cells = strings(&row.cells());
    cells[5] = Value::from(transaction.amount.value());
    cells
}

#[async_trait]
impl LedgerStore for GoogleLedger {
    async fn append(&self, transaction: &Transaction) -> Result<(), engine::EngineError> {
        self.client
            .append_row(&sheet_range(&self.sheet), &transaction_cells(transaction))
            .await?;
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<LedgerRow>, engine::EngineError> {
        self.client
            .read_records(&self.sheet)
            .await?
            .iter()
            .map(LedgerRow::from_record)
            .collect()
    }
}

/// Budget worksheet.
#[derive(Clone)]
pub struct GoogleBudgets {
    client: SheetsClient,
    sheet: String,
}

impl GoogleBudgets {
    pub fn new(client: SheetsClient, sheet: &str) -> Self {
        Self {
            client,
            sheet: sheet.to_string(),
        }
    }
}

#[async_trait]
impl BudgetTable for GoogleBudgets {
    async fn read_all(&self) -> Result<Vec<BudgetEntry>, engine::EngineError> {
        self.client
            .read_records(&self.sheet)
            .await?
            .iter()
            .map(BudgetEntry::from_record)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::{Amount, Direction};

    fn client() -> SheetsClient {
        SheetsClient::new(
            Client::new(),
            ServiceAccountKey {
                client_email: "bot@example.com".to_string(),
                private_key: String::new(),
                token_uri: "http://localhost/token".to_string(),
            },
        )
        .with_spreadsheet_id("sheet-id")
    }

    #[test]
    fn values_url_encodes_sheet_title() {
        let url = client().values_url(&sheet_range("記帳紀錄")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-id/values/'%E8%A8%98%E5%B8%B3%E7%B4%80%E9%8C%84'"
        );
    }

    #[test]
    fn append_url_keeps_method_suffix() {
        let url = client()
            .with_base_url("http://localhost:8080/")
            .values_url("'預算設定':append")
            .unwrap();
        assert!(url.as_str().starts_with("http://localhost:8080/v4/spreadsheets/sheet-id/values/"));
        assert!(url.as_str().ends_with("':append"));
    }

    #[test]
    fn unbound_client_has_no_values_url() {
        let unbound = client().with_spreadsheet_id("");
        assert!(matches!(
            unbound.values_url("'記帳紀錄'").unwrap_err(),
            SheetsError::Url(_)
        ));
    }

    #[test]
    fn drive_literal_escapes_quotes_and_backslashes() {
        assert_eq!(drive_literal("Tom's 帳本"), r"Tom\'s 帳本");
        assert_eq!(drive_literal(r"a\b"), r"a\\b");
    }

    #[test]
    fn sheet_range_doubles_quotes() {
        assert_eq!(sheet_range("Tom's"), "'Tom''s'");
    }

    #[test]
    fn cells_render_as_text() {
        assert_eq!(cell_text(Value::from(3000)), "3000");
        assert_eq!(cell_text(Value::from("食物")), "食物");
        assert_eq!(cell_text(Value::Null), "");
        assert_eq!(cell_text(Value::Bool(true)), "TRUE");
        assert_eq!(cell_text(Value::from(12.5)), "12.5");
    }

    #[test]
    fn transaction_amount_is_numeric() {
        let tx = Transaction {
            timestamp: "2026年10月19日 12:30".to_string(),
            category: "食物".to_string(),
            tool: "現金".to_string(),
            method: "支出".to_string(),
            direction: Direction::Expense,
            amount: Amount::new(120),
            note: "午餐".to_string(),
        };
        let cells = transaction_cells(&tx);
        assert_eq!(cells.len(), 7);
        assert_eq!(cells[4], Value::from("-"));
        assert_eq!(cells[5], Value::from(120));
    }
}
