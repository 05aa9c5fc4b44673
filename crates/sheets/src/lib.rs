//! Spreadsheet-backed stores.
//!
//! Both backends read a worksheet as a header row followed by records, and
//! both implement the engine's [`LedgerStore`] and [`BudgetTable`]:
//!
//! - [`GoogleLedger`] / [`GoogleBudgets`] talk to the Sheets v4 REST API
//!   with a service account;
//! - [`CsvLedger`] / [`CsvBudgets`] keep one CSV file per worksheet.
//!
//! [`LedgerStore`]: engine::LedgerStore
//! [`BudgetTable`]: engine::BudgetTable

pub use auth::{DRIVE_READONLY_SCOPE, SPREADSHEETS_SCOPE, ServiceAccountKey};
pub use csv_store::{CsvBudgets, CsvLedger};
pub use error::SheetsError;
pub use google::{DRIVE_API, GoogleBudgets, GoogleLedger, SHEETS_API, SheetsClient};

mod auth;
mod csv_store;
mod error;
mod google;
mod records;

pub const DEFAULT_LEDGER_SHEET: &str = "記帳紀錄";
pub const DEFAULT_BUDGET_SHEET: &str = "預算設定";
