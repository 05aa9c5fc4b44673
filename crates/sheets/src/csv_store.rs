//! Local CSV backend: one file per worksheet, first line is the header row.
//!
//! File access is blocking and runs on the blocking thread pool.

use std::{
    fs::{self, File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use engine::{
    BudgetEntry, BudgetTable, EngineError, LedgerRow, LedgerStore, Transaction, columns,
};
use tokio::sync::Mutex;

use crate::{
    SheetsError,
    records::{Record, records},
};

fn read_records(path: &Path) -> Result<Vec<Record>, SheetsError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let rows = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect::<Vec<_>>()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records(&headers, rows))
}

/// Reads `path` off the async runtime; a missing file yields `None`.
async fn read_records_blocking(path: PathBuf) -> Result<Option<Vec<Record>>, SheetsError> {
    tokio::task::spawn_blocking(move || {
        if !path.exists() {
            return Ok(None);
        }
        read_records(&path).map(Some)
    })
    .await?
}

/// Terminates the last line of a non-empty file that was saved without a
/// trailing newline, so the next record starts on its own line.
fn terminate_last_line(file: &mut File) -> Result<(), SheetsError> {
    if file.metadata()?.len() == 0 {
        return Ok(());
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    if last[0] != b'\n' {
        file.write_all(b"\n")?;
    }
    Ok(())
}

fn append_row(path: &Path, row: &LedgerRow) -> Result<(), SheetsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)?;
    let empty = file.metadata()?.len() == 0;
    terminate_last_line(&mut file)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    if empty {
        writer.write_record(columns::ALL)?;
    }
    writer.write_record(row.cells())?;
    writer.flush()?;
    Ok(())
}

/// Ledger stored as `<dir>/<sheet>.csv`.
#[derive(Debug)]
pub struct CsvLedger {
    path: PathBuf,
    write: Mutex<()>,
}

impl CsvLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LedgerStore for CsvLedger {
    async fn append(&self, transaction: &Transaction) -> Result<(), EngineError> {
        let _guard = self.write.lock().await;
        let path = self.path.clone();
        let row = transaction.to_row();
        tokio::task::spawn_blocking(move || append_row(&path, &row))
            .await
            .map_err(SheetsError::from)??;
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<LedgerRow>, EngineError> {
        let _guard = self.write.lock().await;
        let Some(records) = read_records_blocking(self.path.clone()).await? else {
            return Ok(Vec::new());
        };

        records.iter().map(LedgerRow::from_record).collect()
    }
}

/// Budget table stored as `<dir>/<sheet>.csv`, maintained by hand.
#[derive(Debug, Clone)]
pub struct CsvBudgets {
    path: PathBuf,
}

impl CsvBudgets {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl BudgetTable for CsvBudgets {
    async fn read_all(&self) -> Result<Vec<BudgetEntry>, EngineError> {
        let Some(records) = read_records_blocking(self.path.clone()).await? else {
            tracing::warn!("budget file {} not found", self.path.display());
            return Ok(Vec::new());
        };

        records.iter().map(BudgetEntry::from_record).collect()
    }
}
