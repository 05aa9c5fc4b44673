//! Store collaborators.
//!
//! The engine never knows where rows live. A backend implements
//! [`LedgerStore`] for the append-only ledger and [`BudgetTable`] for the
//! monthly limits. The in-memory versions here back tests and dry runs.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{Amount, EngineError, LedgerRow, ResultEngine, Transaction};

/// Header names of the budget worksheet.
pub mod budget_columns {
    pub const CATEGORY: &str = "分類";
    pub const MONTHLY_LIMIT: &str = "每月預算";
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn append(&self, transaction: &Transaction) -> ResultEngine<()>;

    /// Every row in insertion order.
    async fn read_all(&self) -> ResultEngine<Vec<LedgerRow>>;
}

#[async_trait]
pub trait BudgetTable: Send + Sync {
    async fn read_all(&self) -> ResultEngine<Vec<BudgetEntry>>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BudgetEntry {
    pub category: String,
    pub monthly_limit: Amount,
}

impl BudgetEntry {
    pub fn new(category: impl Into<String>, monthly_limit: i64) -> Self {
        Self {
            category: category.into(),
            monthly_limit: Amount::new(monthly_limit),
        }
    }

    /// Builds an entry from a header-keyed record. The limit must be an
    /// integer.
    pub fn from_record(record: &HashMap<String, String>) -> ResultEngine<Self> {
        let get = |name: &str| {
            record
                .get(name)
                .ok_or_else(|| EngineError::MissingColumn(name.to_string()))
        };

        let category = get(budget_columns::CATEGORY)?.clone();
        let limit = get(budget_columns::MONTHLY_LIMIT)?;
        let monthly_limit = limit.trim().parse().map_err(|_| {
            EngineError::MalformedRow(format!("budget for \"{category}\" is \"{limit}\""))
        })?;

        Ok(Self {
            category,
            monthly_limit,
        })
    }
}

/// Ledger kept in process memory.
#[derive(Clone, Default)]
pub struct MemoryLedger {
    rows: Arc<Mutex<Vec<LedgerRow>>>,
}

impl MemoryLedger {
    pub fn with_rows(rows: Vec<LedgerRow>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(rows)),
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn append(&self, transaction: &Transaction) -> ResultEngine<()> {
        self.rows.lock().await.push(transaction.to_row());
        Ok(())
    }

    async fn read_all(&self) -> ResultEngine<Vec<LedgerRow>> {
        Ok(self.rows.lock().await.clone())
    }
}

/// Budget table kept in process memory.
#[derive(Clone, Default)]
pub struct MemoryBudgets {
    entries: Arc<Vec<BudgetEntry>>,
}

impl MemoryBudgets {
    pub fn new(entries: Vec<BudgetEntry>) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }
}

#[async_trait]
impl BudgetTable for MemoryBudgets {
    async fn read_all(&self) -> ResultEngine<Vec<BudgetEntry>> {
        Ok(self.entries.as_ref().clone())
    }
}
