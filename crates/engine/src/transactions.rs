//! Transaction primitives.
//!
//! A [`Transaction`] is one ledger line: it is appended once and never
//! updated. What comes back from a store is a [`LedgerRow`], the raw text of
//! every column, because rows written by hand in the spreadsheet are not
//! guaranteed to be well formed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Amount, EngineError, ResultEngine};

/// Header names of the ledger worksheet, in column order.
pub mod columns {
    pub const TIMESTAMP: &str = "日期時間";
    pub const CATEGORY: &str = "分類";
    pub const TOOL: &str = "付款工具";
    pub const METHOD: &str = "付款方式";
    pub const DIRECTION: &str = "收入支出";
    pub const AMOUNT: &str = "金額";
    pub const NOTE: &str = "備註";

    pub const ALL: [&str; 7] = [TIMESTAMP, CATEGORY, TOOL, METHOD, DIRECTION, AMOUNT, NOTE];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Income,
    Expense,
}

impl Direction {
    /// Marker used both in chat messages and in the ledger column.
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Income => "+",
            Self::Expense => "-",
        }
    }

    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "+" => Some(Self::Income),
            "-" => Some(Self::Expense),
            _ => None,
        }
    }
}

/// A parsed message that has not been stamped yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionDraft {
    pub category: String,
    pub tool: String,
    pub method: String,
    pub direction: Direction,
    pub amount: Amount,
    pub note: String,
}

impl TransactionDraft {
    /// Fixes the draft at `timestamp`, already rendered in the display format.
    pub fn stamp(self, timestamp: String) -> Transaction {
        Transaction {
            timestamp,
            category: self.category,
            tool: self.tool,
            method: self.method,
            direction: self.direction,
            amount: self.amount,
            note: self.note,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub timestamp: String,
    pub category: String,
    pub tool: String,
    pub method: String,
    pub direction: Direction,
    pub amount: Amount,
    pub note: String,
}

impl Transaction {
    pub fn is_expense(&self) -> bool {
        self.direction == Direction::Expense
    }

    /// The row as it is persisted, in [`columns::ALL`] order.
    pub fn to_row(&self) -> LedgerRow {
        LedgerRow {
            timestamp: self.timestamp.clone(),
            category: self.category.clone(),
            tool: self.tool.clone(),
            method: self.method.clone(),
            direction: self.direction.marker().to_string(),
            amount: self.amount.to_string(),
            note: self.note.clone(),
        }
    }
}

/// One ledger row exactly as stored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerRow {
    pub timestamp: String,
    pub category: String,
    pub tool: String,
    pub method: String,
    pub direction: String,
    pub amount: String,
    pub note: String,
}

impl LedgerRow {
    /// Builds a row from a header-keyed record.
    ///
    /// Every ledger column must be present; values may be empty.
    pub fn from_record(record: &HashMap<String, String>) -> ResultEngine<Self> {
        let get = |name: &str| {
            record
                .get(name)
                .cloned()
                .ok_or_else(|| EngineError::MissingColumn(name.to_string()))
        };

        Ok(Self {
            timestamp: get(columns::TIMESTAMP)?,
            category: get(columns::CATEGORY)?,
            tool: get(columns::TOOL)?,
            method: get(columns::METHOD)?,
            direction: get(columns::DIRECTION)?,
            amount: get(columns::AMOUNT)?,
            note: get(columns::NOTE)?,
        })
    }

    /// Cells in [`columns::ALL`] order.
    pub fn cells(&self) -> [&str; 7] {
        [
            self.timestamp.as_str(),
            self.category.as_str(),
            self.tool.as_str(),
            self.method.as_str(),
            self.direction.as_str(),
            self.amount.as_str(),
            self.note.as_str(),
        ]
    }

    pub fn parse_amount(&self) -> ResultEngine<Amount> {
        self.amount.trim().parse()
    }
}
