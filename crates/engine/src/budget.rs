//! Monthly budget evaluation.
//!
//! After an expense is appended the ledger is read back in full and every
//! expense of the same category in the current calendar month is summed. The
//! just-appended row is part of that sum because it is already in the
//! ledger; the triggering amount is never added separately.
//!
//! Which rows belong to "this month" is decided by a [`MonthFilter`]. The
//! default [`PrefixMonthFilter`] compares the stored timestamp text against
//! the month key (`2026年10月`) with a plain prefix check, so a ledger whose
//! timestamps were written in another format silently drops out of the sum.
//! [`CalendarMonthFilter`] parses the timestamp instead.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDateTime};
use chrono_tz::Tz;

use crate::{
    Amount, BudgetEntry, Direction, EngineError, LedgerRow, ResultEngine,
    clock::{self, TIMESTAMP_FORMAT},
};

/// Decides whether a stored timestamp falls in the evaluation month.
pub trait MonthFilter: Send + Sync {
    /// Key computed once per evaluation from the current time.
    fn month_key(&self, now: &DateTime<Tz>) -> String {
        clock::format_month(now)
    }

    fn matches(&self, timestamp: &str, month_key: &str) -> bool;
}

/// Byte-for-byte prefix comparison on the formatted timestamp.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrefixMonthFilter;

impl MonthFilter for PrefixMonthFilter {
    fn matches(&self, timestamp: &str, month_key: &str) -> bool {
        timestamp.starts_with(month_key)
    }
}

/// Parses the timestamp with [`TIMESTAMP_FORMAT`] and compares year and
/// month. Unparseable timestamps never match.
#[derive(Clone, Copy, Debug, Default)]
pub struct CalendarMonthFilter;

impl MonthFilter for CalendarMonthFilter {
    fn month_key(&self, now: &DateTime<Tz>) -> String {
        format!("{:04}-{:02}", now.year(), now.month())
    }

    fn matches(&self, timestamp: &str, month_key: &str) -> bool {
        NaiveDateTime::parse_from_str(timestamp.trim(), TIMESTAMP_FORMAT)
            .map(|at| format!("{:04}-{:02}", at.year(), at.month()) == month_key)
            .unwrap_or(false)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BudgetSummary {
    pub category: String,
    pub monthly_limit: Amount,
    pub monthly_spent: Amount,
    /// `monthly_limit - monthly_spent`; negative when over budget.
    pub remaining: Amount,
}

/// Result of evaluating the budget of an expense.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BudgetOutcome {
    Summary(BudgetSummary),
    /// The category has no row in the budget table.
    NoBudgetConfigured,
    /// A store could not be read or one of its rows could not be interpreted.
    BudgetUnavailable,
}

/// Collects budget rows into a category lookup. A repeated category keeps
/// its last row.
pub fn budget_map(entries: Vec<BudgetEntry>) -> HashMap<String, Amount> {
    let mut map = HashMap::with_capacity(entries.len());
    for entry in entries {
        if let Some(previous) = map.insert(entry.category.clone(), entry.monthly_limit) {
            tracing::warn!(
                "budget table repeats category \"{}\" ({} replaced by {})",
                entry.category,
                previous,
                entry.monthly_limit
            );
        }
    }
    map
}

/// Sums the expenses of `category` whose timestamp matches `month_key`.
///
/// Only selected rows have their amount parsed, so a broken amount in an
/// unrelated row is ignored.
pub fn monthly_spent(
    rows: &[LedgerRow],
    category: &str,
    month_key: &str,
    filter: &dyn MonthFilter,
) -> ResultEngine<Amount> {
    rows.iter()
        .filter(|row| {
            row.category == category
                && row.direction == Direction::Expense.marker()
                && filter.matches(&row.timestamp, month_key)
        })
        .try_fold(Amount::ZERO, |total, row| {
            total
                .checked_add(row.parse_amount()?)
                .ok_or_else(|| EngineError::Overflow(category.to_string()))
        })
}

pub fn summarize(
    category: &str,
    monthly_limit: Amount,
    monthly_spent: Amount,
) -> ResultEngine<BudgetSummary> {
    let remaining = monthly_limit
        .checked_sub(monthly_spent)
        .ok_or_else(|| EngineError::Overflow(category.to_string()))?;

    Ok(BudgetSummary {
        category: category.to_string(),
        monthly_limit,
        monthly_spent,
        remaining,
    })
}
