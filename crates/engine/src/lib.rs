//! Ledger engine.
//!
//! The engine turns one chat line into a ledger row and a reply text:
//!
//! 1. [`parse_message`] validates the line;
//! 2. the draft is stamped with the clock and appended to the [`LedgerStore`];
//! 3. for expenses the ledger is read back and the monthly budget of the
//!    category is evaluated against the [`BudgetTable`];
//! 4. [`Outcome::reply_text`] renders the answer.
//!
//! Budget evaluation never fails the request: once the row is appended any
//! store error only downgrades the budget line to a warning.

use std::sync::Arc;

pub use amount::{Amount, Grouped};
pub use budget::{
    BudgetOutcome, BudgetSummary, CalendarMonthFilter, MonthFilter, PrefixMonthFilter,
    budget_map, monthly_spent, summarize,
};
pub use clock::{Clock, FixedClock, MONTH_FORMAT, SystemClock, TIMESTAMP_FORMAT};
pub use error::{EngineError, ParseError};
pub use parsing::parse_message;
pub use store::{BudgetEntry, BudgetTable, LedgerStore, MemoryBudgets, MemoryLedger, budget_columns};
pub use transactions::{Direction, LedgerRow, Transaction, TransactionDraft, columns};

mod amount;
mod budget;
mod clock;
mod error;
mod parsing;
pub mod reply;
mod store;
mod transactions;

type ResultEngine<T> = Result<T, EngineError>;

/// What happened to one inbound message.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// The line was not a valid entry; nothing was written.
    Rejected(ParseError),
    /// The ledger refused the row.
    AppendFailed(EngineError),
    /// The row is in the ledger. `budget` is `None` for incomes.
    Recorded {
        transaction: Transaction,
        budget: Option<BudgetOutcome>,
    },
}

impl Outcome {
    pub fn reply_text(&self) -> String {
        match self {
            Outcome::Rejected(err) => err.user_message().to_string(),
            Outcome::AppendFailed(_) => reply::APPEND_FAILED.to_string(),
            Outcome::Recorded {
                transaction,
                budget,
            } => reply::render_recorded(transaction, budget.as_ref()),
        }
    }
}

pub struct Engine {
    ledger: Arc<dyn LedgerStore>,
    budgets: Arc<dyn BudgetTable>,
    clock: Arc<dyn Clock>,
    month_filter: Arc<dyn MonthFilter>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Handles one chat line from parse to reply.
    pub async fn handle_text(&self, text: &str) -> Outcome {
        let draft = match parse_message(text) {
            Ok(draft) => draft,
            Err(err) => {
                tracing::debug!("rejected message: {err}");
                return Outcome::Rejected(err);
            }
        };

        let now = self.clock.now();
        let transaction = draft.stamp(clock::format_timestamp(&now));

        if let Err(err) = self.ledger.append(&transaction).await {
            tracing::error!("failed to append transaction: {err}");
            return Outcome::AppendFailed(err);
        }
        tracing::info!(
            "recorded {} {} {}",
            transaction.direction.marker(),
            transaction.category,
            transaction.amount
        );

        let budget = if transaction.is_expense() {
            Some(self.evaluate_budget(&transaction, &now).await)
        } else {
            None
        };

        Outcome::Recorded {
            transaction,
            budget,
        }
    }

    /// Evaluates the monthly budget of an appended expense.
    ///
    /// Store failures are logged and reported as
    /// [`BudgetOutcome::BudgetUnavailable`].
    pub async fn evaluate_budget(
        &self,
        transaction: &Transaction,
        now: &chrono::DateTime<chrono_tz::Tz>,
    ) -> BudgetOutcome {
        match self.try_evaluate_budget(transaction, now).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(
                    "budget evaluation for \"{}\" failed: {err}",
                    transaction.category
                );
                BudgetOutcome::BudgetUnavailable
            }
        }
    }

    async fn try_evaluate_budget(
        &self,
        transaction: &Transaction,
        now: &chrono::DateTime<chrono_tz::Tz>,
    ) -> ResultEngine<BudgetOutcome> {
        let budgets = budget_map(self.budgets.read_all().await?);
        let Some(&monthly_limit) = budgets.get(&transaction.category) else {
            return Ok(BudgetOutcome::NoBudgetConfigured);
        };

        let month_key = self.month_filter.month_key(now);
        let rows = self.ledger.read_all().await?;
        let spent = monthly_spent(
            &rows,
            &transaction.category,
            &month_key,
            self.month_filter.as_ref(),
        )?;

        summarize(&transaction.category, monthly_limit, spent).map(BudgetOutcome::Summary)
    }
}

#[derive(Default)]
pub struct EngineBuilder {
    ledger: Option<Arc<dyn LedgerStore>>,
    budgets: Option<Arc<dyn BudgetTable>>,
    clock: Option<Arc<dyn Clock>>,
    month_filter: Option<Arc<dyn MonthFilter>>,
}

impl EngineBuilder {
    /// Pass the required ledger store
    pub fn ledger(mut self, ledger: Arc<dyn LedgerStore>) -> EngineBuilder {
        self.ledger = Some(ledger);
        self
    }

    /// Pass the required budget table
    pub fn budgets(mut self, budgets: Arc<dyn BudgetTable>) -> EngineBuilder {
        self.budgets = Some(budgets);
        self
    }

    /// Defaults to [`SystemClock`] in UTC.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> EngineBuilder {
        self.clock = Some(clock);
        self
    }

    /// Defaults to [`PrefixMonthFilter`].
    pub fn month_filter(mut self, filter: Arc<dyn MonthFilter>) -> EngineBuilder {
        self.month_filter = Some(filter);
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> Result<Engine, EngineError> {
        Ok(Engine {
            ledger: self
                .ledger
                .ok_or(EngineError::MissingCollaborator("ledger store"))?,
            budgets: self
                .budgets
                .ok_or(EngineError::MissingCollaborator("budget table"))?,
            clock: self
                .clock
                .unwrap_or_else(|| Arc::new(SystemClock::new(chrono_tz::UTC))),
            month_filter: self
                .month_filter
                .unwrap_or_else(|| Arc::new(PrefixMonthFilter)),
        })
    }
}
