//! The module contains the errors the engine can throw.
//!
//! Two families are kept apart:
//!
//! - [`ParseError`] rejects an inbound message. It is terminal for that
//!   message: the user receives a corrective reply and nothing is persisted.
//! - [`EngineError`] reports a failure of a store collaborator or a row that
//!   could not be interpreted. During budget evaluation these are degraded to
//!   [`BudgetOutcome::BudgetUnavailable`].
//!
//!  [`BudgetOutcome::BudgetUnavailable`]: crate::BudgetOutcome::BudgetUnavailable
use thiserror::Error;

/// Reasons a chat message is not a valid ledger entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected 6 comma separated fields, found {0}")]
    MalformedInput(usize),
    #[error("invalid direction marker \"{0}\"")]
    InvalidDirection(String),
    #[error("invalid amount \"{0}\"")]
    InvalidAmount(String),
}

impl ParseError {
    /// Text sent back to the user when the message is rejected.
    pub fn user_message(&self) -> &'static str {
        match self {
            ParseError::MalformedInput(_) => crate::reply::FORMAT_HINT,
            ParseError::InvalidDirection(_) => "請填入 + 表示收入，- 表示支出",
            ParseError::InvalidAmount(_) => "金額需為數字",
        }
    }
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("\"{0}\" column not found")]
    MissingColumn(String),
    #[error("malformed row: {0}")]
    MalformedRow(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("amount overflow while summing \"{0}\"")]
    Overflow(String),
    #[error("engine is missing its {0}")]
    MissingCollaborator(&'static str),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Storage(a), Self::Storage(b)) => a == b,
            (Self::MissingColumn(a), Self::MissingColumn(b)) => a == b,
            (Self::MalformedRow(a), Self::MalformedRow(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::Overflow(a), Self::Overflow(b)) => a == b,
            (Self::MissingCollaborator(a), Self::MissingCollaborator(b)) => a == b,
            _ => false,
        }
    }
}
