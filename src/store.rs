use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{Budget, Month, Owner, Transaction, TransactionKind};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("amount must be greater than zero (got {0})")]
    NonPositiveAmount(Decimal),
    #[error("amount {0} exceeds the maximum of 1,000,000,000,000")]
    AmountTooLarge(Decimal),
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("unknown {kind} category '{category}'")]
    UnknownCategory {
        kind: TransactionKind,
        category: String,
    },
    #[error("transaction {0} not found")]
    NotFound(i64),
    #[error("transaction {0} belongs to another user")]
    Unauthorized(i64),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read side of the transaction store, as consumed by the analytics.
///
/// Implementations must only return rows owned by `owner` and must not
/// mutate anything; callers re-query freely after every write.
pub trait TransactionStore {
    /// Transactions of `kind` dated within `from..=to`, oldest first.
    fn list_transactions(
        &self,
        owner: &Owner,
        kind: TransactionKind,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Transaction>>;

    fn get_budget(&self, owner: &Owner, period: Month) -> StoreResult<Option<Budget>>;
}
