mod budget;
mod month;
mod owner;
mod transaction;

pub use budget::Budget;
pub use month::Month;
pub use owner::Owner;
pub use transaction::{check_amount, Transaction, TransactionKind, TransactionUpdate, MAX_AMOUNT};

#[cfg(test)]
mod tests;
