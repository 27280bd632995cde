use rust_decimal::Decimal;

use super::{Month, Owner};

/// Spending ceiling for one owner and one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    pub id: Option<i64>,
    pub owner: Owner,
    pub period: Month,
    pub amount: Decimal,
}

impl Budget {
    pub fn new(owner: Owner, period: Month, amount: Decimal) -> Self {
        Self {
            id: None,
            owner,
            period,
            amount,
        }
    }
}
