use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::Owner;
use crate::store::StoreError;

pub const EXPENSE_CATEGORIES: &[&str] = &[
    "Food",
    "Transport",
    "Housing",
    "Utilities",
    "Entertainment",
    "Healthcare",
    "Shopping",
    "Education",
    "Other",
];

/// Largest amount a transaction or budget may hold (one trillion).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Amounts must be positive and at most [`MAX_AMOUNT`].
pub fn check_amount(amount: Decimal) -> Result<(), StoreError> {
    if amount <= Decimal::ZERO {
        return Err(StoreError::NonPositiveAmount(amount));
    }
    if amount > MAX_AMOUNT {
        return Err(StoreError::AmountTooLarge(amount));
    }
    Ok(())
}

pub const INCOME_CATEGORIES: &[&str] = &[
    "Salary",
    "Freelance",
    "Investment",
    "Business",
    "Gift",
    "Other",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Expense,
    Income,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "Expense",
            Self::Income => "Income",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "expense" | "expenses" | "e" => Some(Self::Expense),
            "income" | "incomes" | "i" => Some(Self::Income),
            _ => None,
        }
    }

    pub fn all() -> &'static [TransactionKind] {
        &[Self::Expense, Self::Income]
    }

    /// The closed list of category labels allowed for this kind.
    pub fn categories(&self) -> &'static [&'static str] {
        match self {
            Self::Expense => EXPENSE_CATEGORIES,
            Self::Income => INCOME_CATEGORIES,
        }
    }

    /// Case-insensitive lookup returning the canonical spelling.
    pub fn find_category(&self, name: &str) -> Option<&'static str> {
        let lower = name.trim().to_lowercase();
        self.categories()
            .iter()
            .copied()
            .find(|c| c.to_lowercase() == lower)
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: Option<i64>,
    pub owner: Owner,
    pub kind: TransactionKind,
    pub title: String,
    pub amount: Decimal,
    pub category: String,
    pub date: NaiveDate,
    pub created_at: String,
}

impl Transaction {
    pub fn new(
        owner: Owner,
        kind: TransactionKind,
        title: String,
        amount: Decimal,
        category: String,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            owner,
            kind,
            title,
            amount,
            category,
            date,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    /// Amount with the sign a ledger would show: expenses negative.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionKind::Expense => -self.amount,
            TransactionKind::Income => self.amount,
        }
    }

    /// Check the write-time invariants and canonicalize the category.
    pub fn validate(&mut self) -> Result<(), StoreError> {
        check_amount(self.amount)?;
        let title = self.title.trim();
        if title.is_empty() {
            return Err(StoreError::EmptyTitle);
        }
        self.title = title.to_string();
        let category = self.kind.find_category(&self.category).ok_or_else(|| {
            StoreError::UnknownCategory {
                kind: self.kind,
                category: self.category.clone(),
            }
        })?;
        self.category = category.to_string();
        Ok(())
    }
}

/// Partial edit of a stored transaction. Owner, kind and id never change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionUpdate {
    pub title: Option<String>,
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
}

impl TransactionUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.amount.is_none() && self.category.is_none() && self.date.is_none()
    }

    pub fn apply(&self, txn: &mut Transaction) {
        if let Some(title) = &self.title {
            txn.title = title.clone();
        }
        if let Some(amount) = self.amount {
            txn.amount = amount;
        }
        if let Some(category) = &self.category {
            txn.category = category.clone();
        }
        if let Some(date) = self.date {
            txn.date = date;
        }
    }
}
