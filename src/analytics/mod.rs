//! Monthly aggregation of expenses and income.
//!
//! Everything here is a pure reduction over transactions that were already
//! fetched. Degenerate inputs (no transactions, zero totals, no budget)
//! produce zero values rather than errors. Sums saturate at the bounds of
//! `Decimal` instead of overflowing.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{Budget, Month, Owner, Transaction, TransactionKind};
use crate::store::{StoreResult, TransactionStore};

/// Spent share of the budget at which the month is flagged as a warning.
pub const WARNING_PERCENT: u32 = 90;
/// Spent share of the budget at which the month is flagged as exceeded.
pub const EXCEEDED_PERCENT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub total: Decimal,
    pub count: usize,
    pub average: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryShare {
    pub category: String,
    pub amount: Decimal,
    pub percentage: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BudgetStatus {
    pub percentage_used: Decimal,
    pub remaining: Decimal,
    pub is_warning: bool,
    pub is_exceeded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSummary {
    pub period: Month,
    pub label: String,
    pub expenses: Decimal,
    pub income: Decimal,
    pub net: Decimal,
}

/// Total, count and mean amount. The mean of nothing is 0.
pub fn summarize(transactions: &[Transaction]) -> Summary {
    let total = saturating_sum(transactions.iter().map(|t| t.amount));
    let count = transactions.len();
    let average = if count > 0 {
        total / Decimal::from(count)
    } else {
        Decimal::ZERO
    };
    Summary {
        total,
        count,
        average,
    }
}

/// Sum per category label, in order of first appearance.
///
/// Percentages are relative to the sum over all categories and are all
/// zero when that sum is zero.
pub fn category_breakdown(transactions: &[Transaction]) -> Vec<CategoryShare> {
    let mut shares: Vec<CategoryShare> = Vec::new();
    for txn in transactions {
        match shares.iter_mut().find(|s| s.category == txn.category) {
            Some(share) => share.amount = share.amount.saturating_add(txn.amount),
            None => shares.push(CategoryShare {
                category: txn.category.clone(),
                amount: txn.amount,
                percentage: Decimal::ZERO,
            }),
        }
    }

    let total = saturating_sum(shares.iter().map(|s| s.amount));
    for share in &mut shares {
        share.percentage = percent_of(share.amount, total);
    }
    shares
}

/// Largest categories first; equal amounts keep their breakdown order.
pub fn top_categories(shares: &[CategoryShare], limit: usize) -> Vec<CategoryShare> {
    let mut sorted = shares.to_vec();
    sorted.sort_by(|a, b| b.amount.cmp(&a.amount));
    sorted.truncate(limit);
    sorted
}

/// How much of `budget_amount` has been consumed by `total_spent`.
///
/// A non-positive budget (including "no budget", passed as zero) reports
/// 0% used. `remaining` goes negative once the budget is overspent.
pub fn budget_status(total_spent: Decimal, budget_amount: Decimal) -> BudgetStatus {
    let percentage_used = percent_of(total_spent, budget_amount);
    let warning = Decimal::from(WARNING_PERCENT);
    let exceeded = Decimal::from(EXCEEDED_PERCENT);
    BudgetStatus {
        percentage_used,
        remaining: budget_amount.saturating_sub(total_spent),
        is_warning: percentage_used >= warning && percentage_used < exceeded,
        is_exceeded: percentage_used >= exceeded,
    }
}

pub fn net_balance(income_total: Decimal, expense_total: Decimal) -> Decimal {
    income_total.saturating_sub(expense_total)
}

/// `n` consecutive months ending with the month of `reference`, oldest first.
///
/// `fetch` is asked for expenses and then income of every month, bounded by
/// the month's first and last day. The first fetch error aborts the series
/// and is returned as-is. Months before the earliest representable date are
/// left out, so the series is shorter than `n` only near `NaiveDate::MIN`.
pub fn trailing_periods<F, E>(
    n: usize,
    reference: NaiveDate,
    mut fetch: F,
) -> Result<Vec<PeriodSummary>, E>
where
    F: FnMut(TransactionKind, NaiveDate, NaiveDate) -> Result<Vec<Transaction>, E>,
{
    let last = Month::containing(reference);
    let n = n.min(last.months_since_min() + 1);
    let mut periods = Vec::new();
    for back in (0..n).rev() {
        let Some(month) = i32::try_from(back).ok().and_then(|b| last.checked_offset(-b)) else {
            continue;
        };
        let (from, to) = (month.first_day(), month.last_day());
        let expenses = summarize(&fetch(TransactionKind::Expense, from, to)?).total;
        let income = summarize(&fetch(TransactionKind::Income, from, to)?).total;
        periods.push(PeriodSummary {
            period: month,
            label: month.label(),
            expenses,
            income,
            net: net_balance(income, expenses),
        });
    }
    Ok(periods)
}

/// [`trailing_periods`] reading from a store on behalf of `owner`.
pub fn trailing_periods_from_store<S: TransactionStore>(
    store: &S,
    owner: &Owner,
    n: usize,
    reference: NaiveDate,
) -> StoreResult<Vec<PeriodSummary>> {
    trailing_periods(n, reference, |kind, from, to| {
        store.list_transactions(owner, kind, from, to)
    })
}

/// Everything the dashboard shows for one owner and one month.
#[derive(Debug, Clone)]
pub struct MonthReport {
    pub month: Month,
    pub expenses: Summary,
    pub income: Summary,
    pub net: Decimal,
    pub expense_breakdown: Vec<CategoryShare>,
    pub income_breakdown: Vec<CategoryShare>,
    pub budget: Option<Budget>,
    pub budget_status: BudgetStatus,
    pub trend: Vec<PeriodSummary>,
}

impl MonthReport {
    pub fn load<S: TransactionStore>(
        store: &S,
        owner: &Owner,
        month: Month,
        trend_months: usize,
    ) -> StoreResult<Self> {
        let (from, to) = (month.first_day(), month.last_day());
        let expense_txns = store.list_transactions(owner, TransactionKind::Expense, from, to)?;
        let income_txns = store.list_transactions(owner, TransactionKind::Income, from, to)?;
        let budget = store.get_budget(owner, month)?;
        let trend = trailing_periods_from_store(store, owner, trend_months, from)?;
        Ok(Self::from_parts(month, &expense_txns, &income_txns, budget, trend))
    }

    pub fn from_parts(
        month: Month,
        expense_txns: &[Transaction],
        income_txns: &[Transaction],
        budget: Option<Budget>,
        trend: Vec<PeriodSummary>,
    ) -> Self {
        let expenses = summarize(expense_txns);
        let income = summarize(income_txns);
        let budget_amount = budget.as_ref().map_or(Decimal::ZERO, |b| b.amount);
        Self {
            month,
            expenses,
            income,
            net: net_balance(income.total, expenses.total),
            expense_breakdown: category_breakdown(expense_txns),
            income_breakdown: category_breakdown(income_txns),
            budget_status: budget_status(expenses.total, budget_amount),
            budget,
            trend,
        }
    }
}

fn saturating_sum(amounts: impl Iterator<Item = Decimal>) -> Decimal {
    amounts.fold(Decimal::ZERO, Decimal::saturating_add)
}

/// `part` as a percentage of `whole`; saturates at `Decimal::MAX`.
fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    part.checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(whole))
        .or_else(|| {
            part.checked_div(whole)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        })
        .unwrap_or(Decimal::MAX)
}

#[cfg(test)]
mod tests;
