#![allow(clippy::unwrap_used)]

use std::cell::RefCell;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::db::Database;
use crate::models::{Budget, Month, Owner, Transaction, TransactionKind};
use crate::store::StoreError;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn owner() -> Owner {
    Owner::new("alice").unwrap()
}

fn txn(kind: TransactionKind, amount: Decimal, category: &str, on: NaiveDate) -> Transaction {
    Transaction::new(owner(), kind, "t".into(), amount, category.into(), on)
}

fn expense(amount: Decimal, category: &str) -> Transaction {
    txn(TransactionKind::Expense, amount, category, date(2024, 1, 15))
}

fn food_and_transport() -> Vec<Transaction> {
    vec![
        expense(dec!(100), "Food"),
        expense(dec!(300), "Food"),
        expense(dec!(200), "Transport"),
    ]
}

// ── summarize ─────────────────────────────────────────────────

#[test]
fn test_summarize_empty_is_all_zero() {
    let s = summarize(&[]);
    assert_eq!(s.total, Decimal::ZERO);
    assert_eq!(s.count, 0);
    assert_eq!(s.average, Decimal::ZERO);
}

#[test]
fn test_summarize_food_and_transport() {
    let s = summarize(&food_and_transport());
    assert_eq!(s.total, dec!(600));
    assert_eq!(s.count, 3);
    assert_eq!(s.average, dec!(200));
}

#[test]
fn test_summarize_cents_are_exact() {
    let txns = vec![expense(dec!(0.10), "Food"), expense(dec!(0.20), "Food")];
    assert_eq!(summarize(&txns).total, dec!(0.30));
}

// ── category_breakdown ────────────────────────────────────────

#[test]
fn test_breakdown_food_and_transport() {
    let shares = category_breakdown(&food_and_transport());
    assert_eq!(shares.len(), 2);

    assert_eq!(shares[0].category, "Food");
    assert_eq!(shares[0].amount, dec!(400));
    assert_eq!(shares[0].percentage.round_dp(1), dec!(66.7));

    assert_eq!(shares[1].category, "Transport");
    assert_eq!(shares[1].amount, dec!(200));
    assert_eq!(shares[1].percentage.round_dp(1), dec!(33.3));
}

#[test]
fn test_breakdown_keeps_first_occurrence_order() {
    let txns = vec![
        expense(dec!(1), "Transport"),
        expense(dec!(50), "Food"),
        expense(dec!(2), "Transport"),
        expense(dec!(7), "Housing"),
    ];
    let names: Vec<String> = category_breakdown(&txns)
        .into_iter()
        .map(|s| s.category)
        .collect();
    assert_eq!(names, vec!["Transport", "Food", "Housing"]);
}

#[test]
fn test_breakdown_amounts_sum_to_total() {
    let txns = vec![
        expense(dec!(12.34), "Food"),
        expense(dec!(0.01), "Other"),
        expense(dec!(99.99), "Shopping"),
        expense(dec!(5.55), "Food"),
        expense(dec!(1000), "Housing"),
    ];
    let sum: Decimal = category_breakdown(&txns).iter().map(|s| s.amount).sum();
    assert_eq!(sum, summarize(&txns).total);
}

#[test]
fn test_breakdown_percentages_sum_to_hundred() {
    let txns = vec![
        expense(dec!(1), "Food"),
        expense(dec!(1), "Transport"),
        expense(dec!(1), "Housing"),
    ];
    let sum: Decimal = category_breakdown(&txns).iter().map(|s| s.percentage).sum();
    assert!((sum - dec!(100)).abs() < dec!(0.000001), "sum was {sum}");
}

#[test]
fn test_breakdown_zero_total_gives_zero_percentages() {
    // The store never persists zero amounts; the engine still must not divide by zero.
    let txns = vec![expense(Decimal::ZERO, "Food"), expense(Decimal::ZERO, "Transport")];
    let shares = category_breakdown(&txns);
    assert_eq!(shares.len(), 2);
    assert!(shares.iter().all(|s| s.percentage == Decimal::ZERO));
}

#[test]
fn test_breakdown_empty() {
    assert!(category_breakdown(&[]).is_empty());
}

#[test]
fn test_breakdown_labels_match_exactly() {
    let txns = vec![expense(dec!(1), "Food"), expense(dec!(1), "food")];
    assert_eq!(category_breakdown(&txns).len(), 2);
}

// ── top_categories ────────────────────────────────────────────

#[test]
fn test_top_categories_sorted_and_truncated() {
    let txns = vec![
        expense(dec!(10), "Food"),
        expense(dec!(30), "Housing"),
        expense(dec!(10), "Transport"),
        expense(dec!(5), "Other"),
    ];
    let top = top_categories(&category_breakdown(&txns), 3);
    let names: Vec<&str> = top.iter().map(|s| s.category.as_str()).collect();
    // Food and Transport tie; Food appeared first
    assert_eq!(names, vec!["Housing", "Food", "Transport"]);
}

// ── budget_status ─────────────────────────────────────────────

#[test]
fn test_budget_status_zero_budget() {
    let s = budget_status(Decimal::ZERO, Decimal::ZERO);
    assert_eq!(s.percentage_used, Decimal::ZERO);
    assert_eq!(s.remaining, Decimal::ZERO);
    assert!(!s.is_warning);
    assert!(!s.is_exceeded);
}

#[test]
fn test_budget_status_warning() {
    let s = budget_status(dec!(950), dec!(1000));
    assert_eq!(s.percentage_used, dec!(95));
    assert_eq!(s.remaining, dec!(50));
    assert!(s.is_warning);
    assert!(!s.is_exceeded);
}

#[test]
fn test_budget_status_exceeded() {
    let s = budget_status(dec!(1200), dec!(1000));
    assert_eq!(s.percentage_used, dec!(120));
    assert_eq!(s.remaining, dec!(-200));
    assert!(!s.is_warning);
    assert!(s.is_exceeded);
}

#[test]
fn test_budget_status_thresholds_are_exact() {
    let below = budget_status(dec!(899.99), dec!(1000));
    assert!(!below.is_warning && !below.is_exceeded);

    let at_warning = budget_status(dec!(900), dec!(1000));
    assert!(at_warning.is_warning && !at_warning.is_exceeded);

    let just_under = budget_status(dec!(999.99), dec!(1000));
    assert!(just_under.is_warning && !just_under.is_exceeded);

    let at_limit = budget_status(dec!(1000), dec!(1000));
    assert!(!at_limit.is_warning && at_limit.is_exceeded);
    assert_eq!(at_limit.remaining, Decimal::ZERO);
}

#[test]
fn test_budget_status_negative_budget_is_zero_percent() {
    let s = budget_status(dec!(50), dec!(-10));
    assert_eq!(s.percentage_used, Decimal::ZERO);
    assert_eq!(s.remaining, dec!(-60));
    assert!(!s.is_exceeded);
}

#[test]
fn test_budget_status_spending_without_budget() {
    let s = budget_status(dec!(80), Decimal::ZERO);
    assert_eq!(s.percentage_used, Decimal::ZERO);
    assert_eq!(s.remaining, dec!(-80));
}

#[test]
fn test_net_balance() {
    assert_eq!(net_balance(dec!(3000), dec!(1200.50)), dec!(1799.50));
    assert_eq!(net_balance(dec!(0), dec!(10)), dec!(-10));
}

// ── trailing_periods ──────────────────────────────────────────

fn sample_ledger() -> Vec<Transaction> {
    vec![
        txn(TransactionKind::Expense, dec!(100), "Food", date(2023, 12, 31)),
        txn(TransactionKind::Expense, dec!(50), "Food", date(2024, 1, 1)),
        txn(TransactionKind::Income, dec!(2000), "Salary", date(2024, 1, 31)),
        txn(TransactionKind::Expense, dec!(25), "Transport", date(2024, 2, 29)),
        txn(TransactionKind::Expense, dec!(999), "Food", date(2024, 3, 1)),
    ]
}

fn fetch_from<'a>(
    ledger: &'a [Transaction],
) -> impl FnMut(TransactionKind, NaiveDate, NaiveDate) -> Result<Vec<Transaction>, String> + 'a {
    move |kind, from, to| {
        Ok(ledger
            .iter()
            .filter(|t| t.kind == kind && t.date >= from && t.date <= to)
            .cloned()
            .collect())
    }
}

#[test]
fn test_trailing_periods_six_months_oldest_first() {
    let ledger = sample_ledger();
    let periods = trailing_periods(6, date(2024, 2, 10), fetch_from(&ledger)).unwrap();

    assert_eq!(periods.len(), 6);
    let months: Vec<String> = periods.iter().map(|p| p.period.to_string()).collect();
    assert_eq!(
        months,
        vec!["2023-09", "2023-10", "2023-11", "2023-12", "2024-01", "2024-02"]
    );
    assert_eq!(periods[5].period, Month::containing(date(2024, 2, 10)));
    assert_eq!(periods[5].label, "Feb 2024");
}

#[test]
fn test_trailing_periods_totals_and_net() {
    let ledger = sample_ledger();
    let periods = trailing_periods(3, date(2024, 2, 1), fetch_from(&ledger)).unwrap();

    let dec_2023 = &periods[0];
    assert_eq!(dec_2023.expenses, dec!(100));
    assert_eq!(dec_2023.income, Decimal::ZERO);
    assert_eq!(dec_2023.net, dec!(-100));

    let jan = &periods[1];
    assert_eq!(jan.expenses, dec!(50));
    assert_eq!(jan.income, dec!(2000));
    assert_eq!(jan.net, dec!(1950));

    // Feb 29 is inside February of a leap year; Mar 1 is not.
    let feb = &periods[2];
    assert_eq!(feb.expenses, dec!(25));
    assert_eq!(feb.net, dec!(-25));
}

#[test]
fn test_trailing_periods_queries_calendar_bounds() {
    let calls = RefCell::new(Vec::new());
    let periods = trailing_periods(2, date(2024, 3, 15), |kind, from, to| {
        calls.borrow_mut().push((kind, from, to));
        Ok::<_, String>(Vec::new())
    })
    .unwrap();
    assert_eq!(periods.len(), 2);

    let calls = calls.into_inner();
    assert_eq!(
        calls,
        vec![
            (TransactionKind::Expense, date(2024, 2, 1), date(2024, 2, 29)),
            (TransactionKind::Income, date(2024, 2, 1), date(2024, 2, 29)),
            (TransactionKind::Expense, date(2024, 3, 1), date(2024, 3, 31)),
            (TransactionKind::Income, date(2024, 3, 1), date(2024, 3, 31)),
        ]
    );
}

#[test]
fn test_trailing_periods_zero_length() {
    let periods = trailing_periods(0, date(2024, 3, 15), |_, _, _| {
        Err::<Vec<Transaction>, _>("must not be called")
    })
    .unwrap();
    assert!(periods.is_empty());
}

#[test]
fn test_trailing_periods_propagates_fetch_failure() {
    let mut calls = 0;
    let result = trailing_periods(6, date(2024, 3, 15), |_, _, _| {
        calls += 1;
        if calls == 3 {
            Err("store unreachable".to_string())
        } else {
            Ok(Vec::new())
        }
    });
    assert_eq!(result, Err("store unreachable".to_string()));
    assert_eq!(calls, 3);
}

#[test]
fn test_trailing_periods_huge_count_stops_at_earliest_month() {
    let earliest = Month::containing(NaiveDate::MIN);
    let reference = earliest.offset(2).first_day();
    let periods = trailing_periods(usize::MAX / 8, reference, |_, _, _| {
        Ok::<_, String>(Vec::new())
    })
    .unwrap();

    let months: Vec<Month> = periods.iter().map(|p| p.period).collect();
    assert_eq!(months, vec![earliest, earliest.offset(1), earliest.offset(2)]);
}

// ── large amounts ─────────────────────────────────────────────

#[test]
fn test_breakdown_of_huge_amount_does_not_overflow() {
    let huge = dec!(1000000000000000000000000000);
    let shares = category_breakdown(&[expense(huge, "Food")]);
    assert_eq!(shares[0].amount, huge);
    assert_eq!(shares[0].percentage, dec!(100));
}

#[test]
fn test_summarize_saturates_instead_of_overflowing() {
    let half_max = dec!(50000000000000000000000000000);
    let s = summarize(&[expense(half_max, "Food"), expense(half_max, "Food")]);
    assert_eq!(s.total, Decimal::MAX);
    assert_eq!(s.count, 2);
    assert!(s.average > Decimal::ZERO);
}

#[test]
fn test_budget_status_with_tiny_budget_and_huge_spend() {
    let s = budget_status(dec!(1000000000000000000000000000), dec!(0.0000001));
    assert!(s.is_exceeded);
    assert!(!s.is_warning);
    assert!(s.remaining < Decimal::ZERO);
}

#[test]
fn test_net_balance_saturates() {
    assert_eq!(net_balance(Decimal::MIN, Decimal::MAX), Decimal::MIN);
}

#[test]
fn test_month_report_with_largest_storable_amounts() {
    let db = Database::open_in_memory().unwrap();
    for day in 1..=3 {
        db.create_transaction(&Transaction::new(
            owner(),
            TransactionKind::Expense,
            "Big".into(),
            crate::models::MAX_AMOUNT,
            "Housing".into(),
            date(2024, 5, day),
        ))
        .unwrap();
    }
    db.upsert_budget(&Budget::new(owner(), Month::new(2024, 5).unwrap(), dec!(1)))
        .unwrap();

    let report = MonthReport::load(&db, &owner(), Month::new(2024, 5).unwrap(), 3).unwrap();
    assert_eq!(report.expenses.total, crate::models::MAX_AMOUNT * dec!(3));
    assert_eq!(report.expense_breakdown[0].percentage, dec!(100));
    assert!(report.budget_status.is_exceeded);
}

// ── store-backed ──────────────────────────────────────────────

fn seeded_db() -> Database {
    let db = Database::open_in_memory().unwrap();
    for t in sample_ledger() {
        db.create_transaction(&t).unwrap();
    }
    let other = Owner::new("bob").unwrap();
    db.create_transaction(&Transaction::new(
        other,
        TransactionKind::Expense,
        "Not mine".into(),
        dec!(5000),
        "Housing".into(),
        date(2024, 1, 10),
    ))
    .unwrap();
    db
}

#[test]
fn test_trailing_periods_from_store_is_owner_scoped() {
    let db = seeded_db();
    let periods = trailing_periods_from_store(&db, &owner(), 2, date(2024, 1, 20)).unwrap();
    assert_eq!(periods.len(), 2);
    assert_eq!(periods[0].expenses, dec!(100));
    assert_eq!(periods[1].expenses, dec!(50));
    assert_eq!(periods[1].income, dec!(2000));
}

#[test]
fn test_month_report_load() {
    let db = seeded_db();
    let jan = Month::new(2024, 1).unwrap();
    db.upsert_budget(&Budget::new(owner(), jan, dec!(55))).unwrap();

    let report = MonthReport::load(&db, &owner(), jan, 6).unwrap();
    assert_eq!(report.month, jan);
    assert_eq!(report.expenses.total, dec!(50));
    assert_eq!(report.income.total, dec!(2000));
    assert_eq!(report.net, dec!(1950));
    assert_eq!(report.expense_breakdown.len(), 1);
    assert_eq!(report.expense_breakdown[0].percentage, dec!(100));
    assert_eq!(report.income_breakdown[0].category, "Salary");
    assert!(report.budget.is_some());
    assert!(report.budget_status.is_warning);
    assert_eq!(report.budget_status.remaining, dec!(5));
    assert_eq!(report.trend.len(), 6);
    assert_eq!(report.trend[5].period, jan);
}

#[test]
fn test_month_report_empty_month_without_budget() {
    let db = Database::open_in_memory().unwrap();
    let report = MonthReport::load(&db, &owner(), Month::new(2030, 6).unwrap(), 6).unwrap();
    assert_eq!(report.expenses, Summary::default());
    assert_eq!(report.net, Decimal::ZERO);
    assert!(report.expense_breakdown.is_empty());
    assert!(report.budget.is_none());
    assert_eq!(report.budget_status, BudgetStatus::default());
    assert!(report.trend.iter().all(|p| p.net == Decimal::ZERO));
}

struct FailingStore;

impl TransactionStore for FailingStore {
    fn list_transactions(
        &self,
        _owner: &Owner,
        _kind: TransactionKind,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> crate::store::StoreResult<Vec<Transaction>> {
        Err(StoreError::Database(rusqlite::Error::InvalidQuery))
    }

    fn get_budget(
        &self,
        _owner: &Owner,
        _period: Month,
    ) -> crate::store::StoreResult<Option<Budget>> {
        Ok(None)
    }
}

#[test]
fn test_month_report_surfaces_store_failure() {
    let result = MonthReport::load(&FailingStore, &owner(), Month::new(2024, 1).unwrap(), 6);
    assert!(matches!(result, Err(StoreError::Database(_))));
}
