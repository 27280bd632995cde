#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::store::StoreError;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn owner() -> Owner {
    Owner::new("alice").unwrap()
}

fn make_txn(kind: TransactionKind, amount: Decimal, category: &str) -> Transaction {
    Transaction::new(
        owner(),
        kind,
        "Test".into(),
        amount,
        category.into(),
        date(2024, 1, 15),
    )
}

// ── Owner ─────────────────────────────────────────────────────

#[test]
fn test_owner_trims_and_rejects_blank() {
    assert_eq!(Owner::new("  bob ").unwrap().as_str(), "bob");
    assert!(Owner::new("").is_none());
    assert!(Owner::new("   ").is_none());
}

// ── Month ─────────────────────────────────────────────────────

#[test]
fn test_month_containing() {
    let m = Month::containing(date(2024, 3, 31));
    assert_eq!(m.first_day(), date(2024, 3, 1));
    assert_eq!(m.to_string(), "2024-03");
}

#[test]
fn test_month_last_day() {
    assert_eq!(Month::new(2024, 2).unwrap().last_day(), date(2024, 2, 29));
    assert_eq!(Month::new(2023, 2).unwrap().last_day(), date(2023, 2, 28));
    assert_eq!(Month::new(2024, 4).unwrap().last_day(), date(2024, 4, 30));
    assert_eq!(Month::new(2024, 12).unwrap().last_day(), date(2024, 12, 31));
}

#[test]
fn test_month_offset_crosses_years() {
    let jan = Month::new(2024, 1).unwrap();
    assert_eq!(jan.prev(), Month::new(2023, 12).unwrap());
    assert_eq!(jan.offset(-5), Month::new(2023, 8).unwrap());
    assert_eq!(jan.offset(12), Month::new(2025, 1).unwrap());
    assert_eq!(Month::new(2023, 12).unwrap().next(), jan);
}

#[test]
fn test_month_checked_offset_at_calendar_bounds() {
    let earliest = Month::containing(NaiveDate::MIN);
    assert_eq!(earliest.checked_offset(-1), None);
    assert_eq!(earliest.offset(-1), earliest);
    assert_eq!(earliest.months_since_min(), 0);
    assert_eq!(earliest.offset(14).months_since_min(), 14);

    let latest = Month::containing(NaiveDate::MAX);
    assert_eq!(latest.checked_offset(1), None);
}

#[test]
fn test_month_parse() {
    assert_eq!(Month::parse("2024-01"), Month::new(2024, 1));
    assert_eq!(Month::parse("2024-01-20"), Month::new(2024, 1));
    assert!(Month::parse("2024-13").is_none());
    assert!(Month::parse("january").is_none());
    assert!(Month::parse("").is_none());
}

#[test]
fn test_month_label_and_contains() {
    let m = Month::new(2024, 1).unwrap();
    assert_eq!(m.label(), "Jan 2024");
    assert!(m.contains(date(2024, 1, 31)));
    assert!(!m.contains(date(2024, 2, 1)));
}

// ── TransactionKind ───────────────────────────────────────────

#[test]
fn test_kind_parse() {
    assert_eq!(TransactionKind::parse("expense"), Some(TransactionKind::Expense));
    assert_eq!(TransactionKind::parse("INCOME"), Some(TransactionKind::Income));
    assert_eq!(TransactionKind::parse("transfer"), None);
}

#[test]
fn test_kind_roundtrip() {
    for k in TransactionKind::all() {
        assert_eq!(TransactionKind::parse(k.as_str()), Some(*k));
    }
}

#[test]
fn test_categories_are_per_kind() {
    let exp = TransactionKind::Expense;
    let inc = TransactionKind::Income;
    assert_eq!(exp.find_category("food"), Some("Food"));
    assert_eq!(exp.find_category("Salary"), None);
    assert_eq!(inc.find_category("salary"), Some("Salary"));
    assert_eq!(inc.find_category("Transport"), None);
    // "Other" exists in both lists
    assert_eq!(exp.find_category("other"), Some("Other"));
    assert_eq!(inc.find_category("other"), Some("Other"));
}

// ── Transaction ───────────────────────────────────────────────

#[test]
fn test_signed_amount() {
    assert_eq!(
        make_txn(TransactionKind::Expense, dec!(42.99), "Food").signed_amount(),
        dec!(-42.99)
    );
    assert_eq!(
        make_txn(TransactionKind::Income, dec!(100), "Salary").signed_amount(),
        dec!(100)
    );
}

#[test]
fn test_validate_canonicalizes() {
    let mut txn = make_txn(TransactionKind::Expense, dec!(5.25), "fOOd");
    txn.title = "  Lunch  ".into();
    txn.validate().unwrap();
    assert_eq!(txn.category, "Food");
    assert_eq!(txn.title, "Lunch");
}

#[test]
fn test_validate_rejects_non_positive_amount() {
    let mut zero = make_txn(TransactionKind::Expense, Decimal::ZERO, "Food");
    assert!(matches!(
        zero.validate(),
        Err(StoreError::NonPositiveAmount(_))
    ));
    let mut negative = make_txn(TransactionKind::Income, dec!(-1), "Salary");
    assert!(matches!(
        negative.validate(),
        Err(StoreError::NonPositiveAmount(_))
    ));
}

#[test]
fn test_amount_upper_bound() {
    assert_eq!(MAX_AMOUNT, dec!(1000000000000));
    assert!(check_amount(MAX_AMOUNT).is_ok());
    assert!(matches!(
        check_amount(MAX_AMOUNT + dec!(0.01)),
        Err(StoreError::AmountTooLarge(_))
    ));
    let mut huge = make_txn(TransactionKind::Expense, dec!(1000000000000000000000000000), "Food");
    assert!(matches!(huge.validate(), Err(StoreError::AmountTooLarge(_))));
}

#[test]
fn test_validate_rejects_empty_title() {
    let mut txn = make_txn(TransactionKind::Expense, dec!(1), "Food");
    txn.title = "   ".into();
    assert!(matches!(txn.validate(), Err(StoreError::EmptyTitle)));
}

#[test]
fn test_validate_rejects_category_of_other_kind() {
    let mut txn = make_txn(TransactionKind::Income, dec!(1), "Food");
    assert!(matches!(
        txn.validate(),
        Err(StoreError::UnknownCategory {
            kind: TransactionKind::Income,
            ..
        })
    ));
}

#[test]
fn test_transaction_new_defaults() {
    let txn = make_txn(TransactionKind::Expense, dec!(3), "Food");
    assert!(txn.id.is_none());
    assert!(!txn.is_income());
    assert!(!txn.created_at.is_empty());
}

// ── TransactionUpdate ─────────────────────────────────────────

#[test]
fn test_update_apply_partial() {
    let mut txn = make_txn(TransactionKind::Expense, dec!(10), "Food");
    let update = TransactionUpdate {
        amount: Some(dec!(12.50)),
        date: Some(date(2024, 2, 1)),
        ..Default::default()
    };
    assert!(!update.is_empty());
    update.apply(&mut txn);
    assert_eq!(txn.amount, dec!(12.50));
    assert_eq!(txn.date, date(2024, 2, 1));
    assert_eq!(txn.title, "Test");
    assert_eq!(txn.category, "Food");
}

#[test]
fn test_update_default_is_empty() {
    assert!(TransactionUpdate::default().is_empty());
}

// ── Budget ────────────────────────────────────────────────────

#[test]
fn test_budget_new() {
    let budget = Budget::new(owner(), Month::new(2024, 1).unwrap(), dec!(500));
    assert!(budget.id.is_none());
    assert_eq!(budget.owner.as_str(), "alice");
    assert_eq!(budget.period.to_string(), "2024-01");
    assert_eq!(budget.amount, dec!(500));
}
