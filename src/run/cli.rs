use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use crate::analytics::{self, CategoryShare, MonthReport};
use crate::config::Config;
use crate::db::Database;
use crate::models::{Budget, Month, Transaction, TransactionKind, TransactionUpdate};
use crate::store::TransactionStore;
use crate::ui::util::{format_amount, format_percent, format_signed, progress_bar, truncate};

pub(crate) fn as_cli(args: &[String], db: &mut Database, config: &Config) -> Result<()> {
    let rest = &args[2..];
    match args[1].as_str() {
        "add" | "a" => cli_add(rest, db, config),
        "edit" => cli_edit(rest, db, config),
        "delete" | "rm" => cli_delete(rest, db, config),
        "list" | "ls" => cli_list(rest, db, config),
        "budget" => cli_budget(rest, db, config),
        "summary" | "s" => cli_summary(rest, db, config),
        "trend" => cli_trend(rest, db, config),
        "categories" => {
            cli_categories();
            Ok(())
        }
        "export" => cli_export(rest, db, config),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("fintrack {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("fintrack — monthly expense and income tracker");
    println!();
    println!("Usage: fintrack [--db <path>] [--user <name>] [--months <n>] [command]");
    println!();
    println!("Commands:");
    println!("  (none)                                  Launch interactive TUI");
    println!("  add <expense|income> <amount> <category> <title...>");
    println!("    --date <YYYY-MM-DD>                   Date of the entry (default: today)");
    println!("  edit <id>                               Change a transaction");
    println!("    --title, --amount, --category, --date");
    println!("  delete <id>                             Delete a transaction");
    println!("  list [YYYY-MM]                          List a month's transactions");
    println!("    --kind <expense|income>               Only one kind");
    println!("  budget <amount> [YYYY-MM]               Set the monthly spending budget");
    println!("  budget clear [YYYY-MM]                  Remove the monthly budget");
    println!("  summary [YYYY-MM]                       Print monthly summary");
    println!("  trend [YYYY-MM]                         Income and expenses of recent months");
    println!("  categories                              List valid categories");
    println!("  export [path]                           Export transactions to CSV");
    println!("    --month <YYYY-MM>                     Month to export (default: current)");
    println!("  --help, -h                              Show this help");
    println!("  --version, -V                           Show version");
    println!();
    println!("Environment: FINTRACK_DB, FINTRACK_USER, FINTRACK_TREND_MONTHS, RUST_LOG");
}

// ── Argument helpers ─────────────────────────────────────────

/// Positional arguments plus the values of the allowed `--flag value` pairs.
#[derive(Debug, Default)]
pub(crate) struct ParsedArgs<'a> {
    pub(crate) positional: Vec<&'a str>,
    pub(crate) flags: HashMap<&'a str, &'a str>,
}

impl<'a> ParsedArgs<'a> {
    pub(crate) fn flag(&self, name: &str) -> Option<&'a str> {
        self.flags.get(name).copied()
    }
}

pub(crate) fn split_args<'a>(args: &'a [String], allowed: &[&str]) -> Result<ParsedArgs<'a>> {
    let mut parsed = ParsedArgs::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg.starts_with("--") {
            if !allowed.contains(&arg.as_str()) {
                anyhow::bail!("Unknown option: {arg}");
            }
            let value = iter
                .next()
                .with_context(|| format!("Missing value for {arg}"))?;
            parsed.flags.insert(arg.as_str(), value.as_str());
        } else {
            parsed.positional.push(arg.as_str());
        }
    }
    Ok(parsed)
}

pub(crate) fn parse_amount(s: &str) -> Result<Decimal> {
    Decimal::from_str(s.trim_start_matches('$').replace(',', "").as_str())
        .with_context(|| format!("Invalid amount: {s}"))
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date: {s} (expected YYYY-MM-DD)"))
}

/// Month argument, defaulting to the current month.
pub(crate) fn parse_month(arg: Option<&str>) -> Result<Month> {
    match arg {
        Some(s) => Month::parse(s).with_context(|| format!("Invalid month: {s} (expected YYYY-MM)")),
        None => Ok(Month::current()),
    }
}

pub(crate) fn parse_kind(s: &str) -> Result<TransactionKind> {
    TransactionKind::parse(s).with_context(|| format!("Invalid kind: {s} (expected expense or income)"))
}

fn parse_id(arg: Option<&str>, usage: &str) -> Result<i64> {
    let Some(s) = arg else {
        anyhow::bail!("Usage: {usage}");
    };
    s.parse().with_context(|| format!("Invalid id: {s}"))
}

/// Build an unsaved transaction from `add` arguments.
pub(crate) fn parse_add(args: &[String], config: &Config) -> Result<Transaction> {
    const USAGE: &str =
        "fintrack add <expense|income> <amount> <category> <title...> [--date YYYY-MM-DD]";
    let parsed = split_args(args, &["--date"])?;
    let [kind, amount, category, title @ ..] = parsed.positional.as_slice() else {
        anyhow::bail!("Usage: {USAGE}");
    };
    if title.is_empty() {
        anyhow::bail!("Usage: {USAGE}");
    }

    let date = match parsed.flag("--date") {
        Some(d) => parse_date(d)?,
        None => chrono::Local::now().date_naive(),
    };
    Ok(Transaction::new(
        config.owner.clone(),
        parse_kind(kind)?,
        title.join(" "),
        parse_amount(amount)?,
        (*category).to_string(),
        date,
    ))
}

/// Build a partial update from `edit` flags.
pub(crate) fn parse_update(parsed: &ParsedArgs<'_>) -> Result<TransactionUpdate> {
    Ok(TransactionUpdate {
        title: parsed.flag("--title").map(str::to_string),
        amount: parsed.flag("--amount").map(parse_amount).transpose()?,
        category: parsed.flag("--category").map(str::to_string),
        date: parsed.flag("--date").map(parse_date).transpose()?,
    })
}

// ── Commands ─────────────────────────────────────────────────

fn cli_add(args: &[String], db: &mut Database, config: &Config) -> Result<()> {
    let txn = parse_add(args, config)?;
    let id = db.create_transaction(&txn)?;
    let saved = db
        .get_transaction(&config.owner, id)?
        .with_context(|| format!("Transaction {id} vanished after insert"))?;
    println!(
        "Added {} #{id}: {} {} ({}) on {}",
        saved.kind.as_str().to_lowercase(),
        saved.title,
        format_amount(saved.amount),
        saved.category,
        saved.date
    );
    Ok(())
}

fn cli_edit(args: &[String], db: &mut Database, config: &Config) -> Result<()> {
    const USAGE: &str = "fintrack edit <id> [--title T] [--amount A] [--category C] [--date YYYY-MM-DD]";
    let parsed = split_args(args, &["--title", "--amount", "--category", "--date"])?;
    let id = parse_id(parsed.positional.first().copied(), USAGE)?;
    let update = parse_update(&parsed)?;
    if update.is_empty() {
        anyhow::bail!("Nothing to change. Usage: {USAGE}");
    }

    let txn = db.update_transaction(&config.owner, id, &update)?;
    println!(
        "Updated #{id}: {} {} ({}) on {}",
        txn.title,
        format_amount(txn.amount),
        txn.category,
        txn.date
    );
    Ok(())
}

fn cli_delete(args: &[String], db: &mut Database, config: &Config) -> Result<()> {
    let id = parse_id(args.first().map(String::as_str), "fintrack delete <id>")?;
    db.delete_transaction(&config.owner, id)?;
    println!("Deleted #{id}");
    Ok(())
}

fn cli_list(args: &[String], db: &mut Database, config: &Config) -> Result<()> {
    let parsed = split_args(args, &["--kind"])?;
    let month = parse_month(parsed.positional.first().copied())?;
    let kind = parsed.flag("--kind").map(parse_kind).transpose()?;

    let txns = match kind {
        Some(kind) => {
            db.list_transactions(&config.owner, kind, month.first_day(), month.last_day())?
        }
        None => db.list_all_transactions(&config.owner, month.first_day(), month.last_day())?,
    };
    if txns.is_empty() {
        println!("No transactions for {month}");
        return Ok(());
    }

    println!(
        "{:<6} {:<10} {:<8} {:<14} {:<30} {:>14}",
        "ID", "Date", "Kind", "Category", "Title", "Amount"
    );
    println!("{}", "─".repeat(87));
    for txn in &txns {
        println!(
            "{:<6} {:<10} {:<8} {:<14} {:<30} {:>14}",
            txn.id.unwrap_or(0),
            txn.date,
            txn.kind,
            txn.category,
            truncate(&txn.title, 30),
            format_signed(txn),
        );
    }
    Ok(())
}

fn cli_budget(args: &[String], db: &mut Database, config: &Config) -> Result<()> {
    const USAGE: &str = "fintrack budget <amount|clear> [YYYY-MM]";
    let Some(first) = args.first() else {
        anyhow::bail!("Usage: {USAGE}");
    };
    let month = parse_month(args.get(1).map(String::as_str))?;

    if first.eq_ignore_ascii_case("clear") {
        if db.delete_budget(&config.owner, month)? {
            println!("Cleared budget for {month}");
        } else {
            println!("No budget set for {month}");
        }
        return Ok(());
    }

    let amount = parse_amount(first)?;
    db.upsert_budget(&Budget::new(config.owner.clone(), month, amount))?;
    println!("Budget for {month}: {}", format_amount(amount));
    Ok(())
}

fn cli_summary(args: &[String], db: &mut Database, config: &Config) -> Result<()> {
    let month = parse_month(args.first().map(String::as_str))?;
    let report = MonthReport::load(&*db, &config.owner, month, config.trend_months)?;

    println!("fintrack — {} ({})", month.label(), config.owner);
    println!("{}", "─".repeat(48));
    println!(
        "  Expenses:   {:>14}  ({} txns, avg {})",
        format_amount(report.expenses.total),
        report.expenses.count,
        format_amount(report.expenses.average)
    );
    println!(
        "  Income:     {:>14}  ({} txns, avg {})",
        format_amount(report.income.total),
        report.income.count,
        format_amount(report.income.average)
    );
    println!("  Net:        {:>14}", format_amount(report.net));

    match &report.budget {
        Some(budget) => {
            let status = &report.budget_status;
            let flag = if status.is_exceeded {
                "  EXCEEDED"
            } else if status.is_warning {
                "  WARNING"
            } else {
                ""
            };
            println!(
                "  Budget:     {:>14}  {} used, {} left{flag}",
                format_amount(budget.amount),
                format_percent(status.percentage_used),
                format_amount(status.remaining)
            );
        }
        None => println!("  Budget:     {:>14}", "not set"),
    }

    print_breakdown("Spending by Category:", &report.expense_breakdown);
    print_breakdown("Income by Category:", &report.income_breakdown);
    Ok(())
}

fn print_breakdown(title: &str, shares: &[CategoryShare]) {
    if shares.is_empty() {
        return;
    }
    println!();
    println!("{title}");
    for share in analytics::top_categories(shares, shares.len()) {
        let ratio = (share.percentage / Decimal::ONE_HUNDRED)
            .to_f64()
            .unwrap_or(0.0);
        println!(
            "  {:<14} {:>14} {:>7} {}",
            share.category,
            format_amount(share.amount),
            format_percent(share.percentage),
            progress_bar(ratio, 20)
        );
    }
}

fn cli_trend(args: &[String], db: &mut Database, config: &Config) -> Result<()> {
    let month = parse_month(args.first().map(String::as_str))?;
    let periods =
        analytics::trailing_periods_from_store(&*db, &config.owner, config.trend_months, month.first_day())?;

    println!("{:<10} {:>14} {:>14} {:>14}", "Month", "Income", "Expenses", "Net");
    println!("{}", "─".repeat(55));
    for p in &periods {
        println!(
            "{:<10} {:>14} {:>14} {:>14}",
            p.label,
            format_amount(p.income),
            format_amount(p.expenses),
            format_amount(p.net)
        );
    }
    Ok(())
}

fn cli_categories() {
    for kind in TransactionKind::all() {
        println!("{kind}: {}", kind.categories().join(", "));
    }
}

fn cli_export(args: &[String], db: &mut Database, config: &Config) -> Result<()> {
    let parsed = split_args(args, &["--month"])?;
    let month = parse_month(parsed.flag("--month"))?;

    let output_path = parsed
        .positional
        .first()
        .map(|a| shellexpand(a))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            format!("{home}/fintrack-export-{month}.csv")
        });

    let txns = db.list_all_transactions(&config.owner, month.first_day(), month.last_day())?;
    if txns.is_empty() {
        println!("No transactions for {month}");
        return Ok(());
    }
    let count = crate::export::export_to_path(Path::new(&output_path), &txns)?;
    println!("Exported {count} transactions to {output_path}");
    Ok(())
}

pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}
