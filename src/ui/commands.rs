use std::collections::HashMap;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::app::{App, InputMode, PendingAction, Screen};
use super::util::format_amount;
use crate::db::Database;
use crate::models::{Budget, Month, Transaction, TransactionKind, TransactionUpdate};
use crate::store::StoreError;

pub(crate) struct Command {
    pub(crate) description: &'static str,
    pub(crate) run: fn(&str, &mut App, &mut Database) -> anyhow::Result<()>,
}

macro_rules! register_command {
    ($name:expr, $desc:expr, $func:expr, $registry:expr) => {{
        $registry.insert(
            $name,
            Command {
                description: $desc,
                run: $func,
            },
        );
    }};
}

pub(crate) static COMMANDS: LazyLock<HashMap<&str, Command>> = LazyLock::new(|| {
    let mut r: HashMap<&str, Command> = HashMap::new();

    register_command!("q", "Quit fintrack", cmd_quit, r);
    register_command!("quit", "Quit fintrack", cmd_quit, r);
    register_command!("d", "Go to Dashboard", cmd_dashboard, r);
    register_command!("dashboard", "Go to Dashboard", cmd_dashboard, r);
    register_command!("t", "Go to Transactions", cmd_transactions, r);
    register_command!("transactions", "Go to Transactions", cmd_transactions, r);
    register_command!("help", "Show available commands", cmd_help, r);
    register_command!("h", "Show available commands", cmd_help, r);
    register_command!("month", "Set month (e.g. :month 2024-01)", cmd_month, r);
    register_command!("m", "Set month (e.g. :m 2024-01)", cmd_month, r);
    register_command!("next-month", "Go to next month", cmd_next_month, r);
    register_command!("prev-month", "Go to previous month", cmd_prev_month, r);
    register_command!(
        "expense",
        "Add expense (e.g. :expense 12.50 Food Lunch)",
        cmd_expense,
        r
    );
    register_command!("e", "Add expense (e.g. :e 12.50 Food Lunch)", cmd_expense, r);
    register_command!(
        "income",
        "Add income (e.g. :income 3000 Salary Payroll)",
        cmd_income,
        r
    );
    register_command!("i", "Add income (e.g. :i 3000 Salary Payroll)", cmd_income, r);
    register_command!(
        "budget",
        "Set monthly budget (e.g. :budget 1500, :budget clear)",
        cmd_budget,
        r
    );
    register_command!("b", "Set monthly budget (e.g. :b 1500)", cmd_budget, r);
    register_command!("rename", "Rename selected transaction", cmd_rename, r);
    register_command!("amount", "Change amount of selected transaction", cmd_amount, r);
    register_command!("recat", "Re-categorize selected transaction", cmd_recat, r);
    register_command!("redate", "Change date of selected transaction", cmd_redate, r);
    register_command!("delete", "Delete selected transaction", cmd_delete, r);
    register_command!(
        "export",
        "Export month to CSV (e.g. :export ~/jan.csv)",
        cmd_export,
        r
    );

    r
});

pub(crate) fn handle_command(input: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let trimmed = input.trim();
    let mut parts = trimmed.splitn(2, ' ');
    let cmd_name = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    if let Some(cmd) = COMMANDS.get(cmd_name) {
        (cmd.run)(args, app, db)?;
    } else {
        let suggestion = find_closest(cmd_name);
        app.set_status(format!(
            "Unknown command: :{cmd_name}. Did you mean :{suggestion}?"
        ));
    }

    Ok(())
}

fn find_closest(input: &str) -> String {
    COMMANDS
        .keys()
        .filter(|k| k.len() > 1) // skip single-letter aliases for suggestions
        .min_by_key(|k| levenshtein(input, k))
        .unwrap_or(&"help")
        .to_string()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Arguments of `:expense` / `:income`.
#[derive(Debug, PartialEq)]
pub(crate) struct EntryArgs {
    pub(crate) date: Option<NaiveDate>,
    pub(crate) amount: Decimal,
    pub(crate) category: String,
    pub(crate) title: String,
}

/// Parse `[YYYY-MM-DD] <amount> <category> <title…>`.
pub(crate) fn parse_entry(args: &str) -> Result<EntryArgs, String> {
    let mut tokens = args.split_whitespace().peekable();

    let date = match tokens.peek() {
        Some(first) => match NaiveDate::parse_from_str(first, "%Y-%m-%d") {
            Ok(d) => {
                tokens.next();
                Some(d)
            }
            Err(_) => None,
        },
        None => None,
    };

    let amount_str = tokens.next().ok_or("missing amount")?;
    let amount = Decimal::from_str(amount_str.trim_start_matches('$'))
        .map_err(|_| format!("invalid amount: {amount_str}"))?;
    let category = tokens.next().ok_or("missing category")?.to_string();
    let title = tokens.collect::<Vec<_>>().join(" ");
    if title.is_empty() {
        return Err("missing title".into());
    }

    Ok(EntryArgs {
        date,
        amount,
        category,
        title,
    })
}

// ── Command implementations ──────────────────────────────────

fn cmd_quit(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.running = false;
    Ok(())
}

fn cmd_dashboard(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::Dashboard;
    app.refresh_all(db);
    Ok(())
}

fn cmd_transactions(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::Transactions;
    app.refresh_all(db);
    Ok(())
}

fn cmd_help(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.show_help = true;
    Ok(())
}

fn cmd_month(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_month(Month::current(), db);
        app.set_status(format!("Month: {}", app.current_month));
        return Ok(());
    }

    // Accept "2024-01" or just "1"/"01" for a month of the viewed year
    let month = if args.len() <= 2 {
        args.parse::<u32>()
            .ok()
            .and_then(|m| Month::new(app.current_month.year(), m))
    } else {
        Month::parse(args)
    };

    match month {
        Some(m) => {
            app.set_month(m, db);
            app.set_status(format!("Switched to month: {m}"));
        }
        None => app.set_status("Invalid month format. Use YYYY-MM (e.g. 2024-01)"),
    }
    Ok(())
}

fn cmd_next_month(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let month = app.current_month.next();
    go_to_month(app, db, month)
}

fn cmd_prev_month(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let month = app.current_month.prev();
    go_to_month(app, db, month)
}

fn go_to_month(app: &mut App, db: &mut Database, month: Month) -> anyhow::Result<()> {
    app.set_month(month, db);
    app.set_status(format!("Month: {month}"));
    Ok(())
}

fn cmd_expense(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    add_entry(TransactionKind::Expense, args, app, db)
}

fn cmd_income(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    add_entry(TransactionKind::Income, args, app, db)
}

fn add_entry(
    kind: TransactionKind,
    args: &str,
    app: &mut App,
    db: &mut Database,
) -> anyhow::Result<()> {
    let entry = match parse_entry(args) {
        Ok(e) => e,
        Err(msg) => {
            app.set_status(format!(
                "{msg}. Usage: :{} [YYYY-MM-DD] <amount> <category> <title>. Categories: {}",
                kind.as_str().to_lowercase(),
                kind.categories().join(", ")
            ));
            return Ok(());
        }
    };

    let date = entry.date.unwrap_or_else(|| app.default_entry_date());
    let txn = Transaction::new(
        app.owner.clone(),
        kind,
        entry.title,
        entry.amount,
        entry.category,
        date,
    );

    match db.create_transaction(&txn) {
        Ok(_) => {
            app.refresh_all(db);
            app.set_status(format!(
                "Added {}: {} {} on {date}",
                kind.as_str().to_lowercase(),
                txn.title.trim(),
                format_amount(txn.amount)
            ));
        }
        Err(e) => report_store_error(app, e)?,
    }
    Ok(())
}

fn cmd_budget(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :budget <amount> | :budget clear");
        return Ok(());
    }

    if args.eq_ignore_ascii_case("clear") {
        let month = app.current_month;
        app.confirm_message = format!("Clear budget for {month}?");
        app.pending_action = Some(PendingAction::ClearBudget { month });
        app.input_mode = InputMode::Confirm;
        return Ok(());
    }

    let amount = match Decimal::from_str(args.trim_start_matches('$')) {
        Ok(a) => a,
        Err(_) => {
            app.set_status(format!("Invalid amount: {args}"));
            return Ok(());
        }
    };

    let budget = Budget::new(app.owner.clone(), app.current_month, amount);
    match db.upsert_budget(&budget) {
        Ok(()) => {
            app.refresh_all(db);
            app.set_status(format!(
                "Budget for {}: {}",
                app.current_month,
                format_amount(amount)
            ));
        }
        Err(e) => report_store_error(app, e)?,
    }
    Ok(())
}

fn cmd_rename(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :rename <title>");
        return Ok(());
    }
    let update = TransactionUpdate {
        title: Some(args.to_string()),
        ..Default::default()
    };
    update_selected(app, db, &update, format!("Renamed to: {args}"))
}

fn cmd_amount(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Ok(amount) = Decimal::from_str(args.trim_start_matches('$')) else {
        app.set_status("Usage: :amount <amount>");
        return Ok(());
    };
    let update = TransactionUpdate {
        amount: Some(amount),
        ..Default::default()
    };
    update_selected(app, db, &update, format!("Amount set to {}", format_amount(amount)))
}

fn cmd_recat(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :recat <category>");
        return Ok(());
    }
    let update = TransactionUpdate {
        category: Some(args.to_string()),
        ..Default::default()
    };
    update_selected(app, db, &update, format!("Categorized as: {args}"))
}

fn cmd_redate(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Ok(date) = NaiveDate::parse_from_str(args, "%Y-%m-%d") else {
        app.set_status("Usage: :redate <YYYY-MM-DD>");
        return Ok(());
    };
    let update = TransactionUpdate {
        date: Some(date),
        ..Default::default()
    };
    update_selected(app, db, &update, format!("Moved to {date}"))
}

fn update_selected(
    app: &mut App,
    db: &mut Database,
    update: &TransactionUpdate,
    done: String,
) -> anyhow::Result<()> {
    if app.screen != Screen::Transactions {
        app.set_status("Navigate to Transactions and select one first");
        return Ok(());
    }
    let Some(id) = app.selected_transaction().and_then(|t| t.id) else {
        app.set_status("No transaction selected");
        return Ok(());
    };

    match db.update_transaction(&app.owner, id, update) {
        Ok(_) => {
            app.refresh_all(db);
            app.set_status(done);
        }
        Err(e) => report_store_error(app, e)?,
    }
    Ok(())
}

fn cmd_delete(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    if app.screen != Screen::Transactions || app.transactions.is_empty() {
        app.set_status("Navigate to Transactions and select one first");
        return Ok(());
    }

    if let Some(txn) = app.selected_transaction() {
        if let Some(id) = txn.id {
            let title = txn.title.clone();
            app.confirm_message = format!("Delete '{title}'?");
            app.pending_action = Some(PendingAction::DeleteTransaction { id, title });
            app.input_mode = InputMode::Confirm;
        }
    }

    Ok(())
}

/// Run a confirmed [`PendingAction`].
pub(crate) fn run_pending(action: PendingAction, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    match action {
        PendingAction::DeleteTransaction { id, title } => match db.delete_transaction(&app.owner, id) {
            Ok(()) => {
                app.refresh_all(db);
                app.set_status(format!("Deleted: {title}"));
            }
            Err(e) => report_store_error(app, e)?,
        },
        PendingAction::ClearBudget { month } => {
            let removed = db.delete_budget(&app.owner, month)?;
            app.refresh_all(db);
            app.set_status(if removed {
                format!("Cleared budget for {month}")
            } else {
                format!("No budget set for {month}")
            });
        }
    }
    Ok(())
}

fn cmd_export(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let path = if args.is_empty() {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/fintrack-export-{}.csv", app.current_month)
    } else {
        crate::run::shellexpand(args)
    };

    let txns = db.list_all_transactions(
        &app.owner,
        app.current_month.first_day(),
        app.current_month.last_day(),
    )?;
    if txns.is_empty() {
        app.set_status("No transactions to export");
        return Ok(());
    }
    let count = crate::export::export_to_path(std::path::Path::new(&path), &txns)?;
    app.set_status(format!("Exported {count} transactions to {path}"));
    Ok(())
}

/// Validation and ownership problems go to the status bar; anything else
/// (database failures) aborts the command.
fn report_store_error(app: &mut App, err: StoreError) -> anyhow::Result<()> {
    match err {
        StoreError::Database(e) => Err(e.into()),
        other => {
            app.set_status(format!("Error: {other}"));
            Ok(())
        }
    }
}
