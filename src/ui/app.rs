use chrono::{Local, NaiveDate};
use tracing::warn;

use crate::analytics::MonthReport;
use crate::config::Config;
use crate::db::Database;
use crate::models::*;
use crate::ui::util::ListCursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Dashboard,
    Transactions,
}

impl Screen {
    pub(crate) fn all() -> &'static [Screen] {
        &[Self::Dashboard, Self::Transactions]
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dashboard => write!(f, "Dashboard"),
            Self::Transactions => write!(f, "Transactions"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputMode {
    Normal,
    Command,
    Confirm,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Command => write!(f, "COMMAND"),
            Self::Confirm => write!(f, "CONFIRM"),
        }
    }
}

/// Pending action that requires user confirmation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PendingAction {
    DeleteTransaction { id: i64, title: String },
    ClearBudget { month: Month },
}

pub(crate) struct App {
    pub(crate) running: bool,
    pub(crate) screen: Screen,
    pub(crate) input_mode: InputMode,
    pub(crate) command_input: String,
    pub(crate) status_message: String,
    pub(crate) show_help: bool,

    pub(crate) owner: Owner,
    pub(crate) trend_months: usize,
    pub(crate) current_month: Month,

    // Dashboard
    pub(crate) report: Option<MonthReport>,
    /// Set when the last refresh failed; distinguishes "could not load" from
    /// "nothing recorded".
    pub(crate) load_error: Option<String>,

    // Transactions
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) cursor: ListCursor,
    pub(crate) transaction_count: i64,

    // Confirmation
    pub(crate) pending_action: Option<PendingAction>,
    pub(crate) confirm_message: String,

    // Layout (updated each render frame)
    pub(crate) visible_rows: usize,
}

impl App {
    pub(crate) fn new(config: &Config) -> Self {
        Self {
            running: true,
            screen: Screen::Dashboard,
            input_mode: InputMode::Normal,
            command_input: String::new(),
            status_message: String::new(),
            show_help: false,

            owner: config.owner.clone(),
            trend_months: config.trend_months,
            current_month: Month::current(),

            report: None,
            load_error: None,

            transactions: Vec::new(),
            cursor: ListCursor::default(),
            transaction_count: 0,

            pending_action: None,
            confirm_message: String::new(),

            visible_rows: 20,
        }
    }

    /// Re-query everything shown for the current month.
    pub(crate) fn refresh_all(&mut self, db: &Database) {
        let result = MonthReport::load(db, &self.owner, self.current_month, self.trend_months)
            .and_then(|report| {
                let txns = db.list_all_transactions(
                    &self.owner,
                    self.current_month.first_day(),
                    self.current_month.last_day(),
                )?;
                let count = db.count_transactions(&self.owner)?;
                Ok((report, txns, count))
            });

        match result {
            Ok((report, txns, count)) => {
                self.report = Some(report);
                self.transactions = txns;
                self.transaction_count = count;
                self.load_error = None;
            }
            Err(e) => {
                warn!(owner = %self.owner, month = %self.current_month, error = %e, "refresh failed");
                self.report = None;
                self.transactions.clear();
                self.load_error = Some(e.to_string());
                self.set_status(format!("Failed to load data: {e}"));
            }
        }

        self.cursor.clamp(self.transactions.len());
    }

    pub(crate) fn set_month(&mut self, month: Month, db: &Database) {
        self.current_month = month;
        self.cursor.top();
        self.refresh_all(db);
    }

    pub(crate) fn selected_transaction(&self) -> Option<&Transaction> {
        self.transactions.get(self.cursor.index)
    }

    /// Date for new entries: today when viewing the current month, otherwise
    /// the first day of the viewed month.
    pub(crate) fn default_entry_date(&self) -> NaiveDate {
        let today = Local::now().date_naive();
        if self.current_month.contains(today) {
            today
        } else {
            self.current_month.first_day()
        }
    }

    pub(crate) fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }
}
