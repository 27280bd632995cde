mod schema;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::models::*;
use crate::store::{StoreError, StoreResult, TransactionStore};

const DATE_FMT: &str = "%Y-%m-%d";

const TXN_COLUMNS: &str = "id, owner, kind, title, amount, category, date, created_at";

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        debug!(path = %path.display(), "opened database");
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            info!(version = schema::CURRENT_VERSION, "created database schema");
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
            info!(
                from = current,
                to = schema::CURRENT_VERSION,
                "migrated database schema"
            );
        }

        Ok(())
    }

    // ── Transactions ──────────────────────────────────────────

    /// Insert a new transaction for `txn.owner` and return its id.
    pub(crate) fn create_transaction(&self, txn: &Transaction) -> StoreResult<i64> {
        let mut txn = txn.clone();
        txn.validate()?;
        self.conn.execute(
            "INSERT INTO transactions (owner, kind, title, amount, category, date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                txn.owner.as_str(),
                txn.kind.as_str(),
                txn.title,
                txn.amount.to_string(),
                txn.category,
                txn.date.format(DATE_FMT).to_string(),
                txn.created_at,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        info!(owner = %txn.owner, id, kind = %txn.kind, "created transaction");
        Ok(id)
    }

    pub(crate) fn get_transaction(&self, owner: &Owner, id: i64) -> StoreResult<Option<Transaction>> {
        let result = self.conn.query_row(
            &format!("SELECT {TXN_COLUMNS} FROM transactions WHERE id = ?1 AND owner = ?2"),
            params![id, owner.as_str()],
            row_to_transaction,
        );
        match result {
            Ok(t) => Ok(Some(t)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Both kinds within `from..=to`, newest first.
    pub(crate) fn list_all_transactions(
        &self,
        owner: &Owner,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TXN_COLUMNS} FROM transactions
             WHERE owner = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date DESC, id DESC"
        ))?;
        let rows = stmt.query_map(
            params![
                owner.as_str(),
                from.format(DATE_FMT).to_string(),
                to.format(DATE_FMT).to_string(),
            ],
            row_to_transaction,
        )?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn count_transactions(&self, owner: &Owner) -> StoreResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE owner = ?1",
            params![owner.as_str()],
            |row| row.get(0),
        )?)
    }

    pub(crate) fn update_transaction(
        &self,
        owner: &Owner,
        id: i64,
        update: &TransactionUpdate,
    ) -> StoreResult<Transaction> {
        self.authorize(owner, id)?;
        let mut txn = self
            .get_transaction(owner, id)?
            .ok_or(StoreError::NotFound(id))?;
        update.apply(&mut txn);
        txn.validate()?;
        self.conn.execute(
            "UPDATE transactions SET title = ?1, amount = ?2, category = ?3, date = ?4
             WHERE id = ?5 AND owner = ?6",
            params![
                txn.title,
                txn.amount.to_string(),
                txn.category,
                txn.date.format(DATE_FMT).to_string(),
                id,
                owner.as_str(),
            ],
        )?;
        info!(%owner, id, "updated transaction");
        Ok(txn)
    }

    pub(crate) fn delete_transaction(&self, owner: &Owner, id: i64) -> StoreResult<()> {
        self.authorize(owner, id)?;
        self.conn.execute(
            "DELETE FROM transactions WHERE id = ?1 AND owner = ?2",
            params![id, owner.as_str()],
        )?;
        info!(%owner, id, "deleted transaction");
        Ok(())
    }

    /// `NotFound` when the row does not exist, `Unauthorized` when it
    /// belongs to a different owner.
    fn authorize(&self, owner: &Owner, id: i64) -> StoreResult<()> {
        let result: rusqlite::Result<String> = self.conn.query_row(
            "SELECT owner FROM transactions WHERE id = ?1",
            params![id],
            |row| row.get(0),
        );
        match result {
            Ok(stored) if stored == owner.as_str() => Ok(()),
            Ok(_) => {
                warn!(%owner, id, "rejected access to another user's transaction");
                Err(StoreError::Unauthorized(id))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(StoreError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    // ── Budgets ───────────────────────────────────────────────

    pub(crate) fn upsert_budget(&self, budget: &Budget) -> StoreResult<()> {
        check_amount(budget.amount)?;
        self.conn.execute(
            "INSERT INTO budgets (owner, period, amount)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(owner, period) DO UPDATE SET amount = excluded.amount",
            params![
                budget.owner.as_str(),
                budget.period.first_day().format(DATE_FMT).to_string(),
                budget.amount.to_string(),
            ],
        )?;
        info!(owner = %budget.owner, period = %budget.period, "saved budget");
        Ok(())
    }

    /// Returns whether a budget existed.
    pub(crate) fn delete_budget(&self, owner: &Owner, period: Month) -> StoreResult<bool> {
        let removed = self.conn.execute(
            "DELETE FROM budgets WHERE owner = ?1 AND period = ?2",
            params![
                owner.as_str(),
                period.first_day().format(DATE_FMT).to_string()
            ],
        )?;
        info!(%owner, %period, removed, "deleted budget");
        Ok(removed > 0)
    }
}

impl TransactionStore for Database {
    fn list_transactions(
        &self,
        owner: &Owner,
        kind: TransactionKind,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TXN_COLUMNS} FROM transactions
             WHERE owner = ?1 AND kind = ?2 AND date >= ?3 AND date <= ?4
             ORDER BY date, id"
        ))?;
        let rows = stmt.query_map(
            params![
                owner.as_str(),
                kind.as_str(),
                from.format(DATE_FMT).to_string(),
                to.format(DATE_FMT).to_string(),
            ],
            row_to_transaction,
        )?;
        let txns = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(%owner, %kind, %from, %to, rows = txns.len(), "listed transactions");
        Ok(txns)
    }

    fn get_budget(&self, owner: &Owner, period: Month) -> StoreResult<Option<Budget>> {
        let result = self.conn.query_row(
            "SELECT id, owner, period, amount FROM budgets WHERE owner = ?1 AND period = ?2",
            params![
                owner.as_str(),
                period.first_day().format(DATE_FMT).to_string()
            ],
            |row| {
                let stored_period: String = row.get(2)?;
                let period = Month::parse(&stored_period)
                    .ok_or_else(|| conversion_error(2, format!("bad period '{stored_period}'")))?;
                Ok(Budget {
                    id: Some(row.get(0)?),
                    owner: parse_owner(row, 1)?,
                    period,
                    amount: parse_decimal(row, 3)?,
                })
            },
        );
        match result {
            Ok(b) => Ok(Some(b)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn row_to_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let kind_str: String = row.get(2)?;
    let kind = TransactionKind::parse(&kind_str)
        .ok_or_else(|| conversion_error(2, format!("bad kind '{kind_str}'")))?;
    let date_str: String = row.get(6)?;
    let date = NaiveDate::parse_from_str(&date_str, DATE_FMT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;
    Ok(Transaction {
        id: Some(row.get(0)?),
        owner: parse_owner(row, 1)?,
        kind,
        title: row.get(3)?,
        amount: parse_decimal(row, 4)?,
        category: row.get(5)?,
        date,
        created_at: row.get(7)?,
    })
}

fn parse_owner(row: &Row<'_>, idx: usize) -> rusqlite::Result<Owner> {
    let raw: String = row.get(idx)?;
    Owner::new(raw).ok_or_else(|| conversion_error(idx, "blank owner".into()))
}

fn parse_decimal(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
}
