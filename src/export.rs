use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::models::Transaction;

const HEADER: [&str; 6] = ["id", "date", "kind", "category", "title", "amount"];

/// Write `transactions` as CSV and return how many records were written.
pub(crate) fn write_csv<W: Write>(writer: W, transactions: &[Transaction]) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;
    for txn in transactions {
        wtr.write_record([
            txn.id.map(|id| id.to_string()).unwrap_or_default(),
            txn.date.format("%Y-%m-%d").to_string(),
            txn.kind.as_str().to_string(),
            txn.category.clone(),
            txn.title.clone(),
            format!("{:.2}", txn.amount),
        ])?;
    }
    wtr.flush()?;
    Ok(transactions.len())
}

pub(crate) fn export_to_path(path: &Path, transactions: &[Transaction]) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create export file: {}", path.display()))?;
    let count = write_csv(file, transactions)?;
    tracing::info!(path = %path.display(), count, "exported transactions");
    Ok(count)
}
