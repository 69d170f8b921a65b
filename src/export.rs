use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::models::{Month, Transaction};

const HEADER: [&str; 7] = [
    "id",
    "date",
    "description",
    "category",
    "amount",
    "created_at",
    "updated_at",
];

/// Write transactions as CSV with a header row, optionally only those in
/// `month`. Returns the number of data rows written.
pub fn write_transactions_csv<W: Write>(
    writer: W,
    txns: &[Transaction],
    month: Option<Month>,
) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;

    let mut count = 0;
    for txn in txns
        .iter()
        .filter(|t| month.map_or(true, |m| m.contains(&t.date)))
    {
        wtr.write_record([
            txn.id.as_str(),
            txn.date.as_str(),
            txn.description.as_str(),
            txn.category.as_str(),
            txn.amount.to_string().as_str(),
            txn.created_at.to_rfc3339().as_str(),
            txn.updated_at.to_rfc3339().as_str(),
        ])?;
        count += 1;
    }
    wtr.flush().context("Failed to flush CSV output")?;
    Ok(count)
}

pub fn export_transactions_csv(
    path: &Path,
    txns: &[Transaction],
    month: Option<Month>,
) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create export file: {}", path.display()))?;
    write_transactions_csv(file, txns, month)
        .with_context(|| format!("Failed to write CSV to {}", path.display()))
}

#[cfg(test)]
#[path = "export_tests.rs"]
mod tests;
