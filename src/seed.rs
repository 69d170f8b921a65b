//! Sample data for trying the tool out.

use rust_decimal::Decimal;

use crate::error::{Result, StoreError};
use crate::models::{Category, Month, NewBudget, NewTransaction, TxnDate};
use crate::store::RecordStore;

/// What [`seed_store`] added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedReport {
    pub transactions: usize,
    pub budgets: usize,
    /// Sample budgets left out because that category and month already
    /// had one.
    pub skipped_budgets: usize,
}

const SAMPLE_MONTH: &str = "2024-12";

// (cents, date, description, category)
const SAMPLE_TRANSACTIONS: [(i64, &str, &str, Category); 10] = [
    (4550, "2024-12-15", "Grocery shopping at Whole Foods", Category::Food),
    (120000, "2024-12-01", "Monthly rent payment", Category::Rent),
    (2575, "2024-12-14", "Coffee and breakfast", Category::Food),
    (8999, "2024-12-13", "New wireless headphones", Category::Shopping),
    (15000, "2024-12-10", "Electric bill", Category::Bills),
    (3250, "2024-12-12", "Lunch with colleagues", Category::Food),
    (4500, "2024-12-11", "Gas for car", Category::Travel),
    (7525, "2024-12-09", "Groceries and household items", Category::Food),
    (12000, "2024-12-08", "Internet bill", Category::Bills),
    (6599, "2024-12-07", "Clothing store purchase", Category::Shopping),
];

const SAMPLE_BUDGETS: [(i64, Category); 5] = [
    (40000, Category::Food),
    (120000, Category::Rent),
    (30000, Category::Bills),
    (20000, Category::Shopping),
    (15000, Category::Travel),
];

pub fn sample_transactions() -> Result<Vec<NewTransaction>> {
    SAMPLE_TRANSACTIONS
        .iter()
        .map(|&(cents, date, description, category)| {
            Ok(
                NewTransaction::new(Decimal::new(cents, 2), TxnDate::parse(date)?, description)
                    .with_category(category),
            )
        })
        .collect()
}

pub fn sample_budgets() -> Result<Vec<NewBudget>> {
    let month = Month::parse(SAMPLE_MONTH)?;
    Ok(SAMPLE_BUDGETS
        .iter()
        .map(|&(cents, category)| NewBudget::new(category, Decimal::new(cents, 2), month))
        .collect())
}

/// Adds the sample transactions and budgets through the normal create
/// operations. Budgets that would clash with an existing one are skipped.
pub fn seed_store(store: &RecordStore) -> Result<SeedReport> {
    let mut report = SeedReport::default();
    for new in sample_transactions()? {
        store.create_transaction(new)?;
        report.transactions += 1;
    }
    for new in sample_budgets()? {
        match store.create_budget(new) {
            Ok(_) => report.budgets += 1,
            Err(StoreError::DuplicateBudget { .. }) => report.skipped_budgets += 1,
            Err(e) => return Err(e),
        }
    }
    tracing::info!(
        transactions = report.transactions,
        budgets = report.budgets,
        skipped = report.skipped_budgets,
        "seeded sample data"
    );
    Ok(report)
}

#[cfg(test)]
#[path = "seed_tests.rs"]
mod tests;
