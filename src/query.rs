//! Display orderings for listed records.
//!
//! Both sorts are stable, so records that compare equal keep the store's
//! order (most recently created first).

use crate::models::{Budget, Transaction};

/// Most recent `date` first.
pub fn sort_transactions(txns: &mut [Transaction]) {
    txns.sort_by(|a, b| b.date.at().cmp(&a.date.at()));
}

/// Newest month first; within a month, alphabetical by category name.
pub fn sort_budgets(budgets: &mut [Budget]) {
    budgets.sort_by(|a, b| {
        b.month
            .cmp(&a.month)
            .then_with(|| a.category.as_str().cmp(b.category.as_str()))
    });
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
