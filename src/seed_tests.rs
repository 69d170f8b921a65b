#![allow(clippy::unwrap_used)]

use rust_decimal_macros::dec;

use super::*;
use crate::aggregate;

#[test]
fn test_sample_data_is_valid() {
    let txns = sample_transactions().unwrap();
    assert_eq!(txns.len(), 10);
    assert_eq!(txns[1].amount, dec!(1200.00));
    assert_eq!(txns[1].category, Some(Category::Rent));

    let budgets = sample_budgets().unwrap();
    assert_eq!(budgets.len(), 5);
    assert!(budgets.iter().all(|b| b.month.to_string() == "2024-12"));
}

#[test]
fn test_seed_store_populates_both_collections() {
    let store = RecordStore::open_in_memory().unwrap();
    let report = seed_store(&store).unwrap();
    assert_eq!(
        report,
        SeedReport {
            transactions: 10,
            budgets: 5,
            skipped_budgets: 0,
        }
    );

    let txns = store.list_transactions().unwrap();
    assert_eq!(aggregate::total_expenses(&txns), dec!(1849.98));
    let (top, total) = aggregate::top_category(&txns).unwrap();
    assert_eq!(top, Category::Rent);
    assert_eq!(total, dec!(1200.00));
}

#[test]
fn test_seed_twice_skips_existing_budgets() {
    let store = RecordStore::open_in_memory().unwrap();
    seed_store(&store).unwrap();
    let report = seed_store(&store).unwrap();
    assert_eq!(report.transactions, 10);
    assert_eq!(report.budgets, 0);
    assert_eq!(report.skipped_budgets, 5);
    assert_eq!(store.list_budgets().unwrap().len(), 5);
    assert_eq!(store.list_transactions().unwrap().len(), 20);
}
