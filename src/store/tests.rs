#![allow(clippy::unwrap_used)]

use rust_decimal_macros::dec;
use std::collections::HashSet;
use std::path::Path;
use tempfile::TempDir;

use super::*;
use crate::models::{Category, Month, TxnDate};

fn json_store(dir: &Path, policy: ReadPolicy) -> RecordStore {
    RecordStore::open(&StoreConfig::json(dir).with_read_policy(policy)).unwrap()
}

/// Runs `check` against a fresh store of each backend.
fn for_each_backend(check: impl Fn(&RecordStore)) {
    let dir = TempDir::new().unwrap();
    check(&json_store(dir.path(), ReadPolicy::Strict));
    check(&RecordStore::open_in_memory().unwrap());
}

fn month(s: &str) -> Month {
    Month::parse(s).unwrap()
}

fn new_txn(amount: rust_decimal::Decimal, date: &str, description: &str) -> NewTransaction {
    NewTransaction::new(amount, TxnDate::parse(date).unwrap(), description)
}

fn new_budget(category: Category, m: &str) -> NewBudget {
    NewBudget::new(category, dec!(100), month(m))
}

// ── Transactions ──────────────────────────────────────────────

#[test]
fn test_empty_store_lists_nothing() {
    for_each_backend(|store| {
        assert!(store.list_transactions().unwrap().is_empty());
        assert!(store.list_budgets().unwrap().is_empty());
    });
}

#[test]
fn test_create_transaction_assigns_id_and_timestamps() {
    for_each_backend(|store| {
        let txn = store
            .create_transaction(new_txn(dec!(12.50), "2025-01-05", "Lunch"))
            .unwrap();
        assert!(!txn.id.is_empty());
        assert_eq!(txn.created_at, txn.updated_at);
        assert_eq!(txn.category, Category::Other);

        let listed = store.list_transactions().unwrap();
        assert_eq!(listed, vec![txn]);
    });
}

#[test]
fn test_create_transaction_prepends() {
    for_each_backend(|store| {
        let first = store
            .create_transaction(new_txn(dec!(1), "2025-01-01", "first"))
            .unwrap();
        let second = store
            .create_transaction(new_txn(dec!(2), "2024-06-01", "second"))
            .unwrap();
        let ids: Vec<String> = store
            .list_transactions()
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, [second.id, first.id]);
    });
}

#[test]
fn test_create_transaction_rejects_invalid_input() {
    for_each_backend(|store| {
        let err = store
            .create_transaction(new_txn(dec!(0), "2025-01-01", "free"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation { field: "amount", .. }));

        let err = store
            .create_transaction(new_txn(dec!(5), "2025-01-01", "  "))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation { field: "description", .. }));

        assert!(store.list_transactions().unwrap().is_empty());
    });
}

#[test]
fn test_created_ids_are_unique() {
    for_each_backend(|store| {
        let ids: HashSet<String> = (0..25)
            .map(|i| {
                store
                    .create_transaction(new_txn(dec!(1), "2025-01-01", &format!("txn {i}")))
                    .unwrap()
                    .id
            })
            .collect();
        assert_eq!(ids.len(), 25);
    });
}

#[test]
fn test_generate_id_in_tight_loop() {
    let ids: HashSet<String> = (0..10_000).map(|_| id::generate_id()).collect();
    assert_eq!(ids.len(), 10_000);
}

#[test]
fn test_list_is_idempotent() {
    for_each_backend(|store| {
        store
            .create_transaction(new_txn(dec!(3), "2025-01-02", "Coffee"))
            .unwrap();
        store
            .create_transaction(new_txn(dec!(40), "2025-01-03", "Books"))
            .unwrap();
        assert_eq!(store.list_transactions().unwrap(), store.list_transactions().unwrap());
    });
}

#[test]
fn test_update_round_trip() {
    for_each_backend(|store| {
        let created = store
            .create_transaction(
                new_txn(dec!(12.50), "2025-01-05", "Lunch").with_category(Category::Food),
            )
            .unwrap();
        let patch = TransactionPatch {
            amount: Some(dec!(15)),
            ..Default::default()
        };
        let updated = store.update_transaction(&created.id, patch).unwrap().unwrap();

        let read_back = store
            .list_transactions()
            .unwrap()
            .into_iter()
            .find(|t| t.id == created.id)
            .unwrap();
        assert_eq!(read_back, updated);
        assert_eq!(read_back.amount, dec!(15));
        assert_eq!(read_back.date, created.date);
        assert_eq!(read_back.description, created.description);
        assert_eq!(read_back.category, created.category);
        assert_eq!(read_back.created_at, created.created_at);
        assert!(read_back.updated_at > read_back.created_at);
    });
}

#[test]
fn test_amounts_read_back_exactly() {
    for_each_backend(|store| {
        let amounts = [
            dec!(1234567890123456.78),
            dec!(0.333333333333333333),
            dec!(0.10),
            dec!(19.99),
        ];
        let created: Vec<Transaction> = amounts
            .iter()
            .map(|a| store.create_transaction(new_txn(*a, "2025-01-05", "exact")).unwrap())
            .collect();
        let budget = store
            .create_budget(NewBudget::new(Category::Rent, dec!(98765432109876.54321), month("2025-01")))
            .unwrap();

        let mut listed = store.list_transactions().unwrap();
        listed.reverse();
        assert_eq!(listed, created);
        for (txn, amount) in listed.iter().zip(amounts) {
            assert_eq!(txn.amount.to_string(), amount.to_string());
        }
        assert_eq!(
            store.list_budgets().unwrap()[0].amount.to_string(),
            budget.amount.to_string()
        );
    });
}

#[test]
fn test_updated_at_strictly_increases() {
    for_each_backend(|store| {
        let created = store
            .create_transaction(new_txn(dec!(1), "2025-01-05", "Snack"))
            .unwrap();
        let mut previous = created.updated_at;
        for _ in 0..5 {
            let updated = store
                .update_transaction(&created.id, TransactionPatch::default())
                .unwrap()
                .unwrap();
            assert!(updated.updated_at > previous);
            previous = updated.updated_at;
        }
    });
}

#[test]
fn test_update_missing_transaction_creates_nothing() {
    for_each_backend(|store| {
        let patch = TransactionPatch {
            amount: Some(dec!(5)),
            ..Default::default()
        };
        assert!(store.update_transaction("nope", patch).unwrap().is_none());
        assert!(store.list_transactions().unwrap().is_empty());
    });
}

#[test]
fn test_update_rejects_invalid_patch() {
    for_each_backend(|store| {
        let created = store
            .create_transaction(new_txn(dec!(9), "2025-01-05", "Cinema"))
            .unwrap();
        let patch = TransactionPatch {
            amount: Some(dec!(-9)),
            ..Default::default()
        };
        assert!(store.update_transaction(&created.id, patch).is_err());
        assert_eq!(store.list_transactions().unwrap(), vec![created]);
    });
}

#[test]
fn test_delete_transaction() {
    for_each_backend(|store| {
        let keep = store
            .create_transaction(new_txn(dec!(1), "2025-01-01", "keep"))
            .unwrap();
        let gone = store
            .create_transaction(new_txn(dec!(2), "2025-01-02", "drop"))
            .unwrap();

        assert!(!store.delete_transaction("missing").unwrap());
        assert_eq!(store.list_transactions().unwrap().len(), 2);

        assert!(store.delete_transaction(&gone.id).unwrap());
        assert_eq!(store.list_transactions().unwrap(), vec![keep]);
        assert!(!store.delete_transaction(&gone.id).unwrap());
    });
}

#[test]
fn test_transactions_for_display_sorted_by_date() {
    for_each_backend(|store| {
        store
            .create_transaction(new_txn(dec!(1), "2025-01-10", "middle"))
            .unwrap();
        store
            .create_transaction(new_txn(dec!(1), "2024-12-31", "oldest"))
            .unwrap();
        store
            .create_transaction(new_txn(dec!(1), "2025-02-01", "newest"))
            .unwrap();
        let names: Vec<String> = store
            .transactions_for_display()
            .unwrap()
            .into_iter()
            .map(|t| t.description)
            .collect();
        assert_eq!(names, ["newest", "middle", "oldest"]);
    });
}

// ── Budgets ───────────────────────────────────────────────────

#[test]
fn test_create_budget() {
    for_each_backend(|store| {
        let budget = store.create_budget(new_budget(Category::Food, "2025-01")).unwrap();
        assert!(!budget.id.is_empty());
        assert_eq!(budget.created_at, budget.updated_at);
        assert_eq!(store.list_budgets().unwrap(), vec![budget]);
    });
}

#[test]
fn test_duplicate_budget_rejected_and_state_unchanged() {
    for_each_backend(|store| {
        store.create_budget(new_budget(Category::Food, "2025-01")).unwrap();
        store.create_budget(new_budget(Category::Rent, "2025-01")).unwrap();
        let before = store.list_budgets().unwrap();

        let err = store
            .create_budget(NewBudget::new(Category::Food, dec!(999), month("2025-01")))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::DuplicateBudget { category: Category::Food, .. }
        ));
        assert_eq!(err.status_class(), 400);
        assert_eq!(store.list_budgets().unwrap(), before);
    });
}

#[test]
fn test_same_category_other_month_allowed() {
    for_each_backend(|store| {
        store.create_budget(new_budget(Category::Food, "2025-01")).unwrap();
        store.create_budget(new_budget(Category::Food, "2025-02")).unwrap();
        assert_eq!(store.list_budgets().unwrap().len(), 2);
    });
}

#[test]
fn test_update_budget_into_existing_pair_rejected() {
    for_each_backend(|store| {
        store.create_budget(new_budget(Category::Food, "2025-01")).unwrap();
        let rent = store.create_budget(new_budget(Category::Rent, "2025-01")).unwrap();
        let before = store.list_budgets().unwrap();

        let patch = BudgetPatch {
            category: Some(Category::Food),
            ..Default::default()
        };
        let err = store.update_budget(&rent.id, patch).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateBudget { .. }));
        assert_eq!(store.list_budgets().unwrap(), before);
    });
}

#[test]
fn test_update_budget_own_amount() {
    for_each_backend(|store| {
        let food = store.create_budget(new_budget(Category::Food, "2025-01")).unwrap();
        let patch = BudgetPatch {
            amount: Some(dec!(250)),
            ..Default::default()
        };
        let updated = store.update_budget(&food.id, patch).unwrap().unwrap();
        assert_eq!(updated.amount, dec!(250));
        assert_eq!(updated.category, Category::Food);
        assert!(updated.updated_at > food.updated_at);
    });
}

#[test]
fn test_update_budget_to_free_month() {
    for_each_backend(|store| {
        let food = store.create_budget(new_budget(Category::Food, "2025-01")).unwrap();
        let patch = BudgetPatch {
            month: Some(month("2025-02")),
            ..Default::default()
        };
        let updated = store.update_budget(&food.id, patch).unwrap().unwrap();
        assert_eq!(updated.month, month("2025-02"));
        // the old slot is free again
        store.create_budget(new_budget(Category::Food, "2025-01")).unwrap();
    });
}

#[test]
fn test_update_missing_budget() {
    for_each_backend(|store| {
        assert!(store
            .update_budget("nope", BudgetPatch::default())
            .unwrap()
            .is_none());
        assert!(store.list_budgets().unwrap().is_empty());
    });
}

#[test]
fn test_delete_budget() {
    for_each_backend(|store| {
        let food = store.create_budget(new_budget(Category::Food, "2025-01")).unwrap();
        assert!(!store.delete_budget("missing").unwrap());
        assert!(store.delete_budget(&food.id).unwrap());
        assert!(store.list_budgets().unwrap().is_empty());
        // deleting frees the (category, month) pair
        store.create_budget(new_budget(Category::Food, "2025-01")).unwrap();
    });
}

#[test]
fn test_budgets_for_display_order() {
    for_each_backend(|store| {
        store.create_budget(new_budget(Category::Bills, "2025-02")).unwrap();
        store.create_budget(new_budget(Category::Food, "2025-03")).unwrap();
        store.create_budget(new_budget(Category::Rent, "2025-02")).unwrap();
        let order: Vec<String> = store
            .budgets_for_display()
            .unwrap()
            .iter()
            .map(|b| format!("{}/{}", b.category, b.month))
            .collect();
        assert_eq!(order, ["Food/2025-03", "Bills/2025-02", "Rent/2025-02"]);
    });
}

#[test]
fn test_concurrent_duplicate_budgets_only_one_wins() {
    for_each_backend(|store| {
        let outcomes: Vec<Result<Budget>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| store.create_budget(new_budget(Category::Travel, "2025-05"))))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let successes = outcomes.iter().filter(|r| r.is_ok()).count();
        let duplicates = outcomes
            .iter()
            .filter(|r| matches!(r, Err(StoreError::DuplicateBudget { .. })))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(duplicates, 7);
        assert_eq!(store.list_budgets().unwrap().len(), 1);
    });
}

#[test]
fn test_concurrent_creates_all_persist() {
    for_each_backend(|store| {
        std::thread::scope(|s| {
            for i in 0..8 {
                s.spawn(move || {
                    store
                        .create_transaction(new_txn(dec!(1), "2025-01-01", &format!("t{i}")))
                        .unwrap();
                });
            }
        });
        assert_eq!(store.list_transactions().unwrap().len(), 8);
    });
}

// ── Guard ─────────────────────────────────────────────────────

#[test]
fn test_guard_allows_self_on_update() {
    let store = RecordStore::open_in_memory().unwrap();
    let food = store.create_budget(new_budget(Category::Food, "2025-01")).unwrap();
    let budgets = store.list_budgets().unwrap();

    assert!(guard::ensure_unique(&budgets, Category::Food, month("2025-01"), None).is_err());
    assert!(
        guard::ensure_unique(&budgets, Category::Food, month("2025-01"), Some(&food.id)).is_ok()
    );
    assert!(guard::ensure_unique(&budgets, Category::Rent, month("2025-01"), None).is_ok());
    assert!(guard::ensure_unique(&[], Category::Food, month("2025-01"), None).is_ok());
}

// ── JSON backend ──────────────────────────────────────────────

#[test]
fn test_json_files_written_in_data_dir() {
    let dir = TempDir::new().unwrap();
    let store = json_store(dir.path(), ReadPolicy::Strict);
    store
        .create_transaction(new_txn(dec!(4.5), "2025-01-05", "Tea"))
        .unwrap();
    store.create_budget(new_budget(Category::Food, "2025-01")).unwrap();

    let text = std::fs::read_to_string(dir.path().join(TRANSACTIONS_FILE)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value[0]["amount"].to_string(), "4.5");
    assert_eq!(value[0]["description"], "Tea");
    assert!(text.contains('\n'), "expected pretty-printed output");
    assert!(dir.path().join(BUDGETS_FILE).exists());
}

#[test]
fn test_json_data_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let created = {
        let store = json_store(dir.path(), ReadPolicy::Strict);
        store
            .create_transaction(new_txn(dec!(4.5), "2025-01-05T08:30:00Z", "Tea"))
            .unwrap()
    };
    let reopened = json_store(dir.path(), ReadPolicy::Strict);
    assert_eq!(reopened.list_transactions().unwrap(), vec![created]);
}

#[test]
fn test_json_write_leaves_no_temp_files() {
    let dir = TempDir::new().unwrap();
    let store = json_store(dir.path(), ReadPolicy::Strict);
    for i in 0..5 {
        store
            .create_transaction(new_txn(dec!(1), "2025-01-01", &format!("t{i}")))
            .unwrap();
    }
    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, [TRANSACTIONS_FILE]);
}

#[test]
fn test_json_blank_file_is_empty_collection() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(TRANSACTIONS_FILE), "  \n").unwrap();
    let store = json_store(dir.path(), ReadPolicy::Strict);
    assert!(store.list_transactions().unwrap().is_empty());
}

#[test]
fn test_json_legacy_id_field_loads() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(BUDGETS_FILE),
        r#"[
  {
    "_id": "1701234567890budget1",
    "category": "Food",
    "amount": 400.0,
    "month": "2024-12",
    "createdAt": "2024-12-01T00:00:00Z",
    "updatedAt": "2024-12-01T00:00:00Z"
  }
]"#,
    )
    .unwrap();
    let store = json_store(dir.path(), ReadPolicy::Strict);
    let budgets = store.list_budgets().unwrap();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].id, "1701234567890budget1");
    assert_eq!(budgets[0].amount, dec!(400));

    // the legacy record still takes part in the uniqueness check
    let err = store
        .create_budget(new_budget(Category::Food, "2024-12"))
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateBudget { .. }));
}

#[test]
fn test_corrupt_json_degraded_read_is_empty() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(TRANSACTIONS_FILE), "{ not json").unwrap();
    let store = json_store(dir.path(), ReadPolicy::Degrade);
    assert!(store.list_transactions().unwrap().is_empty());
}

#[test]
fn test_corrupt_json_strict_read_errors() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(TRANSACTIONS_FILE), "{ not json").unwrap();
    let store = json_store(dir.path(), ReadPolicy::Strict);
    let err = store.list_transactions().unwrap_err();
    assert!(matches!(
        err,
        StoreError::StorageUnavailable {
            collection: "transactions",
            source: StorageFault::Json(_),
        }
    ));
    assert_eq!(err.status_class(), 500);
}

#[test]
fn test_corrupt_json_never_overwritten_by_mutation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(TRANSACTIONS_FILE);
    std::fs::write(&path, "{ not json").unwrap();
    let store = json_store(dir.path(), ReadPolicy::Degrade);

    let err = store
        .create_transaction(new_txn(dec!(1), "2025-01-01", "lost?"))
        .unwrap_err();
    assert!(matches!(err, StoreError::StorageUnavailable { .. }));
    assert!(store.delete_transaction("anything").is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
}

#[test]
fn test_json_missing_directory_created_on_write() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a").join("b");
    let store = json_store(&nested, ReadPolicy::Strict);
    assert!(store.list_budgets().unwrap().is_empty());
    store.create_budget(new_budget(Category::Bills, "2025-03")).unwrap();
    assert!(nested.join(BUDGETS_FILE).exists());
}

// ── SQLite backend ────────────────────────────────────────────

#[test]
fn test_sqlite_reopen_preserves_records_and_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data").join(crate::config::DATABASE_FILE);
    let config = StoreConfig::sqlite(&path).with_read_policy(ReadPolicy::Strict);

    let (txns, budgets) = {
        let store = RecordStore::open(&config).unwrap();
        for (i, date) in ["2025-01-01", "2024-11-30", "2025-02-14"].iter().enumerate() {
            store
                .create_transaction(
                    new_txn(dec!(10.25), date, &format!("t{i}")).with_category(Category::Travel),
                )
                .unwrap();
        }
        store.create_budget(new_budget(Category::Food, "2025-01")).unwrap();
        store.create_budget(new_budget(Category::Rent, "2025-01")).unwrap();
        (store.list_transactions().unwrap(), store.list_budgets().unwrap())
    };

    let store = RecordStore::open(&config).unwrap();
    assert_eq!(store.list_transactions().unwrap(), txns);
    assert_eq!(store.list_budgets().unwrap(), budgets);
    assert_eq!(txns[0].description, "t2");
}

#[test]
fn test_sqlite_schema_version_recorded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(crate::config::DATABASE_FILE);
    RecordStore::open(&StoreConfig::sqlite(&path)).unwrap();
    // opening again runs the migration check against an existing schema
    RecordStore::open(&StoreConfig::sqlite(&path)).unwrap();

    let conn = rusqlite::Connection::open(&path).unwrap();
    let version: i32 = conn
        .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, schema::CURRENT_VERSION);
}

#[test]
fn test_sqlite_unknown_schema_version_refused() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(crate::config::DATABASE_FILE);
    RecordStore::open(&StoreConfig::sqlite(&path)).unwrap();
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute("UPDATE schema_version SET version = 99", [])
            .unwrap();
    }

    let err = match RecordStore::open(&StoreConfig::sqlite(&path)) {
        Ok(_) => panic!("opened a database with an unknown schema version"),
        Err(err) => err,
    };
    assert!(matches!(
        err,
        StoreError::StorageUnavailable {
            collection: "database",
            source: StorageFault::Corrupt(_),
        }
    ));
}

#[test]
fn test_sqlite_keeps_exact_decimal_and_date_text() {
    let store = RecordStore::open_in_memory().unwrap();
    let created = store
        .create_transaction(new_txn(dec!(0.10), "2025-01-31T23:30:00-05:00", "Gum"))
        .unwrap();
    let loaded = store.list_transactions().unwrap().remove(0);
    assert_eq!(loaded.amount, dec!(0.10));
    assert_eq!(loaded.date.as_str(), "2025-01-31T23:30:00-05:00");
    assert_eq!(loaded.date.month(), month("2025-02"));
    assert_eq!(loaded, created);
}

// ── Pluggable collections ─────────────────────────────────────

/// A collection that can never be read or written.
struct Unavailable;

impl<R> Collection<R> for Unavailable {
    fn load(&self) -> Result<Vec<R>> {
        Err(StoreError::storage(
            RecordKind::Transaction,
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        ))
    }

    fn save(&mut self, _records: &[R]) -> Result<()> {
        Err(StoreError::storage(
            RecordKind::Transaction,
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        ))
    }
}

#[test]
fn test_custom_collection_failure_propagates_on_write() {
    let store = RecordStore::from_collections(
        Box::new(Unavailable),
        Box::new(Unavailable),
        ReadPolicy::Degrade,
    );
    assert!(store.list_transactions().unwrap().is_empty());
    assert!(store.list_budgets().unwrap().is_empty());
    assert!(store
        .create_transaction(new_txn(dec!(1), "2025-01-01", "x"))
        .is_err());
    assert!(store.create_budget(new_budget(Category::Food, "2025-01")).is_err());
}
