//! Durable storage for transactions and budgets.
//!
//! Every collection is loaded and saved as a whole. Mutations hold the
//! collection's mutex for the full load → change → save cycle, so two
//! writers never interleave and the budget uniqueness check cannot race
//! with another create.

mod guard;
mod id;
mod json;
mod schema;
mod sqlite;

pub use json::JsonCollection;
pub use sqlite::SqliteCollection;

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::{Backend, ReadPolicy, StoreConfig, BUDGETS_FILE, TRANSACTIONS_FILE};
use crate::error::{RecordKind, Result, StorageFault, StoreError};
use crate::models::{
    Budget, BudgetPatch, NewBudget, NewTransaction, Transaction, TransactionPatch,
};
use crate::query;

/// A record kind the store can hold.
pub trait Record: Clone + Send + 'static {
    const KIND: RecordKind;

    fn id(&self) -> &str;
    fn updated_at(&self) -> DateTime<Utc>;
    fn set_updated_at(&mut self, at: DateTime<Utc>);

    /// Bumps `updated_at` so it is strictly later than before, even when
    /// the clock has not advanced since the last write.
    fn touch(&mut self) {
        let previous = self.updated_at();
        let now = Utc::now();
        let next = if now > previous {
            now
        } else {
            previous + chrono::Duration::milliseconds(1)
        };
        self.set_updated_at(next);
    }
}

impl Record for Transaction {
    const KIND: RecordKind = RecordKind::Transaction;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn set_updated_at(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

impl Record for Budget {
    const KIND: RecordKind = RecordKind::Budget;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn set_updated_at(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

/// A medium holding one collection, read and written in full.
///
/// `save` must be atomic from a reader's point of view: a later `load`
/// sees either the previous or the new collection, never a mix.
/// A collection that was never written loads as empty.
pub trait Collection<R>: Send {
    fn load(&self) -> Result<Vec<R>>;
    fn save(&mut self, records: &[R]) -> Result<()>;
}

type Shared<R> = Mutex<Box<dyn Collection<R>>>;

pub struct RecordStore {
    transactions: Shared<Transaction>,
    budgets: Shared<Budget>,
    read_policy: ReadPolicy,
}

impl RecordStore {
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let store = match &config.backend {
            Backend::Json { dir } => Self::from_collections(
                Box::new(JsonCollection::new(dir.join(TRANSACTIONS_FILE))),
                Box::new(JsonCollection::new(dir.join(BUDGETS_FILE))),
                config.read_policy,
            ),
            Backend::Sqlite { path } => {
                let conn = sqlite::open(path)?;
                Self::over_connection(conn, config.read_policy)
            }
        };
        tracing::info!(location = %config.location().display(), "opened record store");
        Ok(store)
    }

    /// An ephemeral SQLite-backed store, discarded on drop.
    pub fn open_in_memory() -> Result<Self> {
        let conn = sqlite::open_in_memory()?;
        Ok(Self::over_connection(conn, ReadPolicy::Strict))
    }

    pub fn from_collections(
        transactions: Box<dyn Collection<Transaction>>,
        budgets: Box<dyn Collection<Budget>>,
        read_policy: ReadPolicy,
    ) -> Self {
        Self {
            transactions: Mutex::new(transactions),
            budgets: Mutex::new(budgets),
            read_policy,
        }
    }

    fn over_connection(conn: rusqlite::Connection, read_policy: ReadPolicy) -> Self {
        let conn = Arc::new(Mutex::new(conn));
        Self::from_collections(
            Box::new(SqliteCollection::<Transaction>::new(Arc::clone(&conn))),
            Box::new(SqliteCollection::<Budget>::new(conn)),
            read_policy,
        )
    }

    // ── Transactions ──────────────────────────────────────────

    /// All transactions in store order (most recently created first).
    pub fn list_transactions(&self) -> Result<Vec<Transaction>> {
        self.read(&self.transactions)
    }

    /// All transactions, most recent `date` first.
    pub fn transactions_for_display(&self) -> Result<Vec<Transaction>> {
        let mut txns = self.list_transactions()?;
        query::sort_transactions(&mut txns);
        Ok(txns)
    }

    pub fn create_transaction(&self, new: NewTransaction) -> Result<Transaction> {
        new.validate()?;
        let txn = new.into_record(id::generate_id(), Utc::now());
        let stored = txn.clone();
        mutate(&self.transactions, |records| {
            records.insert(0, stored);
            Ok(Some(()))
        })?;
        tracing::debug!(id = %txn.id, "created transaction");
        Ok(txn)
    }

    /// Applies `patch` to the transaction with `id`. `Ok(None)` when there
    /// is no such transaction; nothing is created in that case.
    pub fn update_transaction(
        &self,
        id: &str,
        patch: TransactionPatch,
    ) -> Result<Option<Transaction>> {
        patch.validate()?;
        let updated = mutate(&self.transactions, |records| {
            let Some(txn) = records.iter_mut().find(|t| t.id == id) else {
                return Ok(None);
            };
            patch.apply(txn);
            txn.touch();
            Ok(Some(txn.clone()))
        })?;
        if updated.is_some() {
            tracing::debug!(id, "updated transaction");
        }
        Ok(updated)
    }

    /// Returns whether a transaction was removed.
    pub fn delete_transaction(&self, id: &str) -> Result<bool> {
        remove(&self.transactions, id)
    }

    // ── Budgets ───────────────────────────────────────────────

    pub fn list_budgets(&self) -> Result<Vec<Budget>> {
        self.read(&self.budgets)
    }

    /// All budgets, newest month first, then by category name.
    pub fn budgets_for_display(&self) -> Result<Vec<Budget>> {
        let mut budgets = self.list_budgets()?;
        query::sort_budgets(&mut budgets);
        Ok(budgets)
    }

    /// Fails with `DuplicateBudget`, leaving the collection untouched, when
    /// a budget for the same category and month already exists.
    pub fn create_budget(&self, new: NewBudget) -> Result<Budget> {
        new.validate()?;
        let budget = new.into_record(id::generate_id(), Utc::now());
        let stored = budget.clone();
        mutate(&self.budgets, |records| {
            guard::ensure_unique(records, stored.category, stored.month, None)?;
            records.insert(0, stored);
            Ok(Some(()))
        })?;
        tracing::debug!(
            id = %budget.id,
            category = %budget.category,
            month = %budget.month,
            "created budget"
        );
        Ok(budget)
    }

    /// Like [`RecordStore::update_transaction`]. Moving a budget onto a
    /// category and month that another budget already holds is rejected
    /// with `DuplicateBudget`.
    pub fn update_budget(&self, id: &str, patch: BudgetPatch) -> Result<Option<Budget>> {
        patch.validate()?;
        let updated = mutate(&self.budgets, |records| {
            let Some(index) = records.iter().position(|b| b.id == id) else {
                return Ok(None);
            };
            let (category, month) = patch.target_key(&records[index]);
            guard::ensure_unique(records, category, month, Some(id))?;
            let budget = &mut records[index];
            patch.apply(budget);
            budget.touch();
            Ok(Some(budget.clone()))
        })?;
        if updated.is_some() {
            tracing::debug!(id, "updated budget");
        }
        Ok(updated)
    }

    pub fn delete_budget(&self, id: &str) -> Result<bool> {
        remove(&self.budgets, id)
    }

    fn read<R: Record>(&self, shared: &Shared<R>) -> Result<Vec<R>> {
        let loaded = lock(shared).and_then(|collection| collection.load());
        match loaded {
            Ok(records) => Ok(records),
            Err(err) if self.read_policy == ReadPolicy::Degrade => {
                tracing::warn!(
                    error = %err,
                    "reading {} failed, returning no records",
                    R::KIND.collection()
                );
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }
}

fn lock<R: Record>(shared: &Shared<R>) -> Result<MutexGuard<'_, Box<dyn Collection<R>>>> {
    shared
        .lock()
        .map_err(|_| StoreError::storage(R::KIND, StorageFault::Poisoned))
}

/// Runs one read-modify-write cycle under the collection lock.
///
/// `change` returns `None` when it left the records alone, in which case
/// nothing is written. The load here is always strict: a collection that
/// cannot be read is never overwritten.
fn mutate<R: Record, T>(
    shared: &Shared<R>,
    change: impl FnOnce(&mut Vec<R>) -> Result<Option<T>>,
) -> Result<Option<T>> {
    let mut collection = lock(shared)?;
    let mut records = collection.load()?;
    let outcome = change(&mut records)?;
    if outcome.is_some() {
        collection.save(&records)?;
    }
    Ok(outcome)
}

fn remove<R: Record>(shared: &Shared<R>, id: &str) -> Result<bool> {
    let removed = mutate(shared, |records| {
        let before = records.len();
        records.retain(|r| r.id() != id);
        Ok((records.len() < before).then_some(()))
    })?;
    if removed.is_some() {
        tracing::debug!(id, "deleted {}", R::KIND);
    }
    Ok(removed.is_some())
}

#[cfg(test)]
mod tests;
