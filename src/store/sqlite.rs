use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Connection, Row, Statement};
use rust_decimal::Decimal;
use std::marker::PhantomData;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use super::{schema, Collection, Record};
use crate::error::{Result, StorageFault, StoreError};
use crate::models::{Budget, Category, Month, Transaction, TxnDate};

pub(crate) fn open(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(database_fault)?;
    }
    let conn = Connection::open(path).map_err(database_fault)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")
        .map_err(database_fault)?;
    migrate(&conn)?;
    Ok(conn)
}

pub(crate) fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().map_err(database_fault)?;
    migrate(&conn)?;
    Ok(conn)
}

fn database_fault(source: impl Into<StorageFault>) -> StoreError {
    StoreError::StorageUnavailable {
        collection: "database",
        source: source.into(),
    }
}

/// Creates the schema in a fresh database. An existing database must
/// already be at [`schema::CURRENT_VERSION`]; anything else is refused
/// rather than read with the wrong column layout.
fn migrate(conn: &Connection) -> Result<()> {
    let has_version_table: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )
        .map_err(database_fault)?;

    if !has_version_table {
        conn.execute_batch(schema::SCHEMA_V1)
            .map_err(database_fault)?;
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            params![schema::CURRENT_VERSION],
        )
        .map_err(database_fault)?;
        tracing::info!(version = schema::CURRENT_VERSION, "created database schema");
        return Ok(());
    }

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .map_err(database_fault)?;
    if version != schema::CURRENT_VERSION {
        return Err(database_fault(StorageFault::Corrupt(format!(
            "schema version {version}, expected {}",
            schema::CURRENT_VERSION
        ))));
    }
    Ok(())
}

/// Row mapping for a record kind stored in its own table.
pub(crate) trait SqlRecord: Sized {
    const TABLE: &'static str;
    const SELECT: &'static str;
    const INSERT: &'static str;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
    fn insert(&self, stmt: &mut Statement<'_>, position: usize) -> rusqlite::Result<()>;
}

/// One table of a shared SQLite connection, rewritten in full inside a
/// single SQL transaction on every save.
pub struct SqliteCollection<R> {
    conn: Arc<Mutex<Connection>>,
    _record: PhantomData<fn() -> R>,
}

impl<R> SqliteCollection<R> {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            conn,
            _record: PhantomData,
        }
    }
}

impl<R: Record + SqlRecord> Collection<R> for SqliteCollection<R> {
    fn load(&self) -> Result<Vec<R>> {
        let fail = |e: rusqlite::Error| StoreError::storage(R::KIND, e);
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::storage(R::KIND, StorageFault::Poisoned))?;
        let mut stmt = conn.prepare(R::SELECT).map_err(fail)?;
        let rows = stmt.query_map([], R::from_row).map_err(fail)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(fail)
    }

    fn save(&mut self, records: &[R]) -> Result<()> {
        let fail = |e: rusqlite::Error| StoreError::storage(R::KIND, e);
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::storage(R::KIND, StorageFault::Poisoned))?;
        let tx = conn.transaction().map_err(fail)?;
        tx.execute(&format!("DELETE FROM {}", R::TABLE), [])
            .map_err(fail)?;
        {
            let mut stmt = tx.prepare(R::INSERT).map_err(fail)?;
            for (position, record) in records.iter().enumerate() {
                record.insert(&mut stmt, position).map_err(fail)?;
            }
        }
        tx.commit().map_err(fail)
    }
}

// ── Row mapping ───────────────────────────────────────────────

impl SqlRecord for Transaction {
    const TABLE: &'static str = "transactions";
    const SELECT: &'static str =
        "SELECT id, amount, date, description, category, created_at, updated_at
         FROM transactions ORDER BY position";
    const INSERT: &'static str =
        "INSERT INTO transactions (id, position, amount, date, description, category, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Transaction {
            id: row.get(0)?,
            amount: parse_column(row, 1, Decimal::from_str)?,
            date: parse_column(row, 2, TxnDate::parse)?,
            description: row.get(3)?,
            category: parse_column(row, 4, Category::parse)?,
            created_at: parse_column(row, 5, parse_timestamp)?,
            updated_at: parse_column(row, 6, parse_timestamp)?,
        })
    }

    fn insert(&self, stmt: &mut Statement<'_>, position: usize) -> rusqlite::Result<()> {
        stmt.execute(params![
            self.id,
            position as i64,
            self.amount.to_string(),
            self.date.as_str(),
            self.description,
            self.category.as_str(),
            self.created_at.to_rfc3339(),
            self.updated_at.to_rfc3339(),
        ])?;
        Ok(())
    }
}

impl SqlRecord for Budget {
    const TABLE: &'static str = "budgets";
    const SELECT: &'static str = "SELECT id, category, amount, month, created_at, updated_at
         FROM budgets ORDER BY position";
    const INSERT: &'static str =
        "INSERT INTO budgets (id, position, category, amount, month, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Budget {
            id: row.get(0)?,
            category: parse_column(row, 1, Category::parse)?,
            amount: parse_column(row, 2, Decimal::from_str)?,
            month: parse_column(row, 3, Month::parse)?,
            created_at: parse_column(row, 4, parse_timestamp)?,
            updated_at: parse_column(row, 5, parse_timestamp)?,
        })
    }

    fn insert(&self, stmt: &mut Statement<'_>, position: usize) -> rusqlite::Result<()> {
        stmt.execute(params![
            self.id,
            position as i64,
            self.category.as_str(),
            self.amount.to_string(),
            self.month.to_string(),
            self.created_at.to_rfc3339(),
            self.updated_at.to_rfc3339(),
        ])?;
        Ok(())
    }
}

fn parse_timestamp(s: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

/// Reads a TEXT column and converts it, reporting conversion failures as
/// SQLite conversion errors for that column.
fn parse_column<T, E>(
    row: &Row<'_>,
    idx: usize,
    parse: impl FnOnce(&str) -> std::result::Result<T, E>,
) -> rusqlite::Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    let text: String = row.get(idx)?;
    parse(&text).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
