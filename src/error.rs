use thiserror::Error;

use crate::models::{Category, Month};

/// Which collection a record or failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Transaction,
    Budget,
}

impl RecordKind {
    /// Collection name, also used as the file stem and table name.
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Transaction => "transactions",
            Self::Budget => "budgets",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transaction => write!(f, "transaction"),
            Self::Budget => write!(f, "budget"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: RecordKind, id: String },

    #[error("a {category} budget for {month} already exists")]
    DuplicateBudget { category: Category, month: Month },

    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("{collection} storage unavailable: {source}")]
    StorageUnavailable {
        collection: &'static str,
        #[source]
        source: StorageFault,
    },
}

/// The underlying cause of a [`StoreError::StorageUnavailable`].
#[derive(Debug, Error)]
pub enum StorageFault {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("could not replace collection file: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("collection lock poisoned by a panicked writer")]
    Poisoned,
}

impl StoreError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn storage(kind: RecordKind, source: impl Into<StorageFault>) -> Self {
        Self::StorageUnavailable {
            collection: kind.collection(),
            source: source.into(),
        }
    }

    /// HTTP status class a front end should answer with.
    pub fn status_class(&self) -> u16 {
        match self {
            Self::Validation { .. } | Self::DuplicateBudget { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::StorageUnavailable { .. } => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
