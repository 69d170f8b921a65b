use std::path::{Path, PathBuf};

/// JSON collection files, relative to the data directory.
pub const TRANSACTIONS_FILE: &str = "transactions.json";
pub const BUDGETS_FILE: &str = "budgets.json";
/// SQLite database file, relative to the data directory.
pub const DATABASE_FILE: &str = "spendtrack.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// One pretty-printed JSON array per collection inside `dir`.
    Json { dir: PathBuf },
    /// A single SQLite database file.
    Sqlite { path: PathBuf },
}

/// What `list_*` does when a collection cannot be read.
///
/// Writes are unaffected: a mutation always fails on an unreadable
/// collection instead of overwriting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadPolicy {
    /// Log a warning and return an empty list.
    #[default]
    Degrade,
    /// Return `StorageUnavailable`.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: Backend,
    pub read_policy: ReadPolicy,
}

impl StoreConfig {
    pub fn json(dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::Json { dir: dir.into() },
            read_policy: ReadPolicy::default(),
        }
    }

    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::Sqlite { path: path.into() },
            read_policy: ReadPolicy::default(),
        }
    }

    pub fn with_read_policy(mut self, read_policy: ReadPolicy) -> Self {
        self.read_policy = read_policy;
        self
    }

    /// Where the data for this configuration lives, for messages.
    pub fn location(&self) -> &Path {
        match &self.backend {
            Backend::Json { dir } => dir,
            Backend::Sqlite { path } => path,
        }
    }
}

/// Per-user data directory, e.g. `~/.local/share/spendtrack` on Linux.
pub fn default_data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "spendtrack", "spendtrack")
        .map(|dirs| dirs.data_dir().to_path_buf())
}
