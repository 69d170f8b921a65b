pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS transactions (
    id          TEXT PRIMARY KEY,
    position    INTEGER NOT NULL,
    amount      TEXT NOT NULL,
    date        TEXT NOT NULL,
    description TEXT NOT NULL,
    category    TEXT NOT NULL DEFAULT 'Other'
                CHECK (category IN ('Food', 'Rent', 'Travel', 'Shopping', 'Bills', 'Other')),
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_transactions_position ON transactions(position);

CREATE TABLE IF NOT EXISTS budgets (
    id          TEXT PRIMARY KEY,
    position    INTEGER NOT NULL,
    category    TEXT NOT NULL
                CHECK (category IN ('Food', 'Rent', 'Travel', 'Shopping', 'Bills', 'Other')),
    amount      TEXT NOT NULL,
    month       TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    UNIQUE(category, month)
);

CREATE INDEX IF NOT EXISTS idx_budgets_position ON budgets(position);
"#;

pub(crate) const CURRENT_VERSION: i32 = 1;
