//! SQLite schema for the artifact store.

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS artifacts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    kind TEXT NOT NULL,
    source TEXT NOT NULL,
    session_id TEXT,
    body BLOB NOT NULL,
    size INTEGER NOT NULL,
    digest TEXT NOT NULL,
    content_type TEXT NOT NULL,
    produced_by_json TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    prompt TEXT
);

CREATE INDEX IF NOT EXISTS idx_artifacts_created ON artifacts(created_at DESC, id DESC);
"#;
