// ==========================================
// Schedule Import - SQLite connection setup
// ==========================================
// Every Connection::open goes through here so that foreign keys
// and busy_timeout are applied uniformly.
// ==========================================

use rusqlite::Connection;
use std::path::PathBuf;
use std::time::Duration;

/// Default busy_timeout (ms)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Environment override for the database location
pub const DB_PATH_ENV: &str = "SCHEDULE_IMPORT_DB_PATH";

const DB_FILE_NAME: &str = "schedule_import.db";

/// Tables owned by the import pipeline
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS config_kv (
    scope_id   TEXT NOT NULL DEFAULT 'global',
    key        TEXT NOT NULL,
    value      TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS users (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    full_name TEXT NOT NULL,
    role      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS subjects (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    name               TEXT NOT NULL,
    name_key           TEXT NOT NULL UNIQUE, -- trimmed, lowercased name
    short_name         TEXT NOT NULL,
    description        TEXT,
    display_color      TEXT NOT NULL,
    default_teacher_id INTEGER
);

CREATE TABLE IF NOT EXISTS imported_files (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    original_name TEXT NOT NULL,
    stored_name   TEXT NOT NULL,
    file_path     TEXT,
    file_size     INTEGER NOT NULL DEFAULT 0,
    mime_type     TEXT NOT NULL,
    import_type   TEXT NOT NULL CHECK (import_type IN ('csv', 'spreadsheet')),
    status        TEXT NOT NULL CHECK (status IN ('success', 'error')),
    items_count   INTEGER NOT NULL DEFAULT 0,
    success_count INTEGER NOT NULL DEFAULT 0,
    error_count   INTEGER NOT NULL DEFAULT 0,
    uploaded_by   INTEGER NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS schedule_items (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_id       INTEGER NOT NULL REFERENCES subjects(id),
    day_of_week      INTEGER NOT NULL CHECK (day_of_week BETWEEN 0 AND 6),
    start_time       TEXT NOT NULL,
    end_time         TEXT NOT NULL,
    room_number      TEXT,
    teacher_name     TEXT,
    imported_file_id INTEGER REFERENCES imported_files(id)
);

CREATE INDEX IF NOT EXISTS idx_schedule_items_imported_file
    ON schedule_items(imported_file_id);
"#;

/// Apply the shared PRAGMAs (per connection)
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Open a SQLite connection with the shared configuration
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Create missing tables (idempotent)
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

/// Database path: env override, else the per-user data directory
pub fn default_db_path() -> PathBuf {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("schedule-import")
        .join(DB_FILE_NAME)
}
