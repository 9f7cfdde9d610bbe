use rusqlite::Connection;

use crate::error::StorageError;

pub const SCHEMA_VERSION: i32 = 1;

/// Pragmas that SQLite scopes to a single connection. Foreign keys in
/// particular are off by default on every new connection, so this runs on
/// each open, not only when the schema is created.
pub fn configure_connection(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
    ",
    )?;
    Ok(())
}

/// Create any missing tables. Safe to run against an initialized database.
pub fn init_schema(conn: &Connection) -> Result<(), StorageError> {
    configure_connection(conn)?;
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

pub fn schema_version(conn: &Connection) -> Result<Option<i32>, StorageError> {
    let version = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get::<_, Option<i32>>(0)
    })?;
    Ok(version)
}

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at INTEGER NOT NULL
);
INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, unixepoch());

CREATE TABLE IF NOT EXISTS form (
    id_form INTEGER PRIMARY KEY AUTOINCREMENT,
    label_form TEXT UNIQUE NOT NULL,
    doc_form BLOB NOT NULL
);

CREATE TABLE IF NOT EXISTS select_field (
    id_select INTEGER PRIMARY KEY AUTOINCREMENT,
    label_select TEXT UNIQUE NOT NULL
);

CREATE TABLE IF NOT EXISTS field (
    id_field INTEGER PRIMARY KEY AUTOINCREMENT,
    id_form INTEGER NOT NULL REFERENCES form(id_form) ON DELETE CASCADE,
    name_field TEXT NOT NULL,
    type_field INTEGER NOT NULL,
    label_field TEXT NOT NULL,
    UNIQUE (id_form, name_field)
);
CREATE INDEX IF NOT EXISTS idx_field_form ON field (id_form);

CREATE TABLE IF NOT EXISTS choice (
    id_choice INTEGER PRIMARY KEY AUTOINCREMENT,
    id_select INTEGER NOT NULL REFERENCES select_field(id_select) ON DELETE CASCADE,
    name_choice TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_choice_select ON choice (id_select);

CREATE TABLE IF NOT EXISTS form_select (
    id_fs INTEGER PRIMARY KEY AUTOINCREMENT,
    id_form INTEGER NOT NULL REFERENCES form(id_form) ON DELETE CASCADE,
    id_select INTEGER NOT NULL REFERENCES select_field(id_select) ON DELETE RESTRICT,
    name_select TEXT NOT NULL,
    UNIQUE (id_form, name_select)
);
CREATE INDEX IF NOT EXISTS idx_form_select_form ON form_select (id_form);
CREATE INDEX IF NOT EXISTS idx_form_select_select ON form_select (id_select);
";
