//! SQLite schema definitions and migrations.

use rusqlite::Connection;

use crate::error::StorageResult;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema.
pub fn initialize_schema(conn: &Connection) -> StorageResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        create_schema_v1(conn)?;
        set_schema_version(conn, 1)?;
        migrate_schema(conn, 1)?;
    } else if current_version < SCHEMA_VERSION {
        migrate_schema(conn, current_version)?;
    }

    Ok(())
}

/// Get the current schema version.
fn get_schema_version(conn: &Connection) -> StorageResult<i32> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL
        )",
        [],
    )?;

    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .ok();

    Ok(version.unwrap_or(0))
}

/// Set the schema version.
fn set_schema_version(conn: &Connection, version: i32) -> StorageResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Create the initial schema (version 1).
fn create_schema_v1(conn: &Connection) -> StorageResult<()> {
    // Records table: opaque JSON payload keyed by generated UUID
    conn.execute(
        "CREATE TABLE IF NOT EXISTS records (
            id TEXT PRIMARY KEY,
            revision INTEGER NOT NULL,
            payload TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            deleted_at TEXT
        )",
        [],
    )?;

    // Persistent identifiers: (scheme, pid_value) is the external identity
    conn.execute(
        "CREATE TABLE IF NOT EXISTS pids (
            scheme TEXT NOT NULL,
            pid_value TEXT NOT NULL,
            object_type TEXT NOT NULL,
            object_id TEXT,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (scheme, pid_value),
            FOREIGN KEY (object_id) REFERENCES records(id)
        )",
        [],
    )?;

    // Index documents: denormalized payload copies per named index, with
    // extracted columns for sorting, filtering, facets and suggestions
    conn.execute(
        "CREATE TABLE IF NOT EXISTS index_documents (
            index_name TEXT NOT NULL,
            record_id TEXT NOT NULL,
            payload TEXT NOT NULL,
            title TEXT,
            suggest_title TEXT,
            control_number TEXT,
            doc_type TEXT,
            indexed_at TEXT NOT NULL,
            PRIMARY KEY (index_name, record_id)
        )",
        [],
    )?;

    create_indexes(conn)?;

    Ok(())
}

/// Create indexes for efficient queries.
fn create_indexes(conn: &Connection) -> StorageResult<()> {
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_records_updated ON records(updated_at)",
        "CREATE INDEX IF NOT EXISTS idx_pids_object ON pids(object_type, object_id)",
        "CREATE INDEX IF NOT EXISTS idx_docs_type ON index_documents(index_name, doc_type)",
        "CREATE INDEX IF NOT EXISTS idx_docs_title ON index_documents(index_name, title)",
        "CREATE INDEX IF NOT EXISTS idx_docs_suggest ON index_documents(index_name, suggest_title)",
    ];

    for index_sql in &indexes {
        conn.execute(index_sql, [])?;
    }

    Ok(())
}

/// Run schema migrations from current version to latest.
///
/// No migrations exist yet; this is the hook future schema versions extend
/// with per-version steps.
fn migrate_schema(_conn: &Connection, from_version: i32) -> StorageResult<()> {
    match from_version {
        SCHEMA_VERSION => Ok(()),
        other => Err(crate::error::StorageError::Backend(
            crate::error::BackendError::Internal {
                message: format!("unknown schema version: {other}"),
                source: None,
            },
        )),
    }
}
