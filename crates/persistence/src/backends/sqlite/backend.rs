//! SQLite backend implementation.

use std::fmt::Debug;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use serde::{Deserialize, Serialize};

use crate::error::{BackendError, StorageError, StorageResult};

use super::schema;
use super::uow::UnitOfWork;

/// Counter giving each in-memory backend its own shared-cache database.
static MEMORY_DB_SEQ: AtomicUsize = AtomicUsize::new(0);

/// SQLite backend for record, identifier and index storage.
pub struct SqliteBackend {
    pool: Pool<SqliteConnectionManager>,
    config: SqliteBackendConfig,
    is_memory: bool,
}

impl Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("config", &self.config)
            .field("is_memory", &self.is_memory)
            .finish_non_exhaustive()
    }
}

/// Configuration for the SQLite backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteBackendConfig {
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of idle connections.
    ///
    /// Must be at least 1 for in-memory databases: a shared-cache memory
    /// database is destroyed when its last connection closes.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in milliseconds.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u32,

    /// Enable WAL mode for better concurrency (file databases only).
    #[serde(default = "default_true")]
    pub enable_wal: bool,

    /// Enable foreign key constraints.
    #[serde(default = "default_true")]
    pub enable_foreign_keys: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout_ms() -> u64 {
    30000
}

fn default_busy_timeout_ms() -> u32 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for SqliteBackendConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout_ms: default_connection_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
            enable_wal: true,
            enable_foreign_keys: true,
        }
    }
}

impl SqliteBackend {
    /// Creates a new in-memory SQLite backend.
    ///
    /// Each call gets a private database; connections within the pool share
    /// it via SQLite's shared-cache mode.
    pub fn in_memory() -> StorageResult<Self> {
        Self::with_config(":memory:", SqliteBackendConfig::default())
    }

    /// Opens or creates a file-based SQLite database.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        Self::with_config(path, SqliteBackendConfig::default())
    }

    /// Creates a backend with custom configuration.
    pub fn with_config<P: AsRef<Path>>(
        path: P,
        config: SqliteBackendConfig,
    ) -> StorageResult<Self> {
        let path_str = path.as_ref().to_string_lossy();
        let is_memory = path_str == ":memory:";

        let manager = if is_memory {
            let seq = MEMORY_DB_SEQ.fetch_add(1, Ordering::Relaxed);
            SqliteConnectionManager::file(format!(
                "file:docket-mem-{seq}?mode=memory&cache=shared"
            ))
        } else {
            SqliteConnectionManager::file(path.as_ref())
        };

        let mut pragmas = String::new();
        if config.enable_foreign_keys {
            pragmas.push_str("PRAGMA foreign_keys = ON;\n");
        }
        if config.enable_wal && !is_memory {
            pragmas.push_str("PRAGMA journal_mode = WAL;\n");
        }
        pragmas.push_str(&format!("PRAGMA busy_timeout = {};\n", config.busy_timeout_ms));

        let manager = manager.with_init(move |conn| conn.execute_batch(&pragmas));

        let pool = Pool::builder()
            .max_size(config.max_connections)
            .min_idle(Some(config.min_connections.max(1)))
            .connection_timeout(std::time::Duration::from_millis(
                config.connection_timeout_ms,
            ))
            .build(manager)
            .map_err(|e| {
                StorageError::Backend(BackendError::ConnectionFailed {
                    message: e.to_string(),
                })
            })?;

        Ok(Self {
            pool,
            config,
            is_memory,
        })
    }

    /// Initializes (or migrates) the database schema.
    ///
    /// Must be called before any store operation; operations against an
    /// uninitialized database fail with a backend error.
    pub fn init_schema(&self) -> StorageResult<()> {
        let conn = self.conn()?;
        schema::initialize_schema(&conn)?;
        tracing::info!(
            backend = "sqlite",
            in_memory = self.is_memory,
            schema_version = schema::SCHEMA_VERSION,
            "schema initialized"
        );
        Ok(())
    }

    /// Starts a unit of work: a guard over one connection with an open
    /// transaction.
    ///
    /// Writes through the guard become durable and visible to other
    /// connections only on [`UnitOfWork::commit`]; dropping the guard
    /// without committing rolls everything back.
    pub fn unit_of_work(&self) -> StorageResult<UnitOfWork> {
        UnitOfWork::begin(self.conn()?)
    }

    /// Returns `true` if this backend uses an in-memory database.
    pub fn is_memory(&self) -> bool {
        self.is_memory
    }

    /// Returns the backend configuration.
    pub fn config(&self) -> &SqliteBackendConfig {
        &self.config
    }

    pub(crate) fn conn(&self) -> StorageResult<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(StorageError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_backends_are_isolated() {
        let a = SqliteBackend::in_memory().unwrap();
        let b = SqliteBackend::in_memory().unwrap();
        a.init_schema().unwrap();

        // Backend `b` never saw init_schema; its database must be empty.
        let conn = b.conn().unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'records'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 0);
    }

    #[test]
    fn test_pool_connections_share_memory_db() {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.init_schema().unwrap();

        // Two distinct pooled connections must see the same database.
        let c1 = backend.conn().unwrap();
        let c2 = backend.conn().unwrap();
        c1.execute_batch("CREATE TABLE poke (x INTEGER)").unwrap();
        let n: i64 = c2
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'poke'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn test_open_file_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docket.db");

        let backend = SqliteBackend::open(&path).unwrap();
        backend.init_schema().unwrap();

        assert!(!backend.is_memory());
        assert!(path.exists());
    }

    #[test]
    fn test_config_defaults() {
        let config = SqliteBackendConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
        assert!(config.enable_wal);
    }
}
