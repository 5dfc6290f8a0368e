//! SQLite backend.
//!
//! Stores records, persistent identifiers and index documents in a single
//! SQLite database behind an r2d2 connection pool. Supports file-based
//! databases and (pool-shared) in-memory databases for tests.

mod backend;
mod pids;
mod records;
mod schema;
mod search;
mod uow;

pub use backend::{SqliteBackend, SqliteBackendConfig};
pub use schema::SCHEMA_VERSION;
pub use uow::UnitOfWork;
