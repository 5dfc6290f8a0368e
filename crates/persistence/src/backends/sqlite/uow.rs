//! Unit-of-work guard for explicit-commit batching.

use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use serde_json::Value;

use crate::error::StorageResult;
use crate::types::{PersistentIdentifier, PidStatus, RecordId, StoredRecord};

use super::{pids, records};

/// A unit of work: one connection with an open transaction.
///
/// Writes made through the guard are visible to reads *through the guard*
/// but become durable and visible to other connections only on
/// [`commit`](UnitOfWork::commit). Dropping the guard without committing
/// rolls everything back.
///
/// # Example
///
/// ```ignore
/// let uow = backend.unit_of_work()?;
/// let record_1 = uow.create_record(json!({"type": "report"}), None)?;
/// let record_2 = uow.create_record(json!({"type": "order"}), None)?;
/// uow.commit()?;
/// ```
pub struct UnitOfWork {
    conn: PooledConnection<SqliteConnectionManager>,
    committed: bool,
}

impl UnitOfWork {
    pub(crate) fn begin(conn: PooledConnection<SqliteConnectionManager>) -> StorageResult<Self> {
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(Self {
            conn,
            committed: false,
        })
    }

    /// Creates a record inside the open transaction.
    pub fn create_record(
        &self,
        payload: Value,
        id: Option<RecordId>,
    ) -> StorageResult<StoredRecord> {
        records::insert_record(&self.conn, payload, id)
    }

    /// Reads a live record through the open transaction, seeing uncommitted
    /// writes made via this guard.
    pub fn read_record(&self, id: RecordId) -> StorageResult<Option<StoredRecord>> {
        records::select_live_record(&self.conn, id)
    }

    /// Mints a persistent identifier inside the open transaction.
    ///
    /// The referenced record must exist (committed, or created earlier
    /// through this same guard).
    pub fn mint_pid(
        &self,
        scheme: &str,
        pid_value: &str,
        object_type: &str,
        object_id: RecordId,
        status: PidStatus,
    ) -> StorageResult<PersistentIdentifier> {
        pids::insert_pid(&self.conn, scheme, pid_value, object_type, object_id, status)
    }

    /// Commits the transaction, making all writes durable.
    pub fn commit(mut self) -> StorageResult<()> {
        self.conn.execute_batch("COMMIT")?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        if !self.committed {
            // Best effort: the connection returns to the pool either way.
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::SqliteBackend;
    use crate::store::{PidStore, RecordStore};
    use crate::types::PidStatus;
    use serde_json::json;

    fn backend() -> SqliteBackend {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.init_schema().unwrap();
        backend
    }

    #[tokio::test]
    async fn test_commit_makes_records_visible() {
        let backend = backend();

        let uow = backend.unit_of_work().unwrap();
        let record_1 = uow.create_record(json!({"n": 1}), None).unwrap();
        let record_2 = uow.create_record(json!({"n": 2}), None).unwrap();

        // Visible inside the unit of work before commit.
        assert!(uow.read_record(record_1.id()).unwrap().is_some());

        uow.commit().unwrap();

        assert!(backend.read(record_1.id()).await.unwrap().is_some());
        assert!(backend.read(record_2.id()).await.unwrap().is_some());
        assert_eq!(backend.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let backend = backend();

        let record_id = {
            let uow = backend.unit_of_work().unwrap();
            let record = uow.create_record(json!({}), None).unwrap();
            record.id()
            // dropped uncommitted
        };

        assert!(backend.read(record_id).await.unwrap().is_none());
        assert_eq!(backend.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mint_inside_unit_of_work() {
        let backend = backend();

        let uow = backend.unit_of_work().unwrap();
        let record = uow.create_record(json!({"type": "report"}), None).unwrap();
        // The record is uncommitted but visible to the same transaction.
        uow.mint_pid("recid", "1", "rec", record.id(), PidStatus::Registered)
            .unwrap();
        uow.commit().unwrap();

        let pid = backend.resolve("recid", "1").await.unwrap();
        assert_eq!(pid.object_id(), Some(record.id()));
    }
}
