//! Record CRUD over SQLite.
//!
//! Row-level helpers operate on a plain [`Connection`] so that both the
//! async [`RecordStore`] implementation and the unit-of-work guard share the
//! same SQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};
use serde_json::Value;

use crate::error::{BackendError, RecordError, StorageError, StorageResult};
use crate::store::RecordStore;
use crate::types::{RecordId, StoredRecord};

use super::backend::SqliteBackend;

const RECORD_COLUMNS: &str = "id, revision, payload, created_at, updated_at, deleted_at";

pub(crate) fn parse_timestamp(raw: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            StorageError::Backend(BackendError::Serialization {
                message: format!("invalid timestamp '{raw}': {e}"),
            })
        })
}

pub(crate) fn parse_record_id(raw: &str) -> StorageResult<RecordId> {
    raw.parse().map_err(|e| {
        StorageError::Backend(BackendError::Serialization {
            message: format!("invalid record id '{raw}': {e}"),
        })
    })
}

fn row_to_record(row: &Row<'_>) -> StorageResult<StoredRecord> {
    let id: String = row.get(0)?;
    let revision: i64 = row.get(1)?;
    let payload: String = row.get(2)?;
    let created_at: String = row.get(3)?;
    let updated_at: String = row.get(4)?;
    let deleted_at: Option<String> = row.get(5)?;

    let payload: Value = serde_json::from_str(&payload)?;
    let deleted_at = deleted_at
        .as_deref()
        .map(parse_timestamp)
        .transpose()?;

    Ok(StoredRecord::from_storage(
        parse_record_id(&id)?,
        revision as u64,
        payload,
        parse_timestamp(&created_at)?,
        parse_timestamp(&updated_at)?,
        deleted_at,
    ))
}

/// Inserts a fresh record (revision 1). Fails on duplicate ids.
pub(crate) fn insert_record(
    conn: &Connection,
    payload: Value,
    id: Option<RecordId>,
) -> StorageResult<StoredRecord> {
    let record = StoredRecord::new(id, payload);

    let inserted = conn.execute(
        "INSERT OR IGNORE INTO records (id, revision, payload, created_at, updated_at, deleted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, NULL)",
        params![
            record.id().to_string(),
            record.revision() as i64,
            serde_json::to_string(record.payload())?,
            record.created_at().to_rfc3339(),
            record.updated_at().to_rfc3339(),
        ],
    )?;

    if inserted == 0 {
        return Err(RecordError::AlreadyExists { id: record.id() }.into());
    }

    tracing::debug!(record_id = %record.id(), "record created");
    Ok(record)
}

/// Fetches a record by id, including soft-deleted ones.
pub(crate) fn select_record(
    conn: &Connection,
    id: RecordId,
) -> StorageResult<Option<StoredRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS} FROM records WHERE id = ?1"
    ))?;
    let mut rows = stmt.query(params![id.to_string()])?;

    match rows.next()? {
        Some(row) => Ok(Some(row_to_record(row)?)),
        None => Ok(None),
    }
}

/// Fetches a record by id, filtering out soft-deleted ones.
pub(crate) fn select_live_record(
    conn: &Connection,
    id: RecordId,
) -> StorageResult<Option<StoredRecord>> {
    Ok(select_record(conn, id)?.filter(|r| !r.is_deleted()))
}

#[async_trait]
impl RecordStore for SqliteBackend {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn create(&self, payload: Value, id: Option<RecordId>) -> StorageResult<StoredRecord> {
        let conn = self.conn()?;
        insert_record(&conn, payload, id)
    }

    async fn read(&self, id: RecordId) -> StorageResult<Option<StoredRecord>> {
        let conn = self.conn()?;
        select_live_record(&conn, id)
    }

    async fn update(&self, current: &StoredRecord, payload: Value) -> StorageResult<StoredRecord> {
        let conn = self.conn()?;
        let updated = current.clone().new_revision(payload);

        let changed = conn.execute(
            "UPDATE records SET revision = ?2, payload = ?3, updated_at = ?4
             WHERE id = ?1 AND revision = ?5 AND deleted_at IS NULL",
            params![
                updated.id().to_string(),
                updated.revision() as i64,
                serde_json::to_string(updated.payload())?,
                updated.updated_at().to_rfc3339(),
                current.revision() as i64,
            ],
        )?;

        if changed == 0 {
            return match select_record(&conn, current.id())? {
                None => Err(RecordError::NotFound { id: current.id() }.into()),
                Some(found) if found.is_deleted() => Err(RecordError::Gone {
                    id: current.id(),
                    deleted_at: found.deleted_at(),
                }
                .into()),
                Some(found) => Err(RecordError::RevisionConflict {
                    id: current.id(),
                    expected: current.revision(),
                    actual: found.revision(),
                }
                .into()),
            };
        }

        tracing::debug!(record_id = %updated.id(), revision = updated.revision(), "record updated");
        Ok(updated)
    }

    async fn delete(&self, id: RecordId) -> StorageResult<()> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();

        let changed = conn.execute(
            "UPDATE records SET deleted_at = ?2, updated_at = ?2, revision = revision + 1
             WHERE id = ?1 AND deleted_at IS NULL",
            params![id.to_string(), now],
        )?;

        if changed == 0 {
            return match select_record(&conn, id)? {
                None => Err(RecordError::NotFound { id }.into()),
                Some(found) => Err(RecordError::Gone {
                    id,
                    deleted_at: found.deleted_at(),
                }
                .into()),
            };
        }

        tracing::debug!(record_id = %id, "record deleted");
        Ok(())
    }

    async fn count(&self) -> StorageResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE deleted_at IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
