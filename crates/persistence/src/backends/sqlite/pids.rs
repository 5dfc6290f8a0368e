//! Persistent-identifier storage over SQLite.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, Row, params};

use crate::error::{BackendError, PidError, StorageError, StorageResult};
use crate::store::PidStore;
use crate::types::{PersistentIdentifier, PidStatus, RecordId};

use super::backend::SqliteBackend;
use super::records::{parse_record_id, parse_timestamp};

const PID_COLUMNS: &str = "scheme, pid_value, object_type, object_id, status, created_at, updated_at";

fn row_to_pid(row: &Row<'_>) -> StorageResult<PersistentIdentifier> {
    let scheme: String = row.get(0)?;
    let pid_value: String = row.get(1)?;
    let object_type: String = row.get(2)?;
    let object_id: Option<String> = row.get(3)?;
    let status: String = row.get(4)?;
    let created_at: String = row.get(5)?;
    let updated_at: String = row.get(6)?;

    let object_id = object_id.as_deref().map(parse_record_id).transpose()?;
    let status: PidStatus = status.parse().map_err(|message| {
        StorageError::Backend(BackendError::Serialization { message })
    })?;

    Ok(PersistentIdentifier::from_storage(
        scheme,
        pid_value,
        object_type,
        object_id,
        status,
        parse_timestamp(&created_at)?,
        parse_timestamp(&updated_at)?,
    ))
}

/// Inserts an identifier entry after checking the referenced record exists.
///
/// Callers are responsible for transaction scope; the unit-of-work guard and
/// the async [`PidStore`] implementation both wrap this in one.
pub(crate) fn insert_pid(
    conn: &Connection,
    scheme: &str,
    pid_value: &str,
    object_type: &str,
    object_id: RecordId,
    status: PidStatus,
) -> StorageResult<PersistentIdentifier> {
    let record_exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM records WHERE id = ?1 AND deleted_at IS NULL)",
        params![object_id.to_string()],
        |row| row.get(0),
    )?;
    if !record_exists {
        return Err(PidError::MissingObject {
            scheme: scheme.to_string(),
            pid_value: pid_value.to_string(),
            object_id,
        }
        .into());
    }

    let pid = PersistentIdentifier::new(scheme, pid_value, object_type, object_id, status);

    let inserted = conn.execute(
        "INSERT OR IGNORE INTO pids (scheme, pid_value, object_type, object_id, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            pid.scheme(),
            pid.pid_value(),
            pid.object_type(),
            object_id.to_string(),
            pid.status().code(),
            pid.created_at().to_rfc3339(),
            pid.updated_at().to_rfc3339(),
        ],
    )?;

    if inserted == 0 {
        return Err(PidError::AlreadyExists {
            scheme: scheme.to_string(),
            pid_value: pid_value.to_string(),
        }
        .into());
    }

    tracing::debug!(
        scheme = pid.scheme(),
        pid_value = pid.pid_value(),
        object_id = %object_id,
        status = %pid.status(),
        "persistent identifier minted"
    );
    Ok(pid)
}

pub(crate) fn select_pid(
    conn: &Connection,
    scheme: &str,
    pid_value: &str,
) -> StorageResult<Option<PersistentIdentifier>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PID_COLUMNS} FROM pids WHERE scheme = ?1 AND pid_value = ?2"
    ))?;
    let mut rows = stmt.query(params![scheme, pid_value])?;

    match rows.next()? {
        Some(row) => Ok(Some(row_to_pid(row)?)),
        None => Ok(None),
    }
}

fn transition_status(
    conn: &Connection,
    scheme: &str,
    pid_value: &str,
    to: PidStatus,
) -> StorageResult<PersistentIdentifier> {
    let current = select_pid(conn, scheme, pid_value)?.ok_or_else(|| PidError::NotFound {
        scheme: scheme.to_string(),
        pid_value: pid_value.to_string(),
    })?;

    current.check_transition(to)?;

    let now = Utc::now();
    conn.execute(
        "UPDATE pids SET status = ?3, updated_at = ?4 WHERE scheme = ?1 AND pid_value = ?2",
        params![scheme, pid_value, to.code(), now.to_rfc3339()],
    )?;

    tracing::debug!(
        scheme,
        pid_value,
        from = %current.status(),
        to = %to,
        "persistent identifier status changed"
    );

    Ok(PersistentIdentifier::from_storage(
        current.scheme(),
        current.pid_value(),
        current.object_type(),
        current.object_id(),
        to,
        current.created_at(),
        now,
    ))
}

#[async_trait]
impl PidStore for SqliteBackend {
    async fn mint(
        &self,
        scheme: &str,
        pid_value: &str,
        object_type: &str,
        object_id: RecordId,
        status: PidStatus,
    ) -> StorageResult<PersistentIdentifier> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let pid = insert_pid(&tx, scheme, pid_value, object_type, object_id, status)?;
        tx.commit()?;
        Ok(pid)
    }

    async fn resolve(
        &self,
        scheme: &str,
        pid_value: &str,
    ) -> StorageResult<PersistentIdentifier> {
        let conn = self.conn()?;
        select_pid(&conn, scheme, pid_value)?.ok_or_else(|| {
            PidError::NotFound {
                scheme: scheme.to_string(),
                pid_value: pid_value.to_string(),
            }
            .into()
        })
    }

    async fn register(
        &self,
        scheme: &str,
        pid_value: &str,
    ) -> StorageResult<PersistentIdentifier> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let pid = transition_status(&tx, scheme, pid_value, PidStatus::Registered)?;
        tx.commit()?;
        Ok(pid)
    }

    async fn mark_deleted(
        &self,
        scheme: &str,
        pid_value: &str,
    ) -> StorageResult<PersistentIdentifier> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let pid = transition_status(&tx, scheme, pid_value, PidStatus::Deleted)?;
        tx.commit()?;
        Ok(pid)
    }

    async fn next_pid_value(&self, scheme: &str) -> StorageResult<String> {
        let conn = self.conn()?;
        let next: i64 = conn.query_row(
            "SELECT COALESCE(MAX(CAST(pid_value AS INTEGER)), 0) + 1 FROM pids WHERE scheme = ?1",
            params![scheme],
            |row| row.get(0),
        )?;
        Ok(next.to_string())
    }

    async fn pids_for_record(&self, id: RecordId) -> StorageResult<Vec<PersistentIdentifier>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PID_COLUMNS} FROM pids WHERE object_id = ?1 ORDER BY created_at, pid_value"
        ))?;
        let mut rows = stmt.query(params![id.to_string()])?;

        let mut pids = Vec::new();
        while let Some(row) = rows.next()? {
            pids.push(row_to_pid(row)?);
        }
        Ok(pids)
    }
}
