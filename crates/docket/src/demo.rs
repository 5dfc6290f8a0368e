//! Demo data seeding.
//!
//! Loads the two example records the way the REST layer would have ended up
//! with them: both created in one unit of work, committed together, their
//! identifiers minted as REGISTERED, and both indexed.

use docket_persistence::backends::sqlite::SqliteBackend;
use docket_persistence::index::RecordIndexer;
use docket_persistence::store::PidStore;
use docket_persistence::types::{PidStatus, StoredRecord};
use serde_json::json;
use tracing::info;

/// Seeds the example records, returning them in creation order.
///
/// Re-running against a non-empty store fails on the identifier uniqueness
/// constraint; seeding is meant for a fresh database.
pub async fn seed_demo(
    backend: &SqliteBackend,
    indexer: &RecordIndexer<SqliteBackend>,
) -> anyhow::Result<(StoredRecord, StoredRecord)> {
    // One unit of work for the batch; nothing is visible until the commit.
    let uow = backend.unit_of_work()?;
    let record_1 = uow.create_record(
        json!({
            "title": "Awesome meeting report",
            "description": "Notes of the last meeting.",
            "participants": 42,
            "type": "report",
        }),
        None,
    )?;
    let record_2 = uow.create_record(
        json!({
            "title": "Furniture order",
            "description": "Tables for the meeting room.",
            "type": "order",
        }),
        None,
    )?;
    uow.commit()?;

    let pid_1 = backend
        .mint("recid", "1", "rec", record_1.id(), PidStatus::Registered)
        .await?;
    let pid_2 = backend
        .mint("recid", "2", "rec", record_2.id(), PidStatus::Registered)
        .await?;

    indexer.index_by_id(record_1.id()).await?;
    indexer.index_by_id(record_2.id()).await?;

    info!(
        pid_1 = pid_1.pid_value(),
        pid_2 = pid_2.pid_value(),
        index = indexer.index_name(),
        "demo records seeded"
    );

    Ok((record_1, record_2))
}
