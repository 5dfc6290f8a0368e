//! Delete interaction handler.
//!
//! `DELETE /records/{pid}` soft-deletes the record, marks the identifier
//! deleted and removes the index document.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use docket_persistence::store::{PidStore, RecordStore, SearchIndex};
use tracing::debug;

use crate::config::Verb;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

use super::{RECID_SCHEME, resolve_live};

/// Handler for the delete interaction.
///
/// # Response
///
/// - `204 No Content` - record, identifier and index document removed
/// - `404 Not Found` / `410 Gone` - identifier resolution failed
pub async fn delete_handler<S>(
    State(state): State<AppState<S>>,
    Path(pid_value): Path<String>,
) -> ApiResult<StatusCode>
where
    S: RecordStore + PidStore + SearchIndex + Send + Sync + 'static,
{
    if !state.policy().allows(Verb::Delete) {
        return Err(ApiError::Forbidden { verb: Verb::Delete });
    }

    let (pid, record) = resolve_live(&state, &pid_value).await?;

    state.backend().delete(record.id()).await?;
    state
        .backend()
        .mark_deleted(RECID_SCHEME, pid.pid_value())
        .await?;
    state.indexer().delete_by_id(record.id()).await?;

    debug!(pid = %pid_value, record_id = %record.id(), "record deleted");
    Ok(StatusCode::NO_CONTENT)
}
