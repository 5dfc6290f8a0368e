//! Update interaction handler.
//!
//! `PUT /records/{pid}` replaces the record payload, bumps the revision and
//! refreshes the index document.

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use docket_persistence::store::{PidStore, RecordStore, SearchIndex};
use serde_json::Value;
use tracing::debug;

use crate::config::Verb;
use crate::error::{ApiError, ApiResult};
use crate::responses::RecordEnvelope;
use crate::state::AppState;

use super::resolve_live;

/// Optional optimistic-locking header carrying the revision the caller
/// last saw.
const IF_REVISION_MATCH: &str = "if-revision-match";

/// Handler for the update interaction.
///
/// # Headers
///
/// - `If-Revision-Match` - optional; the update is rejected with 409 when
///   the stored revision differs
///
/// # Response
///
/// - `200 OK` with the updated record envelope
/// - `400 Bad Request` - body is not a JSON object, or the header is not a
///   number
/// - `404 Not Found` / `410 Gone` - identifier resolution failed
/// - `409 Conflict` - revision mismatch
pub async fn update_handler<S>(
    State(state): State<AppState<S>>,
    Path(pid_value): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> ApiResult<Json<RecordEnvelope>>
where
    S: RecordStore + PidStore + SearchIndex + Send + Sync + 'static,
{
    if !state.policy().allows(Verb::Update) {
        return Err(ApiError::Forbidden { verb: Verb::Update });
    }

    if !payload.is_object() {
        return Err(ApiError::BadRequest {
            message: "record payload must be a JSON object".to_string(),
        });
    }

    let (pid, record) = resolve_live(&state, &pid_value).await?;

    if let Some(expected) = expected_revision(&headers)? {
        if expected != record.revision() {
            return Err(ApiError::RevisionConflict {
                message: format!(
                    "record {pid_value}: expected revision {expected}, found {}",
                    record.revision()
                ),
            });
        }
    }

    let updated = state.backend().update(&record, payload).await?;
    state.indexer().index_by_id(updated.id()).await?;

    debug!(pid = %pid_value, revision = updated.revision(), "record updated");
    Ok(Json(RecordEnvelope::new(&pid, &updated, state.base_url())))
}

fn expected_revision(headers: &HeaderMap) -> ApiResult<Option<u64>> {
    let Some(raw) = headers.get(IF_REVISION_MATCH) else {
        return Ok(None);
    };

    raw.to_str()
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Some)
        .ok_or_else(|| ApiError::BadRequest {
            message: "If-Revision-Match must be a revision number".to_string(),
        })
}
