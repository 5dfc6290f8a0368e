//! Create interaction handler.
//!
//! `POST /records` stores the payload, mints the next sequential `recid`
//! identifier as REGISTERED, and indexes the new record.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use docket_persistence::error::{PidError, StorageError};
use docket_persistence::store::{PidStore, RecordStore, SearchIndex};
use docket_persistence::types::{PersistentIdentifier, PidStatus, StoredRecord};
use serde_json::Value;
use tracing::debug;

use crate::config::Verb;
use crate::error::{ApiError, ApiResult};
use crate::responses::{RecordEnvelope, record_url};
use crate::state::AppState;

use super::{RECID_SCHEME, RECORD_OBJECT_TYPE};

/// How often a create retries identifier minting after losing the race for
/// the next sequential value.
const MINT_ATTEMPTS: usize = 3;

/// Handler for the create interaction.
///
/// # HTTP Request
///
/// `POST /records` with a JSON object body.
///
/// # Response
///
/// - `201 Created` with a `Location` header and the record envelope
/// - `400 Bad Request` - body is not a JSON object
/// - `403 Forbidden` - the permission policy denies creation
pub async fn create_handler<S>(
    State(state): State<AppState<S>>,
    Json(payload): Json<Value>,
) -> ApiResult<Response>
where
    S: RecordStore + PidStore + SearchIndex + Send + Sync + 'static,
{
    if !state.policy().allows(Verb::Create) {
        return Err(ApiError::Forbidden { verb: Verb::Create });
    }

    if !payload.is_object() {
        return Err(ApiError::BadRequest {
            message: "record payload must be a JSON object".to_string(),
        });
    }

    let record = state.backend().create(payload, None).await?;
    let pid = mint_next_recid(&state, &record).await?;
    state.indexer().index_by_id(record.id()).await?;

    debug!(pid = pid.pid_value(), record_id = %record.id(), "record created");

    let location = record_url(state.base_url(), pid.pid_value());
    let envelope = RecordEnvelope::new(&pid, &record, state.base_url());

    let mut response = (StatusCode::CREATED, Json(envelope)).into_response();
    response.headers_mut().insert(
        header::LOCATION,
        location.parse().map_err(|_| ApiError::Internal {
            message: "failed to build Location header".to_string(),
        })?,
    );
    Ok(response)
}

/// Mints the next free sequential `recid` for a record.
///
/// Concurrent creates can race for the same value; losing the race surfaces
/// as an `AlreadyExists` conflict, which is retried with a fresh value.
async fn mint_next_recid<S>(
    state: &AppState<S>,
    record: &StoredRecord,
) -> ApiResult<PersistentIdentifier>
where
    S: RecordStore + PidStore + SearchIndex,
{
    let mut last_conflict = None;

    for _ in 0..MINT_ATTEMPTS {
        let pid_value = state.backend().next_pid_value(RECID_SCHEME).await?;
        match state
            .backend()
            .mint(
                RECID_SCHEME,
                &pid_value,
                RECORD_OBJECT_TYPE,
                record.id(),
                PidStatus::Registered,
            )
            .await
        {
            Ok(pid) => return Ok(pid),
            Err(StorageError::Pid(err @ PidError::AlreadyExists { .. })) => {
                last_conflict = Some(err);
            }
            Err(other) => return Err(other.into()),
        }
    }

    Err(ApiError::Conflict {
        message: last_conflict
            .map(|err| err.to_string())
            .unwrap_or_else(|| "identifier minting failed".to_string()),
    })
}
