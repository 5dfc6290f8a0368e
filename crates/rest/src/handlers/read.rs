//! Read interaction handler.
//!
//! `GET /records/{pid}` resolves the external identifier and returns the
//! record it points at.

use axum::{
    Json,
    extract::{Path, State},
};
use docket_persistence::store::{PidStore, RecordStore, SearchIndex};

use crate::config::Verb;
use crate::error::{ApiError, ApiResult};
use crate::responses::RecordEnvelope;
use crate::state::AppState;

use super::resolve_live;

/// Handler for the read interaction.
///
/// # Response
///
/// - `200 OK` with the record envelope
/// - `404 Not Found` - no identifier with that value
/// - `410 Gone` - the identifier or its record was deleted
pub async fn read_handler<S>(
    State(state): State<AppState<S>>,
    Path(pid_value): Path<String>,
) -> ApiResult<Json<RecordEnvelope>>
where
    S: RecordStore + PidStore + SearchIndex + Send + Sync + 'static,
{
    if !state.policy().allows(Verb::Read) {
        return Err(ApiError::Forbidden { verb: Verb::Read });
    }

    let (pid, record) = resolve_live(&state, &pid_value).await?;
    Ok(Json(RecordEnvelope::new(&pid, &record, state.base_url())))
}
