//! Health check handler.

use axum::{Json, extract::State};
use docket_persistence::store::{PidStore, RecordStore, SearchIndex};
use serde::Serialize;

use crate::error::ApiResult;
use crate::state::AppState;

/// Body of a health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the handler answers.
    pub status: &'static str,
    /// The storage backend's name.
    pub backend: &'static str,
    /// Number of live records, proving the database answers queries.
    pub records: u64,
}

/// Handler for `GET /health`.
///
/// Answers `200 OK` with backend details when storage is reachable; a
/// storage failure surfaces as 500.
pub async fn health_handler<S>(
    State(state): State<AppState<S>>,
) -> ApiResult<Json<HealthResponse>>
where
    S: RecordStore + PidStore + SearchIndex + Send + Sync + 'static,
{
    let records = state.backend().count().await?;
    Ok(Json(HealthResponse {
        status: "ok",
        backend: state.backend().backend_name(),
        records,
    }))
}
