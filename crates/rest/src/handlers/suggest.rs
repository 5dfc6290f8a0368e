//! Title completion handler.
//!
//! `GET /records/_suggest?text=...` completes record titles from the
//! indexed `suggest_title` field.

use axum::{
    Json,
    extract::{Query, State},
};
use docket_persistence::store::{PidStore, RecordStore, SearchIndex};
use serde::Deserialize;

use crate::config::Verb;
use crate::error::{ApiError, ApiResult};
use crate::responses::SuggestResponse;
use crate::state::AppState;

/// Query parameters accepted by the suggest endpoint.
#[derive(Debug, Deserialize)]
pub struct SuggestParams {
    /// The prefix to complete.
    pub text: String,
    /// Maximum number of completions; defaults to the configured suggester
    /// size.
    pub size: Option<usize>,
}

/// Handler for the suggest interaction.
pub async fn suggest_handler<S>(
    State(state): State<AppState<S>>,
    Query(params): Query<SuggestParams>,
) -> ApiResult<Json<SuggestResponse>>
where
    S: RecordStore + PidStore + SearchIndex + Send + Sync + 'static,
{
    if !state.policy().allows(Verb::Search) {
        return Err(ApiError::Forbidden { verb: Verb::Search });
    }

    let suggester = &state.search_config().suggester;
    let size = params.size.unwrap_or(suggester.size).min(suggester.size).max(1);

    let suggestions = state
        .backend()
        .suggest(state.indexer().index_name(), &params.text, size)
        .await?;

    Ok(Json(SuggestResponse {
        text: params.text,
        suggestions,
    }))
}
