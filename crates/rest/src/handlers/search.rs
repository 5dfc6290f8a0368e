//! Search interaction handler.
//!
//! `GET /records` with query parameters `q`, `type`, `sort`, `page` and
//! `size`. The response carries hits, the `type` terms aggregation and
//! pagination links.

use axum::{
    Json,
    extract::{Query, State},
};
use docket_persistence::store::{PidStore, RecordStore, SearchIndex};
use docket_persistence::types::{SearchQuery, SortDirective};
use serde::Deserialize;

use crate::config::Verb;
use crate::error::{ApiError, ApiResult};
use crate::responses::{
    Aggregations, PageLinks, SearchHitBody, SearchHitsBody, SearchResponse, TypeAggregation,
};
use crate::state::AppState;

/// Query parameters accepted by the search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Free-text query matched against indexed titles.
    pub q: Option<String>,
    /// Terms filter on the document type (comma-separated for several).
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
    /// Sort directive: `title`, `control_number`, or either with a leading
    /// `-` for descending order.
    pub sort: Option<String>,
    /// 1-based page number.
    pub page: Option<usize>,
    /// Page size, clamped to the configured maximum.
    pub size: Option<usize>,
}

/// Handler for the search interaction.
///
/// Requests without an explicit `sort` get the configured default: ascending
/// control number when a query string is present, descending otherwise.
pub async fn search_handler<S>(
    State(state): State<AppState<S>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<SearchResponse>>
where
    S: RecordStore + PidStore + SearchIndex + Send + Sync + 'static,
{
    if !state.policy().allows(Verb::Search) {
        return Err(ApiError::Forbidden { verb: Verb::Search });
    }

    let query = build_query(&state, &params)?;
    let page = state
        .backend()
        .search(state.indexer().index_name(), &query)
        .await?;

    let hits = SearchHitsBody {
        hits: page
            .hits
            .into_iter()
            .map(|hit| SearchHitBody {
                record_id: hit.record_id,
                metadata: hit.payload,
            })
            .collect(),
        total: page.total,
    };

    let links = page_links(&state, &params, &query, page.total);

    Ok(Json(SearchResponse {
        hits,
        aggregations: Aggregations {
            doc_type: TypeAggregation {
                buckets: page.type_buckets,
            },
        },
        links,
    }))
}

fn build_query<S>(state: &AppState<S>, params: &SearchParams) -> ApiResult<SearchQuery>
where
    S: RecordStore + PidStore + SearchIndex,
{
    let mut query = SearchQuery::new();

    if let Some(q) = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        query = query.with_q(q);
    }

    if let Some(types) = params.doc_type.as_deref() {
        for term in types.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            query = query.with_type_filter(term);
        }
    }

    let sort = match params.sort.as_deref() {
        Some(raw) => {
            let directive = SortDirective::parse(raw).map_err(|err| ApiError::BadRequest {
                message: err.to_string(),
            })?;
            if !state.search_config().is_sort_allowed(directive.field) {
                return Err(ApiError::BadRequest {
                    message: format!("sort option not configured: {}", directive.field.as_str()),
                });
            }
            directive
        }
        None if query.q.is_some() => state.search_config().default_sort_query,
        None => state.search_config().default_sort_noquery,
    };
    query = query.with_sort(sort);

    let size = params
        .size
        .unwrap_or(state.default_page_size())
        .min(state.max_page_size())
        .max(1);
    Ok(query.with_page(params.page.unwrap_or(1).max(1), size))
}

fn page_links<S>(
    state: &AppState<S>,
    params: &SearchParams,
    query: &SearchQuery,
    total: u64,
) -> PageLinks
where
    S: RecordStore + PidStore + SearchIndex,
{
    let page = query.effective_page();
    let size = query.effective_size(state.max_page_size());

    let url_for = |page: usize| {
        let mut url = format!(
            "{}/records?page={page}&size={size}",
            state.base_url().trim_end_matches('/')
        );
        if let Some(q) = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            url.push_str(&format!("&q={q}"));
        }
        if let Some(types) = params.doc_type.as_deref() {
            url.push_str(&format!("&type={types}"));
        }
        if let Some(sort) = params.sort.as_deref() {
            url.push_str(&format!("&sort={sort}"));
        }
        url
    };

    PageLinks {
        self_link: url_for(page),
        next: ((page.saturating_mul(size) as u64) < total).then(|| url_for(page + 1)),
        prev: (page > 1).then(|| url_for(page - 1)),
    }
}
