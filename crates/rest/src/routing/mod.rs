//! Route configuration.
//!
//! Defines all routes for the Docket REST API.

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use docket_persistence::store::{PidStore, RecordStore, SearchIndex};

use crate::handlers;
use crate::state::AppState;

/// Creates all Docket REST API routes.
///
/// # Routes
///
/// ## System-level
/// - `GET /health` - Health check
///
/// ## Collection-level
/// - `GET /records` - Search / list
/// - `POST /records` - Create (mints an identifier, indexes the record)
/// - `GET /records/_suggest` - Title completion
///
/// ## Record-level (addressed by external identifier)
/// - `GET /records/{pid}` - Read
/// - `PUT /records/{pid}` - Update
/// - `DELETE /records/{pid}` - Delete
pub fn create_routes<S>(state: AppState<S>) -> Router
where
    S: RecordStore + PidStore + SearchIndex + Send + Sync + 'static,
{
    Router::new()
        // System-level routes
        .route("/health", get(handlers::health_handler::<S>))
        // Collection-level routes
        .route("/records", get(handlers::search_handler::<S>))
        .route("/records", post(handlers::create_handler::<S>))
        .route("/records/_suggest", get(handlers::suggest_handler::<S>))
        // Record-level routes
        .route("/records/{pid_value}", get(handlers::read_handler::<S>))
        .route("/records/{pid_value}", put(handlers::update_handler::<S>))
        .route(
            "/records/{pid_value}",
            delete(handlers::delete_handler::<S>),
        )
        // State
        .with_state(state)
}
