//! # docket-rest - Docket REST API Implementation
//!
//! This crate exposes the Docket record registry over HTTP: CRUD on records
//! addressed by their external persistent identifiers, faceted search with
//! configurable sort options, title completion, and a health endpoint.
//!
//! ## API Endpoints
//!
//! | Interaction | HTTP Method | URL Pattern |
//! |------------|-------------|-------------|
//! | search | GET | `/records?q=&type=&sort=&page=&size=` |
//! | create | POST | `/records` |
//! | suggest | GET | `/records/_suggest?text=` |
//! | read | GET | `/records/{pid}` |
//! | update | PUT | `/records/{pid}` |
//! | delete | DELETE | `/records/{pid}` |
//! | health | GET | `/health` |
//!
//! Records are addressed by the external `recid` value minted at creation
//! time ("1", "2", ...), never by their internal UUID.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use docket_persistence::backends::sqlite::SqliteBackend;
//! use docket_rest::{ServerConfig, create_app};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = Arc::new(SqliteBackend::open("docket.db")?);
//!     backend.init_schema()?;
//!
//!     let config = ServerConfig::default();
//!     let app = create_app(backend, config.clone());
//!
//!     let listener = tokio::net::TcpListener::bind(config.socket_addr()).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All errors render as a JSON problem body `{"status", "message"}` with
//! the appropriate HTTP status code:
//!
//! | HTTP Status | Meaning |
//! |-------------|---------|
//! | 400 | Bad request / validation error |
//! | 403 | Permission policy denies the verb |
//! | 404 | Unknown identifier |
//! | 409 | Revision or uniqueness conflict |
//! | 410 | Identifier or record deleted |
//! | 500 | Storage failure |
//!
//! ## Architecture
//!
//! - [`config`] - Server and search-surface configuration
//! - [`state`] - Application state (backend, indexer, configuration)
//! - [`error`] - Error types and JSON problem responses
//! - [`handlers`] - HTTP request handlers for each interaction
//! - [`responses`] - Response body shapes
//! - [`routing`] - Route configuration

// Enforce documentation
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod responses;
pub mod routing;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use docket_persistence::store::{PidStore, RecordStore, SearchIndex};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use config::{PermissionCheck, PermissionPolicy, SearchConfig, ServerConfig, Verb};
pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Builds the application router over a storage backend.
///
/// Attaches the ambient middleware stack: request tracing, body size limit,
/// request timeout and (when enabled) CORS.
pub fn create_app<S>(backend: Arc<S>, config: ServerConfig) -> Router
where
    S: RecordStore + PidStore + SearchIndex + Send + Sync + 'static,
{
    let enable_cors = config.enable_cors;
    let cors = enable_cors.then(|| cors_layer(&config));
    let max_body_size = config.max_body_size;
    let request_timeout = config.request_timeout;

    let state = AppState::new(backend, config);
    let mut app = routing::create_routes(state)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(request_timeout)));

    if let Some(cors) = cors {
        app = app.layer(cors);
    }

    app
}

/// Builds the CORS layer from the configured origins.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.cors_origins.trim() == "*" {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .split(',')
            .filter_map(|origin| origin.trim().parse().ok())
            .collect();
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

/// Initializes the global tracing subscriber from a log level string.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
