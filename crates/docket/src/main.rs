//! Docket server.
//!
//! Builds the whole application in dependency order: configuration, the
//! instance directory, the SQLite backend and its schema, the indexer and
//! REST router, and finally the listening socket. With `--seed-demo` the
//! two example records are loaded before serving.

mod demo;

use std::sync::Arc;

use clap::Parser;
use docket_persistence::backends::sqlite::SqliteBackend;
use docket_persistence::index::RecordIndexer;
use docket_rest::{ServerConfig, create_app, init_logging};
use tracing::info;

/// Creates and initializes the SQLite backend from the server configuration.
fn create_backend(config: &ServerConfig) -> anyhow::Result<SqliteBackend> {
    let database_url = config.resolved_database_url();
    info!(database = %database_url, "Initializing SQLite backend");

    let backend = SqliteBackend::open(&database_url)?;
    backend.init_schema()?;

    Ok(backend)
}

/// Starts the Axum HTTP server.
async fn serve(app: axum::Router, config: &ServerConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr();
    info!(address = %addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    info!(
        port = config.port,
        host = %config.host,
        index = %config.index_name,
        "Starting Docket server"
    );

    // Instance-local state directory; failure here is fatal.
    std::fs::create_dir_all(&config.instance_dir).map_err(|e| {
        anyhow::anyhow!(
            "cannot create instance directory {}: {e}",
            config.instance_dir.display()
        )
    })?;

    let backend = Arc::new(create_backend(&config)?);

    if config.seed_demo {
        let indexer = RecordIndexer::new(Arc::clone(&backend), config.index_name.clone());
        demo::seed_demo(&backend, &indexer).await?;
    }

    let app = create_app(backend, config.clone());
    serve(app, &config).await
}
