//! Integration tests for record CRUD over HTTP.
//!
//! Tests the handlers against the SQLite backend through a real axum
//! router, covering identifier minting on create, pid-addressed reads,
//! optimistic updates and delete semantics.

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use docket_persistence::backends::sqlite::SqliteBackend;
use docket_rest::{AppState, PermissionCheck, ServerConfig};
use serde_json::{Value, json};

const IF_REVISION_MATCH: HeaderName = HeaderName::from_static("if-revision-match");

fn create_test_server() -> TestServer {
    create_test_server_with(ServerConfig::for_testing())
}

fn create_test_server_with(config: ServerConfig) -> TestServer {
    let backend = Arc::new(SqliteBackend::in_memory().expect("backend"));
    backend.init_schema().expect("schema");

    let state = AppState::new(backend, config);
    let app = docket_rest::routing::create_routes(state);
    TestServer::new(app).expect("test server")
}

fn sample_report() -> Value {
    json!({
        "title": "Awesome meeting report",
        "description": "Notes of the last meeting.",
        "participants": 42,
        "type": "report",
    })
}

#[tokio::test]
async fn create_mints_sequential_identifiers() {
    let server = create_test_server();

    let first = server.post("/records").json(&sample_report()).await;
    first.assert_status(StatusCode::CREATED);

    let body: Value = first.json();
    assert_eq!(body["id"], "1");
    assert_eq!(body["revision"], 1);
    assert_eq!(body["metadata"]["title"], "Awesome meeting report");
    assert!(
        first
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|location| location.ends_with("/records/1"))
    );

    let second = server
        .post("/records")
        .json(&json!({"title": "Furniture order", "type": "order"}))
        .await;
    second.assert_status(StatusCode::CREATED);
    assert_eq!(second.json::<Value>()["id"], "2");
}

#[tokio::test]
async fn create_rejects_non_object_payloads() {
    let server = create_test_server();

    let response = server.post("/records").json(&json!([1, 2, 3])).await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn read_resolves_by_external_identifier() {
    let server = create_test_server();
    server.post("/records").json(&sample_report()).await;

    let response = server.get("/records/1").await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["id"], "1");
    assert_eq!(body["metadata"]["participants"], 42);
    assert_eq!(body["links"]["self"], "http://localhost:0/records/1");
}

#[tokio::test]
async fn read_unknown_identifier_is_404() {
    let server = create_test_server();

    let response = server.get("/records/99").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_bumps_revision() {
    let server = create_test_server();
    server.post("/records").json(&sample_report()).await;

    let response = server
        .put("/records/1")
        .json(&json!({"title": "Amended meeting report", "type": "report"}))
        .await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["revision"], 2);
    assert_eq!(body["metadata"]["title"], "Amended meeting report");
}

#[tokio::test]
async fn update_with_stale_revision_is_409() {
    let server = create_test_server();
    server.post("/records").json(&sample_report()).await;

    // Bump to revision 2.
    server
        .put("/records/1")
        .json(&json!({"title": "v2", "type": "report"}))
        .await
        .assert_status(StatusCode::OK);

    let stale = server
        .put("/records/1")
        .add_header(IF_REVISION_MATCH, HeaderValue::from_static("1"))
        .json(&json!({"title": "v3", "type": "report"}))
        .await;
    stale.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn update_with_matching_revision_succeeds() {
    let server = create_test_server();
    server.post("/records").json(&sample_report()).await;

    let response = server
        .put("/records/1")
        .add_header(IF_REVISION_MATCH, HeaderValue::from_static("1"))
        .json(&json!({"title": "v2", "type": "report"}))
        .await;
    response.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn update_with_malformed_revision_header_is_400() {
    let server = create_test_server();
    server.post("/records").json(&sample_report()).await;

    let response = server
        .put("/records/1")
        .add_header(IF_REVISION_MATCH, HeaderValue::from_static("latest"))
        .json(&json!({"title": "v2"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_makes_record_gone() {
    let server = create_test_server();
    server.post("/records").json(&sample_report()).await;

    server
        .delete("/records/1")
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .get("/records/1")
        .await
        .assert_status(StatusCode::GONE);
    server
        .delete("/records/1")
        .await
        .assert_status(StatusCode::GONE);
}

#[tokio::test]
async fn deleted_records_leave_the_index() {
    let server = create_test_server();
    server.post("/records").json(&sample_report()).await;
    server.delete("/records/1").await;

    let response = server.get("/records").await;
    let body: Value = response.json();
    assert_eq!(body["hits"]["total"], 0);
}

#[tokio::test]
async fn permission_policy_denies_verbs() {
    let config = ServerConfig {
        permission_delete: PermissionCheck::Deny,
        ..ServerConfig::for_testing()
    };
    let server = create_test_server_with(config);
    server.post("/records").json(&sample_report()).await;

    let response = server.delete("/records/1").await;
    response.assert_status(StatusCode::FORBIDDEN);

    // Other verbs stay open.
    server.get("/records/1").await.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn health_reports_backend_and_count() {
    let server = create_test_server();
    server.post("/records").json(&sample_report()).await;

    let response = server.get("/health").await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"], "sqlite");
    assert_eq!(body["records"], 1);
}
