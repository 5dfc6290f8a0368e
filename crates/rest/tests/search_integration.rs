//! Integration tests for search over HTTP, covering:
//! - Terms filtering on the document type
//! - Default sort (query vs. no-query) and explicit sort directives
//! - The `type` terms aggregation
//! - Pagination (`page`, `size`) and result links
//! - Title completion

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use docket_persistence::backends::sqlite::SqliteBackend;
use docket_rest::{AppState, ServerConfig};
use serde_json::{Value, json};

/// Creates a test server seeded with the two example records ("1" is the
/// meeting report, "2" the furniture order).
async fn seeded_server() -> TestServer {
    let backend = Arc::new(SqliteBackend::in_memory().expect("backend"));
    backend.init_schema().expect("schema");

    let state = AppState::new(backend, ServerConfig::for_testing());
    let app = docket_rest::routing::create_routes(state);
    let server = TestServer::new(app).expect("test server");

    server
        .post("/records")
        .json(&json!({
            "title": "Awesome meeting report",
            "description": "Notes of the last meeting.",
            "participants": 42,
            "type": "report",
        }))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/records")
        .json(&json!({
            "title": "Furniture order",
            "description": "Tables for the meeting room.",
            "type": "order",
        }))
        .await
        .assert_status(StatusCode::CREATED);

    server
}

fn hit_titles(body: &Value) -> Vec<String> {
    body["hits"]["hits"]
        .as_array()
        .unwrap()
        .iter()
        .map(|hit| hit["metadata"]["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn type_filter_returns_matching_record_only() {
    let server = seeded_server().await;

    let response = server.get("/records").add_query_param("type", "report").await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["hits"]["total"], 1);
    assert_eq!(hit_titles(&body), vec!["Awesome meeting report"]);

    let response = server.get("/records").add_query_param("type", "order").await;
    let body: Value = response.json();
    assert_eq!(body["hits"]["total"], 1);
    assert_eq!(hit_titles(&body), vec!["Furniture order"]);
}

#[tokio::test]
async fn listing_without_query_sorts_by_descending_control_number() {
    let server = seeded_server().await;

    let body: Value = server.get("/records").await.json();

    assert_eq!(body["hits"]["total"], 2);
    assert_eq!(
        hit_titles(&body),
        vec!["Furniture order", "Awesome meeting report"]
    );
}

#[tokio::test]
async fn querying_sorts_by_ascending_control_number() {
    let server = seeded_server().await;

    // "e" appears in both titles, so the query matches both records.
    let body: Value = server.get("/records").add_query_param("q", "e").await.json();

    assert_eq!(body["hits"]["total"], 2);
    assert_eq!(
        hit_titles(&body),
        vec!["Awesome meeting report", "Furniture order"]
    );
}

#[tokio::test]
async fn explicit_sort_directives_are_honored() {
    let server = seeded_server().await;

    let ascending: Value = server
        .get("/records")
        .add_query_param("sort", "control_number")
        .await
        .json();
    assert_eq!(
        hit_titles(&ascending),
        vec!["Awesome meeting report", "Furniture order"]
    );

    let by_title: Value = server
        .get("/records")
        .add_query_param("sort", "-title")
        .await
        .json();
    assert_eq!(
        hit_titles(&by_title),
        vec!["Furniture order", "Awesome meeting report"]
    );
}

#[tokio::test]
async fn unknown_sort_field_is_400() {
    let server = seeded_server().await;

    server
        .get("/records")
        .add_query_param("sort", "participants")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn type_aggregation_counts_buckets() {
    let server = seeded_server().await;

    let body: Value = server.get("/records").await.json();
    let buckets = body["aggregations"]["type"]["buckets"].as_array().unwrap();

    assert_eq!(buckets.len(), 2);
    for bucket in buckets {
        assert_eq!(bucket["count"], 1);
    }
    let values: Vec<&str> = buckets
        .iter()
        .map(|b| b["value"].as_str().unwrap())
        .collect();
    assert!(values.contains(&"report"));
    assert!(values.contains(&"order"));
}

#[tokio::test]
async fn aggregation_reflects_type_filter() {
    let server = seeded_server().await;

    let body: Value = server
        .get("/records")
        .add_query_param("type", "report")
        .await
        .json();
    let buckets = body["aggregations"]["type"]["buckets"].as_array().unwrap();

    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0]["value"], "report");
}

#[tokio::test]
async fn pagination_slices_and_links() {
    let server = seeded_server().await;

    let body: Value = server
        .get("/records")
        .add_query_param("sort", "control_number")
        .add_query_param("size", "1")
        .add_query_param("page", "1")
        .await
        .json();

    assert_eq!(body["hits"]["total"], 2);
    assert_eq!(hit_titles(&body), vec!["Awesome meeting report"]);
    assert!(body["links"]["next"].as_str().unwrap().contains("page=2"));
    assert!(body["links"].get("prev").is_none());

    let second: Value = server
        .get("/records")
        .add_query_param("sort", "control_number")
        .add_query_param("size", "1")
        .add_query_param("page", "2")
        .await
        .json();

    assert_eq!(hit_titles(&second), vec!["Furniture order"]);
    assert!(second["links"].get("next").is_none());
    assert!(second["links"]["prev"].as_str().unwrap().contains("page=1"));
}

#[tokio::test]
async fn free_text_query_matches_titles_case_insensitively() {
    let server = seeded_server().await;

    let body: Value = server
        .get("/records")
        .add_query_param("q", "FURNITURE")
        .await
        .json();

    assert_eq!(body["hits"]["total"], 1);
    assert_eq!(hit_titles(&body), vec!["Furniture order"]);
}

#[tokio::test]
async fn updating_a_record_refreshes_search_results() {
    let server = seeded_server().await;

    server
        .put("/records/1")
        .json(&json!({"title": "Quarterly meeting report", "type": "report"}))
        .await
        .assert_status(StatusCode::OK);

    let body: Value = server
        .get("/records")
        .add_query_param("type", "report")
        .await
        .json();
    assert_eq!(hit_titles(&body), vec!["Quarterly meeting report"]);
}

#[tokio::test]
async fn suggest_completes_title_prefixes() {
    let server = seeded_server().await;

    let response = server
        .get("/records/_suggest")
        .add_query_param("text", "awe")
        .await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["text"], "awe");
    assert_eq!(
        body["suggestions"],
        json!(["Awesome meeting report"])
    );
}

#[tokio::test]
async fn suggest_with_no_matches_is_empty() {
    let server = seeded_server().await;

    let body: Value = server
        .get("/records/_suggest")
        .add_query_param("text", "zzz")
        .await
        .json();
    assert_eq!(body["suggestions"].as_array().unwrap().len(), 0);
}
