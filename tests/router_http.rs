//! HTTP-level tests for the sync server: request validation, error status
//! mapping, request ids, and a full migration through `POST /db/sync`.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{mount_empty_lists, mount_list, sync_for};
use db_config_sync::apply::ApplyStrategy;
use db_config_sync::model::Category;
use db_config_sync::server::build_router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(
        |_| json!({ "raw": String::from_utf8_lossy(&bytes).to_string() }),
    )
}

fn sync_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/db/sync")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

async fn app_with_empty_gateway() -> (axum::Router, MockServer) {
    let server = MockServer::start().await;
    mount_empty_lists(&server, &[]).await;
    let app = build_router(sync_for(&server, ApplyStrategy::Batch));
    (app, server)
}

// ── Tests ───────────────────────────────────────────────────────

#[tokio::test]
async fn health_is_ok() {
    let (app, _server) = app_with_empty_gateway().await;
    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn missing_project_id_is_bad_request() {
    let (app, server) = app_with_empty_gateway().await;
    let resp = app
        .oneshot(sync_request(
            json!({"from": "mongo1", "to": {"dbAlias": "mongo2"}}).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert!(
        body["error"].as_str().unwrap_or("").contains("project id"),
        "unexpected body: {body}"
    );
    // validation happens before any gateway traffic
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn target_without_alias_is_bad_request() {
    let (app, _server) = app_with_empty_gateway().await;
    let resp = app
        .oneshot(sync_request(
            json!({"projectId": "p1", "from": "mongo1", "to": {"conn": "x"}}).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let (app, _server) = app_with_empty_gateway().await;
    let resp = app.oneshot(sync_request("{not json")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(resp).await["error"].is_string());
}

#[tokio::test]
async fn successful_sync_returns_report() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        Category::DbConfig,
        vec![json!({"dbAlias": "mongo1", "name": "shop", "conn": "mongodb://a"})],
    )
    .await;
    mount_empty_lists(&server, &[Category::DbConfig]).await;
    Mock::given(method("POST"))
        .and(path("/v1/config/projects/p1/database/mongo2/config/mongo2-config"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let app = build_router(sync_for(&server, ApplyStrategy::PerObject));
    let resp = app
        .oneshot(sync_request(
            json!({
                "projectId": "p1",
                "from": "mongo1",
                "to": {"dbAlias": "mongo2", "conn": "mongodb://b"}
            })
            .to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let report = &body["result"][0];
    assert_eq!(report["from"], json!("mongo1"));
    assert_eq!(report["to"], json!("mongo2"));
    assert_eq!(report["applied"], json!(1));
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn gateway_failure_status_is_propagated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "project p1 not found"})))
        .mount(&server)
        .await;

    let app = build_router(sync_for(&server, ApplyStrategy::Batch));
    let resp = app
        .oneshot(sync_request(
            json!({"projectId": "p1", "from": "mongo1", "to": {"dbAlias": "mongo2"}}).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(resp).await,
        json!({"error": "project p1 not found"})
    );
}

#[tokio::test]
async fn request_id_is_echoed_or_generated() {
    let (app, _server) = app_with_empty_gateway().await;

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-request-id"], "req-123");

    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let generated = resp.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());
}
