use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::{routing::get, Router};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::util::ServiceExt;

use doc_hub::api;
use doc_hub_core::events::EventBus;
use doc_hub_core::notify::{BroadcastTransport, ChangeNotifier};
use doc_hub_core::service::DocumentService;
use doc_hub_core::storage::{MemoryStore, UuidGenerator};

fn app() -> Router {
    let service = Arc::new(DocumentService::new(
        Arc::new(MemoryStore::new()),
        Arc::new(UuidGenerator),
        ChangeNotifier::new(Arc::new(BroadcastTransport::new())),
        EventBus::new(),
    ));
    Router::new()
        .merge(api::router(service))
        .route("/health", get(|| async { "OK" }))
}

fn request(method: &str, uri: &str, user: (&str, &str), body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-User-Id", user.0)
        .header("X-User-Email", user.1)
        .header("content-type", "application/json");
    match body {
        Some(json) => builder.body(Body::from(json.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

const ALICE: (&str, &str) = ("user-alice", "alice@x.com");
const BOB: (&str, &str) = ("user-bob", "bob@y.com");

#[tokio::test]
async fn server_health_endpoint() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(axum::serve(listener, app().into_make_service()).into_future());

    tokio::time::sleep(Duration::from_millis(100)).await;
    let resp = reqwest::get(format!("http://{}/health", addr)).await.unwrap();
    assert!(resp.status().is_success());
    assert_eq!(resp.text().await.unwrap(), "OK");

    server.abort();
}

#[tokio::test]
async fn create_defaults_to_untitled() {
    let app = app();
    let resp = app
        .oneshot(request("POST", "/docs", ALICE, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let doc = json_body(resp).await;
    assert_eq!(doc["title"], "Untitled");
    assert_eq!(doc["creator_email"], "alice@x.com");
}

#[tokio::test]
async fn missing_identity_headers_are_rejected() {
    let app = app();
    let req = Request::builder()
        .method("POST")
        .uri("/docs")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn share_flow_over_http() {
    let app = app();

    let resp = app
        .clone()
        .oneshot(request("POST", "/docs", ALICE, None))
        .await
        .unwrap();
    let doc = json_body(resp).await;
    let id = doc["id"].as_str().unwrap().to_string();

    // Bob cannot see the document yet.
    let resp = app
        .clone()
        .oneshot(request("GET", &format!("/docs/{id}"), BOB, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Alice shares it with Bob as viewer.
    let resp = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/docs/{id}/share"),
            ALICE,
            Some(serde_json::json!({"email": "bob@y.com", "level": "viewer"})),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let entry = json_body(resp).await;
    assert_eq!(entry["capabilities"], "ReadOnly");

    // Now Bob can read but not rename.
    let resp = app
        .clone()
        .oneshot(request("GET", &format!("/docs/{id}"), BOB, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/docs/{id}"),
            BOB,
            Some(serde_json::json!({"title": "Bob's now"})),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Both show up in the sharing list.
    let resp = app
        .clone()
        .oneshot(request("GET", &format!("/docs/{id}/sharing"), BOB, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let sharing = json_body(resp).await;
    assert_eq!(sharing.as_array().unwrap().len(), 2);

    // Removing Bob works; removing the creator is forbidden.
    let resp = app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/docs/{id}/share"),
            ALICE,
            Some(serde_json::json!({"email": "alice@x.com"})),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let resp = app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/docs/{id}/share"),
            ALICE,
            Some(serde_json::json!({"email": "bob@y.com"})),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = app
        .oneshot(request("GET", &format!("/docs/{id}"), BOB, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_level_maps_to_bad_request() {
    let app = app();
    let resp = app
        .clone()
        .oneshot(request("POST", "/docs", ALICE, None))
        .await
        .unwrap();
    let doc = json_body(resp).await;
    let id = doc["id"].as_str().unwrap();

    let resp = app
        .oneshot(request(
            "POST",
            &format!("/docs/{id}/share"),
            ALICE,
            Some(serde_json::json!({"email": "bob@y.com", "level": "superuser"})),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_reflects_shares() {
    let app = app();
    let resp = app
        .clone()
        .oneshot(request("POST", "/docs", ALICE, None))
        .await
        .unwrap();
    let doc = json_body(resp).await;
    let id = doc["id"].as_str().unwrap().to_string();

    let resp = app
        .clone()
        .oneshot(request("GET", "/docs", BOB, None))
        .await
        .unwrap();
    assert_eq!(json_body(resp).await.as_array().unwrap().len(), 0);

    let resp = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/docs/{id}/share"),
            ALICE,
            Some(serde_json::json!({"email": "bob@y.com", "level": "editor"})),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(request("GET", "/docs", BOB, None))
        .await
        .unwrap();
    let docs = json_body(resp).await;
    assert_eq!(docs.as_array().unwrap().len(), 1);
    assert_eq!(docs[0]["id"].as_str().unwrap(), id);
}

#[tokio::test]
async fn missing_document_is_not_found() {
    let app = app();
    let resp = app
        .oneshot(request(
            "GET",
            &format!("/docs/{}", uuid::Uuid::new_v4()),
            ALICE,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
