//! Tests for the HTTP surface
//!
//! These tests verify:
//! - Status codes and JSON bodies of the read and vote endpoints
//! - Busy (503) vs fault (500) vs unknown item (404)
//! - The server-sent event channel delivering `updateCars`
//! - CORS and server lifecycle

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use futures::StreamExt;
use tempfile::TempDir;
use tower::ServiceExt;
use votekv::catalog::Catalog;
use votekv::ledger::FileLock;
use votekv::network::{router, ErrorBody, Server, VoteResponse, UPDATE_EVENT, VOTE_MESSAGE, WELCOME};
use votekv::{
    ChangeNotifier, Config, Coordinator, LedgerStore, RetryPolicy, UnknownItemPolicy, VoteError,
};

const SAMPLE: &str = "id,votes,image_path\n1,3,a.png\n2,5,b.png";

// =============================================================================
// Helper Functions
// =============================================================================

struct TestApp {
    _temp: TempDir,
    config: Config,
    coordinator: Arc<Coordinator>,
    app: Router,
}

fn setup_app_with(policy: UnknownItemPolicy) -> TestApp {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("cars.csv");
    fs::write(&path, SAMPLE).unwrap();

    let config = Config::builder()
        .data_file(&path)
        .lock_retry(RetryPolicy::new(3, Duration::from_millis(10)))
        .unknown_item_policy(policy)
        .listen_addr("127.0.0.1:0")
        .build();
    let store = LedgerStore::open(&config).unwrap();
    let coordinator = Arc::new(Coordinator::new(
        store,
        ChangeNotifier::new(config.observer_capacity),
    ));
    let app = router(&config, Arc::clone(&coordinator)).unwrap();

    TestApp {
        _temp: temp,
        config,
        coordinator,
        app,
    }
}

fn setup_app() -> TestApp {
    setup_app_with(UnknownItemPolicy::Persist)
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::post(uri).body(Body::empty()).unwrap()
}

async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Read Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_root_welcome() {
    let test = setup_app();

    let response = send(&test.app, get("/")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], WELCOME.as_bytes());
}

#[tokio::test]
async fn test_list_returns_json_array() {
    let test = setup_app();

    let response = send(&test.app, get("/api/cars")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = json_body(response).await;
    assert_eq!(
        json,
        serde_json::json!([
            {"id": "1", "votes": 3, "imageRef": "a.png"},
            {"id": "2", "votes": 5, "imageRef": "b.png"},
        ])
    );
}

#[tokio::test]
async fn test_list_storage_failure_is_500() {
    let test = setup_app();
    fs::remove_file(&test.config.data_file).unwrap();

    let response = send(&test.app, get("/api/cars")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = json_body(response).await;
    assert_eq!(body.error, "Error reading car data");
    assert!(body.details.contains("cars.csv"));
}

// =============================================================================
// Vote Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_vote_returns_message_and_catalog() {
    let test = setup_app();

    let response = send(&test.app, post("/api/cars/1/vote")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: VoteResponse = json_body(response).await;
    assert_eq!(body.message, VOTE_MESSAGE);
    assert_eq!(body.cars.get("1").unwrap().votes, 4);
    assert_eq!(body.cars.get("2").unwrap().votes, 5);
}

#[tokio::test]
async fn test_vote_busy_is_503_with_retry_after() {
    let test = setup_app();
    let _foreign = FileLock::for_resource(&test.config.data_file, RetryPolicy::default())
        .try_acquire()
        .unwrap()
        .expect("lock already held");

    let response = send(&test.app, post("/api/cars/1/vote")).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    let body: ErrorBody = json_body(response).await;
    assert!(!body.error.is_empty());
    assert!(!body.details.is_empty());
    assert_eq!(fs::read_to_string(&test.config.data_file).unwrap(), SAMPLE);
}

#[tokio::test]
async fn test_vote_storage_failure_is_500() {
    let test = setup_app();
    fs::write(&test.config.data_file, "broken").unwrap();

    let response = send(&test.app, post("/api/cars/1/vote")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = json_body(response).await;
    assert_eq!(body.error, "Error updating car data");
}

#[tokio::test]
async fn test_vote_unknown_item_rejected_is_404() {
    let test = setup_app_with(UnknownItemPolicy::Reject);

    let response = send(&test.app, post("/api/cars/404/vote")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_vote_requires_post() {
    let test = setup_app();

    let response = send(&test.app, get("/api/cars/1/vote")).await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_concurrent_http_votes() {
    let test = setup_app_with(UnknownItemPolicy::Persist);
    // Replace the router with one whose ledger waits long enough for contention
    let config = Config::builder()
        .data_file(&test.config.data_file)
        .lock_retry(RetryPolicy::new(2000, Duration::from_millis(5)))
        .build();
    let coordinator = Arc::new(Coordinator::new(
        LedgerStore::open(&config).unwrap(),
        ChangeNotifier::default(),
    ));
    let app = router(&config, coordinator).unwrap();

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let app = app.clone();
        tasks.push(tokio::spawn(async move {
            app.oneshot(post("/api/cars/2/vote")).await.unwrap().status()
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }

    let catalog: Catalog = json_body(send(&app, get("/api/cars")).await).await;
    assert_eq!(catalog.get("2").unwrap().votes, 5 + 16);
}

// =============================================================================
// Event Channel Tests
// =============================================================================

#[tokio::test]
async fn test_events_deliver_vote_snapshot() {
    let test = setup_app();

    let events = send(&test.app, get("/api/events")).await;
    assert_eq!(events.status(), StatusCode::OK);
    assert_eq!(
        events.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );
    assert_eq!(test.coordinator.notifier().observer_count(), 1);

    let vote: VoteResponse = json_body(send(&test.app, post("/api/cars/1/vote")).await).await;

    let mut stream = events.into_body().into_data_stream();
    let mut frame = String::new();
    while !frame.contains("\n\n") {
        let chunk = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("no event within timeout")
            .expect("event stream ended")
            .unwrap();
        frame.push_str(std::str::from_utf8(&chunk).unwrap());
    }

    assert!(frame.contains(&format!("event: {}", UPDATE_EVENT)), "{}", frame);
    let data = frame
        .lines()
        .find_map(|line| line.strip_prefix("data: "))
        .expect("data line");
    let broadcast: Catalog = serde_json::from_str(data).unwrap();
    assert_eq!(broadcast, vote.cars);

    drop(stream);
    assert_eq!(test.coordinator.notifier().observer_count(), 0);
}

// =============================================================================
// CORS and Lifecycle Tests
// =============================================================================

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let test = setup_app();
    let request = Request::get("/api/cars")
        .header(header::ORIGIN, "http://localhost:4200")
        .body(Body::empty())
        .unwrap();

    let response = send(&test.app, request).await;

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:4200"
    );
}

#[test]
fn test_invalid_cors_origin_is_config_error() {
    let test = setup_app();
    let config = Config::builder()
        .data_file(&test.config.data_file)
        .cors_origin("bad\norigin")
        .build();

    let result = router(&config, Arc::clone(&test.coordinator));

    assert!(matches!(result, Err(VoteError::Config(_))));
}

#[tokio::test]
async fn test_server_stops_on_shutdown() {
    let test = setup_app();
    let server = Server::new(test.config.clone(), Arc::clone(&test.coordinator));

    let result = tokio::time::timeout(Duration::from_secs(5), server.run_until(async {})).await;

    assert!(result.expect("server did not stop").is_ok());
}

#[tokio::test]
async fn test_server_bind_failure_is_network_error() {
    let test = setup_app();
    let config = Config::builder()
        .data_file(&test.config.data_file)
        .listen_addr("not-an-address")
        .build();
    let server = Server::new(config, Arc::clone(&test.coordinator));

    let result = server.run_until(async {}).await;

    assert!(matches!(result, Err(VoteError::Network(_))));
}
