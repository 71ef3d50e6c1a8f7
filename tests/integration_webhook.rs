use address_watch::api::{create_router, AppState};
use address_watch::config::AppConfig;
use address_watch::models::{Direction, Report, WebhookReport};
use address_watch::sink::MemorySink;
use address_watch::webhook::{sample_notification, WebhookIngestor};
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

/// Router wired to the default token catalog and an in-memory sink
fn setup_router() -> (Router, Arc<MemorySink>) {
    let config = AppConfig::default();
    let sink = Arc::new(MemorySink::new());
    let ingestor = WebhookIngestor::new(
        Arc::new(config.token_catalog()),
        config.explorer.clone(),
        sink.clone(),
    );
    let router = create_router(AppState {
        ingestor: Arc::new(ingestor),
    });
    (router, sink)
}

fn post_json(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_recognized_notification_is_processed() {
    let (app, sink) = setup_router();

    let response = app
        .oneshot(post_json("/webhook", sample_notification().to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["message"], "Tatum notification received and logged");
    assert_eq!(body["processed"], true);
    assert!(body["timestamp"].is_string());

    let reports = sink.reports();
    assert_eq!(reports.len(), 1);
    match &reports[0] {
        Report::Webhook(WebhookReport::Processed(record)) => {
            assert_eq!(record.direction, Direction::Incoming);
            assert!(record.explorer_url.starts_with("https://sepolia.etherscan.io/tx/0x062d236c"));
        }
        other => panic!("unexpected report: {:?}", other),
    }
}

#[tokio::test]
async fn test_negative_amount_is_outgoing() {
    let (app, sink) = setup_router();
    let mut payload = sample_notification().clone();
    payload["amount"] = json!("-0.5");
    payload["chain"] = json!("ethereum-mainnet");

    let response = app.oneshot(post_json("/webhook", payload.to_string())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    match sink.reports().as_slice() {
        [Report::Webhook(WebhookReport::Processed(record))] => {
            assert_eq!(record.direction, Direction::Outgoing);
            assert!(record.explorer_url.starts_with("https://etherscan.io/tx/"));
        }
        other => panic!("unexpected reports: {:?}", other),
    }
}

#[tokio::test]
async fn test_unrecognized_payload_is_acknowledged() {
    let (app, sink) = setup_router();
    let payload = json!({ "subscriptionType": "INCOMING_FUNGIBLE_TX", "txId": "0xabc" });

    let response = app.oneshot(post_json("/webhook", payload.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["message"], "Webhook received but format not recognized");
    assert_eq!(body["processed"], false);

    assert!(matches!(
        sink.reports().as_slice(),
        [Report::Webhook(WebhookReport::Unrecognized { .. })]
    ));
}

#[tokio::test]
async fn test_notification_missing_tx_id_is_unrecognized() {
    let (app, _sink) = setup_router();
    let mut payload = sample_notification().clone();
    payload.as_object_mut().unwrap().remove("txId");

    let response = app.oneshot(post_json("/webhook", payload.to_string())).await.unwrap();
    let body = read_json(response).await;
    assert_eq!(body["processed"], false);
}

#[tokio::test]
async fn test_invalid_json_is_a_server_error() {
    let (app, sink) = setup_router();

    let response = app
        .oneshot(post_json("/webhook", "{\"address\": ".to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(response).await;
    assert_eq!(body["message"], "Error processing webhook");
    assert_eq!(body["processed"], false);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _sink) = setup_router();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "OK");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_replay_endpoint_uses_sample() {
    let (app, sink) = setup_router();

    let response = app
        .oneshot(Request::builder().method("POST").uri("/test").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["message"], "Test webhook processed successfully");
    assert_eq!(&body["sampleData"], sample_notification());
    assert_eq!(sink.len(), 1);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (app, _sink) = setup_router();

    let response = app
        .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let (app, _sink) = setup_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "https://dashboard.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}
