use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::WatcherError;
use crate::logging::ErrorLogger;
use crate::logging::LogContext;
use crate::webhook::{sample_notification, IngestOutcome, WebhookIngestor};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Server error: {0}")]
    Server(String),
}

/// Response to every `/webhook` call
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub message: String,
    pub timestamp: String,
    pub processed: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResponse {
    pub message: String,
    pub sample_data: Value,
    pub timestamp: String,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub ingestor: Arc<WebhookIngestor>,
}

/// Webhook receiver
pub struct WebhookServer {
    ingestor: Arc<WebhookIngestor>,
    pub host: String,
    pub port: u16,
}

impl WebhookServer {
    pub fn new(ingestor: Arc<WebhookIngestor>, host: &str, port: u16) -> Self {
        Self {
            ingestor,
            host: host.to_string(),
            port,
        }
    }

    /// Bind and serve until the process exits
    pub async fn start(&self) -> Result<(), ApiError> {
        let app = create_router(AppState {
            ingestor: self.ingestor.clone(),
        });

        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ApiError::Server(format!("Failed to bind to {}: {}", addr, e)))?;

        log_endpoints(&addr);

        axum::serve(listener, app)
            .await
            .map_err(|e| ApiError::Server(format!("Server error: {}", e)))?;

        Ok(())
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(receive_webhook))
        .route("/health", get(health))
        .route("/test", post(replay_sample))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
        )
        .with_state(state)
}

fn log_endpoints(addr: &str) {
    let context = LogContext::new("webhook_server", "start")
        .with_metadata("address", serde_json::json!(addr));
    context.info(&format!("Webhook server listening on {}", addr));
    context.info(&format!("  POST http://{}/webhook  address event notifications", addr));
    context.info(&format!("  GET  http://{}/health   health check", addr));
    context.info(&format!("  POST http://{}/test     replay the sample notification", addr));
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// POST /webhook - Receive an address event notification
///
/// The raw body is taken so that a body which is not JSON gets the same 500
/// as any other processing fault.
pub async fn receive_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<WebhookResponse>) {
    match state.ingestor.ingest_bytes(&body).await {
        Ok(IngestOutcome::Processed(_)) => (
            StatusCode::OK,
            Json(WebhookResponse {
                message: "Tatum notification received and logged".to_string(),
                timestamp: now(),
                processed: true,
            }),
        ),
        Ok(IngestOutcome::Unrecognized) => (
            StatusCode::OK,
            Json(WebhookResponse {
                message: "Webhook received but format not recognized".to_string(),
                timestamp: now(),
                processed: false,
            }),
        ),
        Err(e) => {
            ErrorLogger::log_error(
                &WatcherError::Webhook(e),
                Some(LogContext::new("webhook_server", "receive_webhook")),
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(WebhookResponse {
                    message: "Error processing webhook".to_string(),
                    timestamp: now(),
                    processed: false,
                }),
            )
        }
    }
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: now(),
    })
}

/// POST /test - Push the fixed sample notification through the normal ingestion path
pub async fn replay_sample(
    State(state): State<AppState>,
) -> Result<Json<TestResponse>, (StatusCode, Json<WebhookResponse>)> {
    let sample = sample_notification();

    match state.ingestor.ingest(sample).await {
        Ok(_) => Ok(Json(TestResponse {
            message: "Test webhook processed successfully".to_string(),
            sample_data: sample.clone(),
            timestamp: now(),
        })),
        Err(e) => {
            ErrorLogger::log_error(
                &WatcherError::Webhook(e),
                Some(LogContext::new("webhook_server", "replay_sample")),
            );
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(WebhookResponse {
                    message: "Error processing webhook".to_string(),
                    timestamp: now(),
                    processed: false,
                }),
            ))
        }
    }
}
