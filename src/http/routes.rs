use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::analysis::Segment;
use crate::error::{BatchError, ErrorCode};
use crate::orchestrator::DetectionOrchestrator;
use crate::sink::BroadcastSink;
use crate::telemetry::TelemetrySnapshot;

use super::sse;

/// Shared application state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<DetectionOrchestrator>,
    pub stream: Arc<BroadcastSink>,
    started: Instant,
}

impl AppState {
    /// `stream` must be the sink the orchestrator emits into.
    pub fn new(orchestrator: Arc<DetectionOrchestrator>, stream: Arc<BroadcastSink>) -> Self {
        Self {
            orchestrator,
            stream,
            started: Instant::now(),
        }
    }

    fn uptime_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// Batch submission body: one `[[time, velocity], ...]` matrix per channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectRequest {
    pub matrices: Vec<Segment>,
}

/// Acknowledgement returned once a batch is accepted.
#[derive(Debug, Serialize, Deserialize)]
pub struct DetectAck {
    pub message: String,
}

/// HTTP error variants mapped to JSON responses.
#[derive(Debug)]
pub enum HttpServerError {
    /// Body is not valid JSON or does not match the request shape
    MalformedBody(String),
    /// Batch failed validation against the detector pool
    InvalidBatch(BatchError),
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let body = match self {
            Self::MalformedBody(msg) => serde_json::json!({ "error": msg }),
            Self::InvalidBatch(err) => serde_json::json!({
                "error": { "code": err.code(), "message": err.message() }
            }),
        };

        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

/// Health endpoint response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub channels: usize,
    pub uptime_ms: u64,
}

/// Metrics endpoint response payload.
#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub stream_subscribers: usize,
    pub diagnostics: TelemetrySnapshot,
}

/// Build the Axum router with all handlers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/api/detector/detect_seism", post(detect_seism))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/detection-stream", get(detection_stream_handler))
        .with_state(state)
}

/// Run the HTTP server loop until Ctrl-C.
pub async fn run_http_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding detector HTTP listener on {}", addr))?;
    log::info!("[HTTP] Listening on {}", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("[HTTP] Shutdown requested");
        })
        .await
        .context("serving detector HTTP router")?;
    Ok(())
}

/// Validate a batch and start detection without waiting for it.
pub async fn detect_seism(
    State(state): State<AppState>,
    payload: Result<Json<DetectRequest>, JsonRejection>,
) -> Result<Json<DetectAck>, HttpServerError> {
    let Json(request) = payload.map_err(|e| HttpServerError::MalformedBody(e.body_text()))?;
    log::info!(
        "[HTTP] POST /v1/api/detector/detect_seism ({} channels)",
        request.matrices.len()
    );

    state
        .orchestrator
        .dispatch(request.matrices)
        .map_err(|err| {
            log::warn!("[HTTP] Batch rejected: {}", err);
            HttpServerError::InvalidBatch(err)
        })?;

    Ok(Json(DetectAck {
        message: "Detection started".to_string(),
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        channels: state.orchestrator.channel_count(),
        uptime_ms: state.uptime_ms(),
    })
}

pub async fn metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        stream_subscribers: state.stream.subscriber_count(),
        diagnostics: state.orchestrator.telemetry().snapshot(),
    })
}

pub async fn detection_stream_handler(State(state): State<AppState>) -> sse::DetectionStream {
    sse::detections(&state.stream)
}
