//! HTTP request layer for the detector service.
//!
//! An Axum server that accepts detection batches, acknowledges them as soon
//! as they pass validation, streams detection events over SSE and exposes
//! health and telemetry endpoints.

mod routes;
mod sse;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;

use crate::config::AppConfig;
use crate::orchestrator::DetectionOrchestrator;
use crate::sink::BroadcastSink;
use crate::telemetry::TelemetryCollector;

pub use routes::{
    build_router, run_http_server, AppState, DetectAck, DetectRequest, HealthResponse,
    HttpServerError, MetricsResponse,
};
pub use sse::DetectionStream;

/// Build the detector pool from `config` and serve it on `addr`.
///
/// Artifacts are loaded before the listener binds, so a misconfigured
/// deployment never accepts a batch.
pub async fn serve(config: &AppConfig, addr: SocketAddr) -> anyhow::Result<()> {
    let stream = Arc::new(BroadcastSink::new(config.http.stream_buffer));
    let orchestrator = DetectionOrchestrator::from_config(
        &config.detector,
        stream.clone(),
        Arc::new(TelemetryCollector::default()),
    )
    .context("loading channel detectors")?;

    let state = AppState::new(Arc::new(orchestrator), stream);
    run_http_server(state, addr).await
}
