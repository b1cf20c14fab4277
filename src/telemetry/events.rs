//! Telemetry event types exposed through `/metrics` and the CLI.

use serde::{Deserialize, Serialize};

/// Metric events emitted by the detection orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MetricEvent {
    /// One batch went through fan-out and gather.
    BatchCompleted {
        batch_id: u64,
        channels: usize,
        detected: usize,
        failed: usize,
        elapsed_ms: f64,
    },
    /// A single channel's pipeline raised instead of producing a result.
    ChannelFailed {
        batch_id: u64,
        channel: usize,
        code: i32,
        message: String,
    },
    /// Rolling batch latency over the most recent batches.
    BatchLatency {
        avg_ms: f64,
        max_ms: f64,
        sample_count: usize,
    },
}
