// Result sink: delivery of one detection event per completed batch
//
// Sinks may also take channel previews: decimated readings of one selected
// channel, produced by the window relay for live display. Previews are
// optional; the default `preview` drops them.
//
// The orchestrator only knows the `ResultSink` trait. Implementations:
// - BroadcastSink: tokio broadcast fan-out (SSE stream, in-process consumers)
// - JsonLinesSink: one JSON document per line on any writer (CLI replay)
//
// Delivery guarantees are the sink's concern. A broadcast with no
// subscribers, or a subscriber that lags and loses old events, is not an
// error for the producer.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::analysis::{DetectionResult, Sample};
use crate::error::{DetectionError, ErrorCode};

/// Event name carried by every emitted batch
pub const DETECTION_EVENT: &str = "detection";

/// Error marker placed in a failed channel's slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelFailure {
    pub code: i32,
    pub message: String,
}

impl From<&DetectionError> for ChannelFailure {
    fn from(err: &DetectionError) -> Self {
        Self {
            code: err.code(),
            message: err.message(),
        }
    }
}

/// Per-channel slot of a batch result
///
/// Wire format: `[detected, onset_time]` on success,
/// `{"error": {"code": N, "message": "..."}}` on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelOutcome {
    Completed(DetectionResult),
    Failed { error: ChannelFailure },
}

impl ChannelOutcome {
    pub fn failed(err: &DetectionError) -> Self {
        ChannelOutcome::Failed { error: err.into() }
    }

    pub fn result(&self) -> Option<&DetectionResult> {
        match self {
            ChannelOutcome::Completed(result) => Some(result),
            ChannelOutcome::Failed { .. } => None,
        }
    }

    pub fn is_detected(&self) -> bool {
        self.result().is_some_and(|r| r.detected)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ChannelOutcome::Failed { .. })
    }
}

impl From<Result<DetectionResult, DetectionError>> for ChannelOutcome {
    fn from(result: Result<DetectionResult, DetectionError>) -> Self {
        match result {
            Ok(result) => ChannelOutcome::Completed(result),
            Err(err) => ChannelOutcome::failed(&err),
        }
    }
}

/// Ordered results of one batch, `results[i]` belonging to channel `i`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    pub event: String,
    pub batch_id: u64,
    pub results: Vec<ChannelOutcome>,
}

impl DetectionEvent {
    pub fn new(batch_id: u64, results: Vec<ChannelOutcome>) -> Self {
        Self {
            event: DETECTION_EVENT.to_string(),
            batch_id,
            results,
        }
    }

    pub fn detected_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_detected()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_failed()).count()
    }
}

/// Which slice of a channel a preview covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewKind {
    /// Everything the relay retains for the channel, sent on selection
    Overview,
    /// The page that just arrived
    Update,
}

/// Decimated readings of one channel (numbered from 1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelPreview {
    pub kind: PreviewKind,
    pub channel: usize,
    pub samples: Vec<Sample>,
}

/// Consumer of completed batches
pub trait ResultSink: Send + Sync {
    fn emit(&self, event: &DetectionEvent);

    fn preview(&self, _preview: &ChannelPreview) {}
}

/// Broadcast fan-out of detection events
///
/// Multiple subscribers each receive every event; a subscriber that falls
/// more than `capacity` events behind skips the oldest ones.
pub struct BroadcastSink {
    tx: broadcast::Sender<DetectionEvent>,
    previews: broadcast::Sender<ChannelPreview>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        let (previews, _) = broadcast::channel(capacity.max(1));
        Self { tx, previews }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DetectionEvent> {
        self.tx.subscribe()
    }

    pub fn subscribe_previews(&self) -> broadcast::Receiver<ChannelPreview> {
        self.previews.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl ResultSink for BroadcastSink {
    fn emit(&self, event: &DetectionEvent) {
        match self.tx.send(event.clone()) {
            Ok(receivers) => log::debug!(
                "[BroadcastSink] Batch {} delivered to {} subscriber(s)",
                event.batch_id,
                receivers
            ),
            Err(_) => log::debug!(
                "[BroadcastSink] Batch {} emitted with no subscribers",
                event.batch_id
            ),
        }
    }

    fn preview(&self, preview: &ChannelPreview) {
        let _ = self.previews.send(preview.clone());
    }
}

/// Writes each event as a single JSON line
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    fn write_line<T: Serialize>(&self, value: &T) -> std::io::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        serde_json::to_writer(&mut *writer, value)?;
        writeln!(writer)?;
        writer.flush()
    }
}

impl<W: Write + Send> ResultSink for JsonLinesSink<W> {
    fn emit(&self, event: &DetectionEvent) {
        if let Err(e) = self.write_line(event) {
            log::warn!(
                "[JsonLinesSink] Failed to write batch {}: {}",
                event.batch_id,
                e
            );
        }
    }

    fn preview(&self, preview: &ChannelPreview) {
        if let Err(e) = self.write_line(preview) {
            log::warn!(
                "[JsonLinesSink] Failed to write preview of channel {}: {}",
                preview.channel,
                e
            );
        }
    }
}
