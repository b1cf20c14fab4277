//! Detection telemetry collector.
//!
//! The collector keeps a bounded history of batch and channel events plus a
//! broadcast stream for live consumers. It is constructed explicitly and
//! handed to the orchestrator; nothing here is process-global.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::broadcast;

pub mod events;

pub use events::MetricEvent;

/// Counters and recent events, as served by `/metrics`
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySnapshot {
    pub recent: Vec<MetricEvent>,
    pub total_events: u64,
    pub dropped_events: u64,
    pub batches: u64,
    pub channel_failures: u64,
}

/// Rolling window over batch wall-clock durations.
struct LatencyTracker {
    samples: VecDeque<f64>,
    max_samples: usize,
}

impl LatencyTracker {
    fn new(max_samples: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples,
        }
    }

    fn observe(&mut self, value: f64) -> (f64, f64, usize) {
        if self.samples.len() == self.max_samples {
            self.samples.pop_front();
        }
        self.samples.push_back(value);

        let count = self.samples.len();
        let sum: f64 = self.samples.iter().sum();
        let max = self.samples.iter().copied().fold(0.0_f64, f64::max);
        (sum / count as f64, max, count)
    }
}

/// Batch and channel-failure recorder shared by the orchestrator and the
/// HTTP layer
pub struct TelemetryCollector {
    tx: broadcast::Sender<MetricEvent>,
    history: Mutex<VecDeque<MetricEvent>>,
    history_capacity: usize,
    latency: Mutex<LatencyTracker>,
    total_events: AtomicU64,
    dropped_history: AtomicU64,
    batches: AtomicU64,
    channel_failures: AtomicU64,
}

impl TelemetryCollector {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self {
            tx,
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity,
            latency: Mutex::new(LatencyTracker::new(32)),
            total_events: AtomicU64::new(0),
            dropped_history: AtomicU64::new(0),
            batches: AtomicU64::new(0),
            channel_failures: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, event: MetricEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        {
            let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
            if self.history_capacity == 0 {
                self.dropped_history.fetch_add(1, Ordering::Relaxed);
            } else {
                if history.len() == self.history_capacity {
                    history.pop_front();
                    self.dropped_history.fetch_add(1, Ordering::Relaxed);
                }
                history.push_back(event.clone());
            }
        }

        let _ = self.tx.send(event);
    }

    /// Record a finished batch and the updated latency window
    pub fn record_batch(
        &self,
        batch_id: u64,
        channels: usize,
        detected: usize,
        failed: usize,
        elapsed_ms: f64,
    ) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.publish(MetricEvent::BatchCompleted {
            batch_id,
            channels,
            detected,
            failed,
            elapsed_ms,
        });

        let (avg_ms, max_ms, sample_count) = self
            .latency
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .observe(elapsed_ms);
        self.publish(MetricEvent::BatchLatency {
            avg_ms,
            max_ms,
            sample_count,
        });
    }

    pub fn record_channel_failure(
        &self,
        batch_id: u64,
        channel: usize,
        code: i32,
        message: impl Into<String>,
    ) {
        self.channel_failures.fetch_add(1, Ordering::Relaxed);
        self.publish(MetricEvent::ChannelFailed {
            batch_id,
            channel,
            code,
            message: message.into(),
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetricEvent> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        TelemetrySnapshot {
            recent: history.iter().cloned().collect(),
            total_events: self.total_events.load(Ordering::Relaxed),
            dropped_events: self.dropped_history.load(Ordering::Relaxed),
            batches: self.batches.load(Ordering::Relaxed),
            channel_failures: self.channel_failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new(256, 64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_and_batches_kept_in_arrival_order() {
        let collector = TelemetryCollector::new(8, 8);
        collector.record_channel_failure(1, 2, 1005, "no peaks");
        collector.record_batch(1, 6, 1, 1, 12.0);

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.recent.len(), 3);
        assert!(matches!(
            snapshot.recent[0],
            MetricEvent::ChannelFailed { channel: 2, code: 1005, .. }
        ));
        assert!(matches!(
            snapshot.recent[1],
            MetricEvent::BatchCompleted { batch_id: 1, detected: 1, .. }
        ));
        assert!(matches!(
            snapshot.recent[2],
            MetricEvent::BatchLatency { sample_count: 1, .. }
        ));
        assert_eq!(snapshot.batches, 1);
        assert_eq!(snapshot.channel_failures, 1);
    }

    #[test]
    fn oldest_events_evicted_past_history_capacity() {
        let collector = TelemetryCollector::new(8, 2);
        for channel in 0..3 {
            collector.record_channel_failure(7, channel, 1001, "bad band");
        }

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.recent.len(), 2);
        assert_eq!(snapshot.dropped_events, 1);
        assert_eq!(snapshot.total_events, 3);
        assert!(matches!(
            snapshot.recent[0],
            MetricEvent::ChannelFailed { channel: 1, .. }
        ));
    }

    #[test]
    fn latency_window_tracks_average_and_max() {
        let collector = TelemetryCollector::new(8, 16);
        collector.record_batch(1, 6, 0, 0, 10.0);
        collector.record_batch(2, 6, 0, 0, 30.0);

        let snapshot = collector.snapshot();
        let last = snapshot.recent.last().cloned();
        assert_eq!(
            last,
            Some(MetricEvent::BatchLatency {
                avg_ms: 20.0,
                max_ms: 30.0,
                sample_count: 2
            })
        );
    }

    #[tokio::test]
    async fn subscribers_receive_live_events() {
        let collector = TelemetryCollector::default();
        let mut rx = collector.subscribe();
        collector.record_channel_failure(3, 0, 1008, "panicked");

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, MetricEvent::ChannelFailed { batch_id: 3, .. }));
    }

    #[test]
    fn snapshot_serializes_with_tagged_events() {
        let collector = TelemetryCollector::new(4, 4);
        collector.record_batch(9, 2, 1, 0, 5.0);
        let json = serde_json::to_value(collector.snapshot()).unwrap();
        assert_eq!(json["recent"][0]["type"], "batch_completed");
        assert_eq!(json["recent"][0]["payload"]["batch_id"], 9);
    }
}
