// DetectionOrchestrator - concurrent fan-out of a batch to channel detectors
//
// Lifecycle of one batch:
// 1. validate: segment count == detector count, every segment usable
// 2. fan out: segment i runs on detector i inside a blocking task; a
//    semaphore bounds how many channels compute at once
// 3. gather: completions arrive in any order and are written into a
//    pre-sized slot vector at their channel index
// 4. emit: once every slot is filled, the ordered results go to the sink
//    as a single DetectionEvent
//
// A channel that fails (pipeline error, panic, cancelled worker) fills its
// slot with an error marker; the other channels and the emission are not
// affected. Nothing here is global: detectors, sink and telemetry are all
// injected at construction.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::analysis::{ChannelDetector, DetectionResult, Segment, SegmentDetector};
use crate::config::DetectorConfig;
use crate::error::{log_detection_error, BatchError, DetectionError, ErrorCode, ModelError};
use crate::sink::{ChannelOutcome, ChannelPreview, DetectionEvent, ResultSink};
use crate::telemetry::TelemetryCollector;

/// Fixed pool of per-channel detectors plus the batch sink
pub struct DetectionOrchestrator {
    detectors: Vec<Arc<dyn SegmentDetector>>,
    sink: Arc<dyn ResultSink>,
    telemetry: Arc<TelemetryCollector>,
    permits: Arc<Semaphore>,
    next_batch_id: AtomicU64,
}

impl DetectionOrchestrator {
    /// Build around an explicit detector collection
    ///
    /// `detectors[i]` serves channel `i + 1` for the orchestrator's whole
    /// lifetime. `max_parallel` of 0 is treated as 1.
    pub fn new(
        detectors: Vec<Arc<dyn SegmentDetector>>,
        sink: Arc<dyn ResultSink>,
        telemetry: Arc<TelemetryCollector>,
        max_parallel: usize,
    ) -> Self {
        Self {
            detectors,
            sink,
            telemetry,
            permits: Arc::new(Semaphore::new(max_parallel.max(1))),
            next_batch_id: AtomicU64::new(1),
        }
    }

    /// Eagerly build one `ChannelDetector` per configured channel
    ///
    /// Every detector loads and validates its own scaler and model; any
    /// artifact problem aborts construction.
    pub fn from_config(
        config: &DetectorConfig,
        sink: Arc<dyn ResultSink>,
        telemetry: Arc<TelemetryCollector>,
    ) -> Result<Self, ModelError> {
        let detectors = (0..config.channel_count)
            .map(|_| {
                ChannelDetector::from_config(config)
                    .map(|detector| Arc::new(detector) as Arc<dyn SegmentDetector>)
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::info!(
            "[DetectionOrchestrator] {} channel detectors ready (max {} in parallel)",
            detectors.len(),
            config.max_parallel_channels
        );

        Ok(Self::new(
            detectors,
            sink,
            telemetry,
            config.max_parallel_channels,
        ))
    }

    pub fn channel_count(&self) -> usize {
        self.detectors.len()
    }

    pub fn telemetry(&self) -> &Arc<TelemetryCollector> {
        &self.telemetry
    }

    /// Hand a channel preview to the same sink detection events go to
    pub fn publish_preview(&self, preview: &ChannelPreview) {
        self.sink.preview(preview);
    }

    /// Check a batch can be dispatched
    ///
    /// Channels in errors are numbered from 1.
    pub fn validate_batch(&self, batch: &[Segment]) -> Result<(), BatchError> {
        if batch.is_empty() {
            return Err(BatchError::EmptyBatch);
        }

        if batch.len() != self.detectors.len() {
            return Err(BatchError::ChannelCountMismatch {
                expected: self.detectors.len(),
                actual: batch.len(),
            });
        }

        for (index, segment) in batch.iter().enumerate() {
            segment
                .validate()
                .map_err(|source| BatchError::InvalidSegment {
                    channel: index + 1,
                    source,
                })?;
        }

        Ok(())
    }

    /// Run one batch to completion and emit it
    ///
    /// Returns the emitted event. Validation errors are returned before any
    /// work is scheduled and nothing is emitted for them.
    pub async fn start_detection(&self, batch: Vec<Segment>) -> Result<DetectionEvent, BatchError> {
        self.validate_batch(&batch)?;

        let batch_id = self.next_batch_id.fetch_add(1, Ordering::Relaxed);
        let span = tracing::info_span!("detection_batch", batch_id, channels = batch.len());

        async move {
            let started = Instant::now();
            let results = self.run_channels(batch_id, batch).await;
            let event = DetectionEvent::new(batch_id, results);
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

            self.sink.emit(&event);
            self.telemetry.record_batch(
                batch_id,
                event.results.len(),
                event.detected_count(),
                event.failed_count(),
                elapsed_ms,
            );

            tracing::info!(
                detected = event.detected_count(),
                failed = event.failed_count(),
                elapsed_ms,
                "batch emitted"
            );

            Ok(event)
        }
        .instrument(span)
        .await
    }

    /// Validate synchronously, then run the batch in the background
    ///
    /// The caller gets its acknowledgement as soon as validation passes;
    /// the handle can be awaited or dropped.
    pub fn dispatch(
        self: &Arc<Self>,
        batch: Vec<Segment>,
    ) -> Result<JoinHandle<Result<DetectionEvent, BatchError>>, BatchError> {
        self.validate_batch(&batch)?;

        let orchestrator = Arc::clone(self);
        Ok(tokio::spawn(async move {
            let outcome = orchestrator.start_detection(batch).await;
            if let Err(e) = &outcome {
                log::error!("[DetectionOrchestrator] Dispatched batch rejected: {}", e);
            }
            outcome
        }))
    }

    async fn run_channels(&self, batch_id: u64, batch: Vec<Segment>) -> Vec<ChannelOutcome> {
        let channel_count = batch.len();
        let mut pending = FuturesUnordered::new();

        for (index, (segment, detector)) in batch.into_iter().zip(&self.detectors).enumerate() {
            let detector = Arc::clone(detector);
            let permits = Arc::clone(&self.permits);

            pending.push(async move {
                // Held until the blocking task has finished
                let _permit = permits.acquire_owned().await.ok();
                let joined =
                    tokio::task::spawn_blocking(move || detector.predict(&segment)).await;
                (index, joined)
            });
        }

        let mut slots: Vec<Option<ChannelOutcome>> = vec![None; channel_count];

        while let Some((index, joined)) = pending.next().await {
            let result: Result<DetectionResult, DetectionError> = match joined {
                Ok(result) => result,
                Err(join_error) => Err(DetectionError::WorkerAborted {
                    reason: join_error.to_string(),
                }),
            };

            if let Err(err) = &result {
                log_detection_error(err, &format!("batch {} channel {}", batch_id, index + 1));
                self.telemetry
                    .record_channel_failure(batch_id, index + 1, err.code(), err.message());
            }

            slots[index] = Some(ChannelOutcome::from(result));
        }

        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    ChannelOutcome::failed(&DetectionError::WorkerAborted {
                        reason: "channel produced no result".to_string(),
                    })
                })
            })
            .collect()
    }
}
