// Replay driver - recorded channels through the relay into the orchestrator
//
// The source runs as its own task and pushes frames over a bounded channel.
// Each batch the relay cuts is detected to completion before the next frame
// is absorbed, so replay output is in batch order. Previews of the selected
// channel go to the orchestrator's sink ahead of the batch they arrived with.

use tokio::sync::mpsc;

use crate::orchestrator::DetectionOrchestrator;
use crate::relay::WindowRelay;
use crate::source::SourceManager;

/// Frames buffered between the source task and the relay
const FRAME_BUFFER: usize = 16;

/// What a replay run went through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub frames: usize,
    pub batches: usize,
    pub rejected: usize,
    pub previews: usize,
}

/// Replay until the source is exhausted
pub async fn run(
    source: SourceManager,
    mut relay: WindowRelay,
    orchestrator: &DetectionOrchestrator,
) -> ReplaySummary {
    let (tx, mut rx) = mpsc::channel(FRAME_BUFFER);
    let producer = tokio::spawn(source.run(tx));

    let mut summary = ReplaySummary::default();
    while let Some(frame) = rx.recv().await {
        summary.frames += 1;

        let batch = relay.push(frame);
        if let Some(preview) = relay.take_preview() {
            summary.previews += 1;
            orchestrator.publish_preview(&preview);
        }

        let Some(batch) = batch else {
            continue;
        };

        match orchestrator.start_detection(batch).await {
            Ok(event) => {
                summary.batches += 1;
                log::info!(
                    "[Replay] Batch {} done: {} detected, {} failed",
                    event.batch_id,
                    event.detected_count(),
                    event.failed_count()
                );
            }
            Err(e) => {
                summary.rejected += 1;
                log::warn!("[Replay] Batch rejected: {}", e);
            }
        }
    }

    if let Err(e) = producer.await {
        log::error!("[Replay] Source task ended abnormally: {}", e);
    }

    summary
}
