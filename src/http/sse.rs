use std::convert::Infallible;
use std::pin::Pin;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;

use crate::sink::{BroadcastSink, DETECTION_EVENT};

pub type DetectionStream = Sse<Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>>;

/// Build a Server-Sent Events stream of detection batches.
///
/// Events missed by a lagging client are skipped, not replayed.
pub fn detections(sink: &BroadcastSink) -> DetectionStream {
    let stream = BroadcastStream::new(sink.subscribe()).filter_map(|event| async move {
        match event {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(payload) => Some(Ok(Event::default().event(DETECTION_EVENT).data(payload))),
                Err(_) => None,
            },
            Err(lagged) => {
                log::warn!("[SSE] Detection stream client {}", lagged);
                None
            }
        }
    });

    Sse::new(Box::pin(stream) as Pin<Box<_>>).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(5))
            .text("detector-keepalive"),
    )
}
