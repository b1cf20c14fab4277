// Seismic Detector Core - multi-channel transient event detection
// Per-channel conditioning/feature/classifier pipeline with concurrent fan-out

// Module declarations
pub mod analysis;
pub mod config;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod orchestrator;
pub mod relay;
pub mod replay;
pub mod sink;
pub mod source;
pub mod telemetry;

// Re-exports for convenience
pub use analysis::{ChannelDetector, DetectionResult, Sample, Segment, SegmentDetector};
pub use config::AppConfig;
pub use orchestrator::DetectionOrchestrator;
pub use sink::{BroadcastSink, ChannelOutcome, ChannelPreview, DetectionEvent, ResultSink};

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static LOGGING: Once = Once::new();

/// Install the global tracing subscriber (and the `log` bridge)
///
/// Filter comes from `RUST_LOG`, defaulting to `info`. Safe to call more
/// than once; only the first call has an effect.
pub fn init_logging() {
    LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        // Another subscriber may already be installed by an embedding binary
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
