// ChannelDetector - the full per-channel pipeline behind one call
//
// predict(segment):
//   condition → extract → classify
//   negative  → (false, -1), localizer never runs
//   positive  → (true, locate(segment))
//   failure   → Err; a degenerate segment (NaN features) is a failure,
//               never a negative
//
// A classifier that rejects the vector's shape means the artifacts were
// fitted on another vocabulary. That is a configuration fault: it is logged
// at error level, and the channel still fails on its own rather than
// taking the batch down.
//
// A detector owns its classifier and holds no state between calls, so one
// instance can serve consecutive batches of its channel.

use super::classifier::Classifier;
use super::conditioning::SignalConditioner;
use super::features::FeatureExtractor;
use super::localizer::EventLocalizer;
use super::model::ModelArtifacts;
use super::{DetectionResult, Segment};
use crate::config::DetectorConfig;
use crate::error::{log_model_error, DetectionError, ModelError};

/// Anything that turns one channel segment into a detection result
///
/// The orchestrator only depends on this seam, so tests can substitute
/// detectors with controlled latency or failures.
pub trait SegmentDetector: Send + Sync {
    fn predict(&self, segment: &Segment) -> Result<DetectionResult, DetectionError>;
}

/// Conditioner, extractor, classifier and localizer for one channel
pub struct ChannelDetector {
    conditioner: SignalConditioner,
    extractor: FeatureExtractor,
    classifier: Classifier,
    localizer: EventLocalizer,
}

impl ChannelDetector {
    /// Build around an already loaded classifier
    ///
    /// # Errors
    /// Only if the pipeline filter constants cannot be realized
    pub fn new(classifier: Classifier) -> Result<Self, DetectionError> {
        Ok(Self {
            conditioner: SignalConditioner::new()?,
            extractor: FeatureExtractor::new(),
            classifier,
            localizer: EventLocalizer::new(),
        })
    }

    /// Load this detector's own scaler and model from the configured paths
    pub fn from_config(config: &DetectorConfig) -> Result<Self, ModelError> {
        let artifacts = ModelArtifacts::load(config)?;
        Self::new(artifacts.into_classifier()).map_err(|e| ModelError::ArtifactUnreadable {
            path: config.models_dir.clone(),
            reason: e.to_string(),
        })
    }
}

impl SegmentDetector for ChannelDetector {
    fn predict(&self, segment: &Segment) -> Result<DetectionResult, DetectionError> {
        segment.validate()?;

        let conditioned = self.conditioner.condition(segment)?;
        let features = self.extractor.extract(&conditioned)?;
        let classification = self.classifier.classify(&features).map_err(|err| {
            if matches!(
                err,
                ModelError::ShapeMismatch { .. } | ModelError::VocabularyMismatch { .. }
            ) {
                log_model_error(
                    &err,
                    "ChannelDetector::predict (artifacts do not fit the extractor)",
                );
            }
            DetectionError::from(err)
        })?;

        if !classification.label {
            log::debug!(
                "[ChannelDetector] No event (P={:.4})",
                classification.confidence
            );
            return Ok(DetectionResult::not_detected());
        }

        let onset_time = self.localizer.locate(segment)?;
        log::info!(
            "[ChannelDetector] Event detected (P={:.4}), onset at t={}",
            classification.confidence,
            onset_time
        );

        Ok(DetectionResult::detected_at(onset_time))
    }
}
