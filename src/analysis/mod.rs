// Analysis module - per-channel detection pipeline
//
// This module holds the data model shared by every pipeline stage and the
// stages themselves:
//
// Pipeline: SignalConditioner → FeatureExtractor → Classifier → EventLocalizer
//
// - conditioning: band-pass filtering, gradient and FFT magnitude
// - features: fixed-vocabulary statistical/spectral/wavelet features
// - classifier: scaler + probabilistic model + fixed decision threshold
// - localizer: peak picking and grouping to estimate the onset time
// - detector: ChannelDetector composing the four stages
// - model: JSON-backed pre-fitted scaler and classifier artifacts

use serde::{Deserialize, Serialize};

use crate::error::DetectionError;

pub mod classifier;
pub mod conditioning;
pub mod detector;
pub mod features;
pub mod localizer;
pub mod model;

pub use classifier::{Classification, Classifier, EventModel, FeatureScaler, EVENT_THRESHOLD};
pub use conditioning::{ConditionedSegment, SignalConditioner};
pub use detector::{ChannelDetector, SegmentDetector};
pub use features::{FeatureExtractor, FeatureVector, FEATURE_NAMES};
pub use localizer::EventLocalizer;

/// Smallest segment that survives both the filter padding and a 5-level
/// wavelet decomposition without boundary-only coefficients.
pub const MIN_SEGMENT_LEN: usize = features::wavelet::MIN_DECOMPOSITION_LEN;

/// Onset sentinel carried by negative results
pub const NO_ONSET: f64 = -1.0;

/// One `(time, velocity)` reading; serialized as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Sample {
    /// Relative time in seconds
    pub time: f64,
    /// Ground velocity in model units
    pub velocity: f64,
}

impl Sample {
    pub fn new(time: f64, velocity: f64) -> Self {
        Self { time, velocity }
    }
}

impl From<(f64, f64)> for Sample {
    fn from((time, velocity): (f64, f64)) -> Self {
        Self { time, velocity }
    }
}

impl From<Sample> for (f64, f64) {
    fn from(sample: Sample) -> Self {
        (sample.time, sample.velocity)
    }
}

/// Ordered readings of one channel, immutable once built
///
/// Time and velocity are held as parallel columns so every stage can borrow
/// them as slices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Sample>", into = "Vec<Sample>")]
pub struct Segment {
    time: Vec<f64>,
    velocity: Vec<f64>,
}

impl Segment {
    pub fn new(samples: Vec<Sample>) -> Self {
        let (time, velocity) = samples.into_iter().map(|s| (s.time, s.velocity)).unzip();
        Self { time, velocity }
    }

    pub fn from_columns(time: Vec<f64>, velocity: Vec<f64>) -> Self {
        debug_assert_eq!(time.len(), velocity.len());
        Self { time, velocity }
    }

    pub fn len(&self) -> usize {
        self.velocity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.velocity.is_empty()
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn velocity(&self) -> &[f64] {
        &self.velocity
    }

    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.time
            .iter()
            .zip(&self.velocity)
            .map(|(&time, &velocity)| Sample { time, velocity })
    }

    /// Check the segment can go through the whole pipeline
    ///
    /// Rejects segments shorter than [`MIN_SEGMENT_LEN`], non-finite values
    /// and a time axis that is not strictly increasing.
    pub fn validate(&self) -> Result<(), DetectionError> {
        if self.len() < MIN_SEGMENT_LEN {
            return Err(DetectionError::SegmentTooShort {
                required: MIN_SEGMENT_LEN,
                actual: self.len(),
            });
        }

        for (index, (t, v)) in self.time.iter().zip(&self.velocity).enumerate() {
            if !t.is_finite() || !v.is_finite() {
                return Err(DetectionError::NonFiniteSample { index });
            }
        }

        if let Some(index) = self.time.windows(2).position(|w| w[1] <= w[0]) {
            return Err(DetectionError::NonIncreasingTime { index: index + 1 });
        }

        Ok(())
    }
}

impl From<Vec<Sample>> for Segment {
    fn from(samples: Vec<Sample>) -> Self {
        Segment::new(samples)
    }
}

impl From<Segment> for Vec<Sample> {
    fn from(segment: Segment) -> Self {
        segment.samples().collect()
    }
}

/// Outcome of one channel: `(detected, onset_time)`
///
/// Serialized as a two-element array. `onset_time` is [`NO_ONSET`] whenever
/// `detected` is false and carries no meaning in that case.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(bool, f64)", into = "(bool, f64)")]
pub struct DetectionResult {
    pub detected: bool,
    pub onset_time: f64,
}

impl DetectionResult {
    pub fn not_detected() -> Self {
        Self {
            detected: false,
            onset_time: NO_ONSET,
        }
    }

    pub fn detected_at(onset_time: f64) -> Self {
        Self {
            detected: true,
            onset_time,
        }
    }

    /// Onset time when an event was detected
    pub fn onset(&self) -> Option<f64> {
        self.detected.then_some(self.onset_time)
    }
}

impl From<(bool, f64)> for DetectionResult {
    fn from((detected, onset_time): (bool, f64)) -> Self {
        if detected {
            Self::detected_at(onset_time)
        } else {
            Self::not_detected()
        }
    }
}

impl From<DetectionResult> for (bool, f64) {
    fn from(result: DetectionResult) -> Self {
        (result.detected, result.onset_time)
    }
}

#[cfg(test)]
mod tests;
