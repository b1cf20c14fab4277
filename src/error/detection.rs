// Detection pipeline error types and constants

use crate::error::{ErrorCode, ModelError};
use log::error;
use std::fmt;

/// Detection error code constants
///
/// Single source of truth for the numeric codes carried in per-channel
/// failure markers on the wire.
///
/// Error code range: 1001-1008
pub struct DetectionErrorCodes {}

impl DetectionErrorCodes {
    /// Band-pass critical frequencies are outside (0, Nyquist) or inverted
    pub const INVALID_FILTER_BAND: i32 = 1001;

    /// Segment shorter than filter padding or wavelet depth allows
    pub const SEGMENT_TOO_SHORT: i32 = 1002;

    /// Time axis is not strictly increasing
    pub const NON_INCREASING_TIME: i32 = 1003;

    /// Sample contains NaN or infinity
    pub const NON_FINITE_SAMPLE: i32 = 1004;

    /// Feature vector does not match the fixed vocabulary
    pub const FEATURE_VOCABULARY: i32 = 1005;

    /// Classifier reported an event but no peaks could be localized
    pub const NO_PEAKS_FOUND: i32 = 1006;

    /// Scaler or model rejected the feature vector
    pub const MODEL_REJECTED: i32 = 1007;

    /// Worker task panicked or was cancelled before producing a result
    pub const WORKER_ABORTED: i32 = 1008;
}

/// Log a detection error with structured context
///
/// Fields: error_code, component, message and the caller-provided context
/// (usually the channel index).
pub fn log_detection_error(err: &DetectionError, context: &str) {
    error!(
        "Detection error in {}: code={}, component=ChannelDetector, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while running the per-channel pipeline
///
/// Error code range: 1001-1008
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionError {
    /// Normalized band edges must satisfy 0 < low < high < 1
    InvalidFilterBand {
        lowcut: f64,
        highcut: f64,
        sampling_rate: f64,
    },

    /// Segment is too short for conditioning or decomposition
    SegmentTooShort { required: usize, actual: usize },

    /// Time axis stops increasing at `index`
    NonIncreasingTime { index: usize },

    /// Time or velocity at `index` is NaN/infinite
    NonFiniteSample { index: usize },

    /// Feature name missing, duplicated or unknown
    FeatureVocabulary { reason: String },

    /// Positive classification without any localizable peak
    NoPeaksFound,

    /// Scaler/model refused the feature vector
    ModelRejected(ModelError),

    /// Channel worker died before reporting
    WorkerAborted { reason: String },
}

impl ErrorCode for DetectionError {
    fn code(&self) -> i32 {
        match self {
            DetectionError::InvalidFilterBand { .. } => DetectionErrorCodes::INVALID_FILTER_BAND,
            DetectionError::SegmentTooShort { .. } => DetectionErrorCodes::SEGMENT_TOO_SHORT,
            DetectionError::NonIncreasingTime { .. } => DetectionErrorCodes::NON_INCREASING_TIME,
            DetectionError::NonFiniteSample { .. } => DetectionErrorCodes::NON_FINITE_SAMPLE,
            DetectionError::FeatureVocabulary { .. } => DetectionErrorCodes::FEATURE_VOCABULARY,
            DetectionError::NoPeaksFound => DetectionErrorCodes::NO_PEAKS_FOUND,
            DetectionError::ModelRejected(_) => DetectionErrorCodes::MODEL_REJECTED,
            DetectionError::WorkerAborted { .. } => DetectionErrorCodes::WORKER_ABORTED,
        }
    }

    fn message(&self) -> String {
        match self {
            DetectionError::InvalidFilterBand {
                lowcut,
                highcut,
                sampling_rate,
            } => format!(
                "Invalid band-pass [{}, {}] Hz for sampling rate {} Hz (edges must lie strictly inside (0, Nyquist))",
                lowcut, highcut, sampling_rate
            ),
            DetectionError::SegmentTooShort { required, actual } => {
                format!(
                    "Segment too short: need at least {} samples, got {}",
                    required, actual
                )
            }
            DetectionError::NonIncreasingTime { index } => {
                format!("Time axis not strictly increasing at sample {}", index)
            }
            DetectionError::NonFiniteSample { index } => {
                format!("Non-finite time or velocity at sample {}", index)
            }
            DetectionError::FeatureVocabulary { reason } => {
                format!("Feature vocabulary violation: {}", reason)
            }
            DetectionError::NoPeaksFound => {
                "Event classified but no peak above the 99th percentile was found".to_string()
            }
            DetectionError::ModelRejected(err) => {
                format!("Model rejected feature vector: {}", err.message())
            }
            DetectionError::WorkerAborted { reason } => {
                format!("Channel worker aborted: {}", reason)
            }
        }
    }
}

impl fmt::Display for DetectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DetectionError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for DetectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DetectionError::ModelRejected(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelError> for DetectionError {
    fn from(err: ModelError) -> Self {
        DetectionError::ModelRejected(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_error_codes() {
        assert_eq!(
            DetectionError::InvalidFilterBand {
                lowcut: 0.5,
                highcut: 3.0,
                sampling_rate: 6.0
            }
            .code(),
            DetectionErrorCodes::INVALID_FILTER_BAND
        );
        assert_eq!(
            DetectionError::SegmentTooShort {
                required: 224,
                actual: 10
            }
            .code(),
            1002
        );
        assert_eq!(DetectionError::NonIncreasingTime { index: 3 }.code(), 1003);
        assert_eq!(DetectionError::NonFiniteSample { index: 3 }.code(), 1004);
        assert_eq!(DetectionError::NoPeaksFound.code(), 1006);
        assert_eq!(
            DetectionError::WorkerAborted {
                reason: "panic".to_string()
            }
            .code(),
            DetectionErrorCodes::WORKER_ABORTED
        );
    }

    #[test]
    fn test_detection_error_messages() {
        let err = DetectionError::SegmentTooShort {
            required: 224,
            actual: 100,
        };
        assert_eq!(
            err.message(),
            "Segment too short: need at least 224 samples, got 100"
        );

        let err = DetectionError::NoPeaksFound;
        assert!(err.message().contains("no peak"));
    }

    #[test]
    fn test_model_error_wraps_into_detection_error() {
        let model_err = ModelError::ShapeMismatch {
            expected: 41,
            actual: 40,
        };
        let err: DetectionError = model_err.clone().into();
        assert_eq!(err.code(), DetectionErrorCodes::MODEL_REJECTED);
        assert!(err.message().contains("41"));
        assert_eq!(err, DetectionError::ModelRejected(model_err));
    }

    #[test]
    fn test_detection_error_display() {
        let err = DetectionError::NonIncreasingTime { index: 7 };
        let display = format!("{}", err);
        assert!(display.contains("DetectionError"));
        assert!(display.contains("1003"));
    }
}
