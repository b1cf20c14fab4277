// Batch validation error types

use crate::error::{DetectionError, ErrorCode};
use std::fmt;

/// Batch error code constants
///
/// Error code range: 3001-3003
pub struct BatchErrorCodes {}

impl BatchErrorCodes {
    /// Number of segments differs from the number of channel detectors
    pub const CHANNEL_COUNT_MISMATCH: i32 = 3001;

    /// One of the segments failed validation
    pub const INVALID_SEGMENT: i32 = 3002;

    /// Batch contains no segments at all
    pub const EMPTY_BATCH: i32 = 3003;
}

/// Request-level validation errors
///
/// Reported synchronously to the caller; nothing is dispatched when a batch
/// is rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchError {
    ChannelCountMismatch { expected: usize, actual: usize },
    InvalidSegment { channel: usize, source: DetectionError },
    EmptyBatch,
}

impl ErrorCode for BatchError {
    fn code(&self) -> i32 {
        match self {
            BatchError::ChannelCountMismatch { .. } => BatchErrorCodes::CHANNEL_COUNT_MISMATCH,
            BatchError::InvalidSegment { .. } => BatchErrorCodes::INVALID_SEGMENT,
            BatchError::EmptyBatch => BatchErrorCodes::EMPTY_BATCH,
        }
    }

    fn message(&self) -> String {
        match self {
            BatchError::ChannelCountMismatch { expected, actual } => {
                format!(
                    "Batch has {} segments but {} channel detectors are configured",
                    actual, expected
                )
            }
            BatchError::InvalidSegment { channel, source } => {
                format!("Channel {}: {}", channel, source.message())
            }
            BatchError::EmptyBatch => "Batch contains no segments".to_string(),
        }
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BatchError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BatchError::InvalidSegment { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_error_codes() {
        assert_eq!(
            BatchError::ChannelCountMismatch {
                expected: 6,
                actual: 5
            }
            .code(),
            BatchErrorCodes::CHANNEL_COUNT_MISMATCH
        );
        assert_eq!(BatchError::EmptyBatch.code(), 3003);
    }

    #[test]
    fn test_invalid_segment_message_names_channel() {
        let err = BatchError::InvalidSegment {
            channel: 2,
            source: DetectionError::NonIncreasingTime { index: 9 },
        };
        assert_eq!(err.code(), BatchErrorCodes::INVALID_SEGMENT);
        assert!(err.message().starts_with("Channel 2:"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
