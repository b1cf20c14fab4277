// Error types for the seismic detector
//
// This module defines the error enums for the detection pipeline, the model
// artifacts, batch validation and recorded-channel replay. Each carries a
// stable numeric code that is forwarded to result consumers in per-channel
// failure markers and HTTP error bodies.

mod batch;
mod detection;
mod model;
mod source;

pub use batch::{BatchError, BatchErrorCodes};
pub use detection::{log_detection_error, DetectionError, DetectionErrorCodes};
pub use model::{log_model_error, ModelError, ModelErrorCodes};
pub use source::{SourceError, SourceErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the result sink and HTTP boundaries.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
