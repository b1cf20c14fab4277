// Model artifact error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;
use std::path::PathBuf;

/// Model error code constants
///
/// Error code range: 2001-2006
pub struct ModelErrorCodes {}

impl ModelErrorCodes {
    /// Artifact file does not exist
    pub const ARTIFACT_MISSING: i32 = 2001;

    /// Artifact exists but could not be read or parsed
    pub const ARTIFACT_UNREADABLE: i32 = 2002;

    /// Artifact was fitted on a different feature vocabulary
    pub const VOCABULARY_MISMATCH: i32 = 2003;

    /// Input vector length differs from the fitted width
    pub const SHAPE_MISMATCH: i32 = 2004;

    /// A scaled feature is NaN or infinite
    pub const NON_FINITE_FEATURE: i32 = 2005;

    /// The model produced a probability that is not a finite number
    pub const NON_FINITE_PROBABILITY: i32 = 2006;
}

/// Log a model error with structured context
pub fn log_model_error(err: &ModelError, context: &str) {
    error!(
        "Model error in {}: code={}, component=ModelArtifacts, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Configuration-class errors for the pre-fitted scaler and classifier
///
/// These are fatal at startup: a detector that cannot load or validate its
/// artifacts is never constructed.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Artifact file not found
    ArtifactMissing { path: PathBuf },

    /// Artifact I/O or JSON failure
    ArtifactUnreadable { path: PathBuf, reason: String },

    /// Fitted feature names differ from the extractor vocabulary
    VocabularyMismatch { reason: String },

    /// Wrong input width at inference time
    ShapeMismatch { expected: usize, actual: usize },

    /// Scaled feature the model cannot score (degenerate segment)
    NonFiniteFeature { name: String },

    /// Model output outside the real numbers
    NonFiniteProbability,
}

impl ErrorCode for ModelError {
    fn code(&self) -> i32 {
        match self {
            ModelError::ArtifactMissing { .. } => ModelErrorCodes::ARTIFACT_MISSING,
            ModelError::ArtifactUnreadable { .. } => ModelErrorCodes::ARTIFACT_UNREADABLE,
            ModelError::VocabularyMismatch { .. } => ModelErrorCodes::VOCABULARY_MISMATCH,
            ModelError::ShapeMismatch { .. } => ModelErrorCodes::SHAPE_MISMATCH,
            ModelError::NonFiniteFeature { .. } => ModelErrorCodes::NON_FINITE_FEATURE,
            ModelError::NonFiniteProbability => ModelErrorCodes::NON_FINITE_PROBABILITY,
        }
    }

    fn message(&self) -> String {
        match self {
            ModelError::ArtifactMissing { path } => {
                format!("Model artifact not found: {}", path.display())
            }
            ModelError::ArtifactUnreadable { path, reason } => {
                format!("Failed to load {}: {}", path.display(), reason)
            }
            ModelError::VocabularyMismatch { reason } => {
                format!("Artifact vocabulary mismatch: {}", reason)
            }
            ModelError::ShapeMismatch { expected, actual } => {
                format!(
                    "Feature vector has {} values, artifact expects {}",
                    actual, expected
                )
            }
            ModelError::NonFiniteFeature { name } => {
                format!("Feature {} is not finite after scaling", name)
            }
            ModelError::NonFiniteProbability => {
                "Model returned a non-finite event probability".to_string()
            }
        }
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ModelError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ModelError {}
