// Classifier - scaled features to a binary event decision
//
// The classifier is a thin composition of two pre-fitted collaborators:
//
// 1. FeatureScaler: per-feature standardization fitted alongside the model
// 2. EventModel: maps a scaled vector to P(event)
//
// The decision rule is fixed: an event is reported only when the positive
// class probability is strictly greater than EVENT_THRESHOLD. A probability
// of exactly 0.5 is a negative.
//
// Both collaborators are trait objects so tests (and alternative artifact
// formats) can be swapped in without touching the detector.

use super::features::FeatureVector;
use crate::error::ModelError;

/// Positive-class probability that must be exceeded to report an event
pub const EVENT_THRESHOLD: f64 = 0.5;

/// Pre-fitted per-feature transform
pub trait FeatureScaler: Send + Sync {
    /// Transform a vector in vocabulary order
    ///
    /// # Errors
    /// `ShapeMismatch` if the width differs from the fitted width
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ModelError>;
}

/// Pre-fitted probabilistic binary model
pub trait EventModel: Send + Sync {
    /// Probability of the positive (event) class
    fn event_probability(&self, scaled: &[f64]) -> Result<f64, ModelError>;
}

/// Binary decision with the probability it was derived from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub label: bool,
    pub confidence: f64,
}

impl Classification {
    pub fn from_probability(probability: f64) -> Self {
        Self {
            label: probability > EVENT_THRESHOLD,
            confidence: probability,
        }
    }
}

/// Scaler + model pair applied to one feature vector at a time
///
/// Holds no mutable state; shared across channels behind `Arc`.
pub struct Classifier {
    scaler: Box<dyn FeatureScaler>,
    model: Box<dyn EventModel>,
}

impl Classifier {
    pub fn new(scaler: Box<dyn FeatureScaler>, model: Box<dyn EventModel>) -> Self {
        Self { scaler, model }
    }

    /// Scale, score and threshold a feature vector
    ///
    /// # Errors
    /// Any `ModelError` raised by the scaler or the model, plus
    /// `NonFiniteFeature` / `NonFiniteProbability` when a degenerate segment
    /// leaves nothing the model can score. Such a channel fails rather than
    /// reading as a negative.
    pub fn classify(&self, features: &FeatureVector) -> Result<Classification, ModelError> {
        let scaled = self.scaler.transform(features.as_slice())?;
        if let Some(((name, _), _)) = features
            .iter()
            .zip(&scaled)
            .find(|(_, value)| !value.is_finite())
        {
            return Err(ModelError::NonFiniteFeature {
                name: name.to_string(),
            });
        }

        let probability = self.model.event_probability(&scaled)?;
        if !probability.is_finite() {
            return Err(ModelError::NonFiniteProbability);
        }

        log::trace!(
            "[Classifier] P(event)={:.6} threshold={}",
            probability,
            EVENT_THRESHOLD
        );

        Ok(Classification::from_probability(probability))
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("threshold", &EVENT_THRESHOLD)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
