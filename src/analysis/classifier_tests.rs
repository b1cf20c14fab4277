use super::*;
use crate::analysis::features::{FEATURE_COUNT, FEATURE_NAMES};
use std::sync::Arc;

/// Scaler that passes values through unchanged
struct IdentityScaler;

impl FeatureScaler for IdentityScaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        Ok(features.to_vec())
    }
}

/// Model that always returns the same probability
struct FixedModel(f64);

impl EventModel for FixedModel {
    fn event_probability(&self, _scaled: &[f64]) -> Result<f64, ModelError> {
        Ok(self.0)
    }
}

/// Model that reports the first scaled value as the probability
struct FirstValueModel;

impl EventModel for FirstValueModel {
    fn event_probability(&self, scaled: &[f64]) -> Result<f64, ModelError> {
        scaled.first().copied().ok_or(ModelError::ShapeMismatch {
            expected: FEATURE_COUNT,
            actual: 0,
        })
    }
}

/// Scaler that always rejects its input
struct RejectingScaler;

impl FeatureScaler for RejectingScaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        Err(ModelError::ShapeMismatch {
            expected: FEATURE_COUNT + 1,
            actual: features.len(),
        })
    }
}

fn zero_features() -> FeatureVector {
    FeatureVector::from_named(FEATURE_NAMES.iter().map(|n| (*n, 0.0))).unwrap()
}

fn classifier_with(probability: f64) -> Classifier {
    Classifier::new(Box::new(IdentityScaler), Box::new(FixedModel(probability)))
}

#[test]
fn test_probability_exactly_at_threshold_is_negative() {
    let result = classifier_with(0.5).classify(&zero_features()).unwrap();
    assert!(!result.label, "P = 0.5 must not be reported as an event");
    assert_eq!(result.confidence, 0.5);
}

#[test]
fn test_probability_just_above_threshold_is_positive() {
    let result = classifier_with(0.500_000_01)
        .classify(&zero_features())
        .unwrap();
    assert!(result.label);
}

#[test]
fn test_extreme_probabilities() {
    assert!(!classifier_with(0.0).classify(&zero_features()).unwrap().label);
    assert!(classifier_with(1.0).classify(&zero_features()).unwrap().label);
    assert!(!classifier_with(0.49).classify(&zero_features()).unwrap().label);
}

#[test]
fn test_scaled_vector_reaches_model_in_vocabulary_order() {
    let classifier = Classifier::new(Box::new(IdentityScaler), Box::new(FirstValueModel));
    let features = FeatureVector::from_named(
        FEATURE_NAMES
            .iter()
            .map(|n| (*n, if *n == "vel_mean" { 0.9 } else { 0.0 })),
    )
    .unwrap();

    let result = classifier.classify(&features).unwrap();
    assert_eq!(result.confidence, 0.9);
    assert!(result.label);
}

#[test]
fn test_scaler_error_propagates() {
    let classifier = Classifier::new(Box::new(RejectingScaler), Box::new(FixedModel(0.9)));
    let err = classifier.classify(&zero_features()).unwrap_err();
    assert_eq!(
        err,
        ModelError::ShapeMismatch {
            expected: FEATURE_COUNT + 1,
            actual: FEATURE_COUNT
        }
    );
}

#[test]
fn test_classifier_is_shareable_across_threads() {
    let classifier = Arc::new(classifier_with(0.75));
    let features = Arc::new(zero_features());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let classifier = Arc::clone(&classifier);
            let features = Arc::clone(&features);
            std::thread::spawn(move || classifier.classify(&features).unwrap())
        })
        .collect();

    for handle in handles {
        let result = handle.join().unwrap();
        assert!(result.label);
        assert_eq!(result.confidence, 0.75);
    }
}

#[test]
fn test_nan_feature_fails_instead_of_reading_negative() {
    let classifier = classifier_with(0.9);
    let features = FeatureVector::from_named(
        FEATURE_NAMES
            .iter()
            .map(|n| (*n, if *n == "vel_skew" { f64::NAN } else { 0.0 })),
    )
    .unwrap();

    let err = classifier.classify(&features).unwrap_err();
    assert_eq!(
        err,
        ModelError::NonFiniteFeature {
            name: "vel_skew".to_string()
        }
    );
}

#[test]
fn test_non_finite_probability_is_an_error() {
    for probability in [f64::NAN, f64::INFINITY] {
        let err = classifier_with(probability)
            .classify(&zero_features())
            .unwrap_err();
        assert_eq!(err, ModelError::NonFiniteProbability);
    }
}
