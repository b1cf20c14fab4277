// Types module - fixed feature vocabulary and the keyed feature vector
//
// The scaler and classifier were fitted on positional input, so the order
// of FEATURE_NAMES is part of the artifact contract and must never change.

use std::collections::HashSet;

use crate::error::DetectionError;

/// Number of features in the vocabulary
pub const FEATURE_COUNT: usize = 41;

/// Feature vocabulary in fitted order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "vel_mean",
    "vel_std",
    "vel_var",
    "vel_skew",
    "vel_kurtosis",
    "acc_mean",
    "acc_std",
    "acc_var",
    "acc_skew",
    "acc_kurtosis",
    "fft_mean",
    "fft_std",
    "fft_max",
    "fft_min",
    "vel_max",
    "vel_min",
    "acc_max",
    "acc_min",
    "zero_crossing_rate",
    "signal_energy",
    "vel_entropy",
    "acc_entropy",
    "spectral_entropy",
    "wavelet_coeff_mean_0",
    "wavelet_coeff_std_0",
    "wavelet_coeff_energy_0",
    "wavelet_coeff_mean_1",
    "wavelet_coeff_std_1",
    "wavelet_coeff_energy_1",
    "wavelet_coeff_mean_2",
    "wavelet_coeff_std_2",
    "wavelet_coeff_energy_2",
    "wavelet_coeff_mean_3",
    "wavelet_coeff_std_3",
    "wavelet_coeff_energy_3",
    "wavelet_coeff_mean_4",
    "wavelet_coeff_std_4",
    "wavelet_coeff_energy_4",
    "wavelet_coeff_mean_5",
    "wavelet_coeff_std_5",
    "wavelet_coeff_energy_5",
];

/// Position of a feature name in the vocabulary
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_NAMES.iter().position(|candidate| *candidate == name)
}

/// Feature values keyed by the fixed vocabulary
///
/// Construction guarantees every vocabulary key is present exactly once, so
/// [`FeatureVector::as_slice`] is always in fitted order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Build from `(name, value)` pairs in any order
    ///
    /// # Errors
    /// `FeatureVocabulary` on unknown, duplicated or missing names
    pub fn from_named<I, S>(pairs: I) -> Result<Self, DetectionError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut values = [0.0; FEATURE_COUNT];
        let mut seen = HashSet::with_capacity(FEATURE_COUNT);

        for (name, value) in pairs {
            let name = name.as_ref();
            let index = feature_index(name).ok_or_else(|| DetectionError::FeatureVocabulary {
                reason: format!("unknown feature '{}'", name),
            })?;
            if !seen.insert(index) {
                return Err(DetectionError::FeatureVocabulary {
                    reason: format!("duplicate feature '{}'", name),
                });
            }
            values[index] = value;
        }

        if let Some(missing) = (0..FEATURE_COUNT).find(|i| !seen.contains(i)) {
            return Err(DetectionError::FeatureVocabulary {
                reason: format!("missing feature '{}'", FEATURE_NAMES[missing]),
            });
        }

        Ok(Self { values })
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        feature_index(name).map(|i| self.values[i])
    }

    /// Values in vocabulary order
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        FEATURE_COUNT
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}
