// FeatureExtractor - fixed-vocabulary features for event classification
//
// This module turns a conditioned segment into the 41-value feature vector
// the pre-fitted scaler and classifier were trained on.
//
// Module organization:
// - types: vocabulary (FEATURE_NAMES) and FeatureVector
// - fft: full-length DFT magnitudes (used by the conditioner)
// - temporal: moments, extrema, zero crossings, energy, entropy
// - spectral: FFT magnitude summaries and spectral entropy
// - wavelet: 5-level db4 decomposition
// - mod.rs: coordinator (FeatureExtractor)
//
// Features extracted:
// 1. Velocity/acceleration mean, std, var, skew, kurtosis
// 2. FFT magnitude mean, std, max, min
// 3. Velocity/acceleration extrema
// 4. Zero-crossing rate and signal energy of velocity
// 5. Entropy of |velocity|, |acceleration| and of the normalized PSD
// 6. Mean, std and energy of each of the 6 wavelet bands
//
// `filtered_velocity` is part of the conditioned segment but no feature
// reads it.

pub mod fft;
mod spectral;
mod temporal;
mod types;
pub mod wavelet;

pub use types::{feature_index, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};

use super::conditioning::ConditionedSegment;
use crate::error::DetectionError;
use spectral::SpectrumSummary;
use temporal::Moments;
use wavelet::DECOMPOSITION_LEVEL;

/// Stateless feature extraction over conditioned segments
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the full feature vocabulary
    ///
    /// Pure: identical input always produces identical values.
    ///
    /// # Errors
    /// `FeatureVocabulary` if the produced keys ever diverge from
    /// [`FEATURE_NAMES`]
    pub fn extract(&self, conditioned: &ConditionedSegment<'_>) -> Result<FeatureVector, DetectionError> {
        let velocity = conditioned.velocity();
        let acceleration = &conditioned.acceleration;
        let spectrum = &conditioned.fft_magnitude;

        let vel = Moments::of(velocity);
        let acc = Moments::of(acceleration);
        let fft = SpectrumSummary::of(spectrum);

        let mut features: Vec<(String, f64)> = vec![
            ("vel_mean".into(), vel.mean),
            ("vel_std".into(), vel.std()),
            ("vel_var".into(), vel.variance),
            ("vel_skew".into(), vel.skew),
            ("vel_kurtosis".into(), vel.kurtosis),
            ("acc_mean".into(), acc.mean),
            ("acc_std".into(), acc.std()),
            ("acc_var".into(), acc.variance),
            ("acc_skew".into(), acc.skew),
            ("acc_kurtosis".into(), acc.kurtosis),
            ("fft_mean".into(), fft.mean),
            ("fft_std".into(), fft.std),
            ("fft_max".into(), fft.max),
            ("fft_min".into(), fft.min),
            ("vel_max".into(), temporal::max(velocity)),
            ("vel_min".into(), temporal::min(velocity)),
            ("acc_max".into(), temporal::max(acceleration)),
            ("acc_min".into(), temporal::min(acceleration)),
            (
                "zero_crossing_rate".into(),
                temporal::zero_crossing_rate(velocity),
            ),
            ("signal_energy".into(), temporal::energy(velocity)),
            ("vel_entropy".into(), temporal::magnitude_entropy(velocity)),
            (
                "acc_entropy".into(),
                temporal::magnitude_entropy(acceleration),
            ),
            (
                "spectral_entropy".into(),
                spectral::spectral_entropy(spectrum),
            ),
        ];

        for (band, coeffs) in wavelet::wavedec(velocity, DECOMPOSITION_LEVEL)
            .iter()
            .enumerate()
        {
            let moments = Moments::of(coeffs);
            features.push((format!("wavelet_coeff_mean_{band}"), moments.mean));
            features.push((format!("wavelet_coeff_std_{band}"), moments.std()));
            features.push((
                format!("wavelet_coeff_energy_{band}"),
                temporal::energy(coeffs),
            ));
        }

        FeatureVector::from_named(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::conditioning::SignalConditioner;
    use crate::analysis::{Sample, Segment};
    use rand::{Rng, SeedableRng};

    /// Noisy oscillation sampled at the pipeline rate
    fn noisy_segment(len: usize, seed: u64) -> Segment {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let samples = (0..len)
            .map(|i| {
                let t = i as f64 / 6.0;
                let v = (2.0 * std::f64::consts::PI * 0.7 * t).sin() * 1e-9
                    + rng.gen_range(-1e-10..1e-10);
                Sample::new(t, v)
            })
            .collect();
        Segment::new(samples)
    }

    fn extract(segment: &Segment) -> FeatureVector {
        let conditioner = SignalConditioner::new().unwrap();
        let conditioned = conditioner.condition(segment).unwrap();
        FeatureExtractor::new().extract(&conditioned).unwrap()
    }

    #[test]
    fn test_vocabulary_is_complete_and_ordered() {
        let features = extract(&noisy_segment(2000, 7));
        let names: Vec<&str> = features.iter().map(|(name, _)| name).collect();
        assert_eq!(names, FEATURE_NAMES.to_vec());
        assert_eq!(features.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let segment = noisy_segment(3000, 11);
        let snapshot = segment.clone();

        let first = extract(&segment);
        let second = extract(&segment);

        let bits = |fv: &FeatureVector| fv.as_slice().iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&first), bits(&second));
        assert_eq!(segment, snapshot, "extraction must not mutate the segment");
    }

    #[test]
    fn test_feature_values_are_consistent() {
        let features = extract(&noisy_segment(2400, 3));
        let get = |name: &str| features.get(name).unwrap();

        assert!((get("vel_std").powi(2) - get("vel_var")).abs() <= get("vel_var") * 1e-9);
        assert!(get("vel_max") >= get("vel_min"));
        assert!(get("fft_max") >= get("fft_mean"));
        assert!((0.0..=1.0).contains(&get("zero_crossing_rate")));
        assert!(get("spectral_entropy") >= 0.0);
        assert!(get("signal_energy") > 0.0);

        // Orthonormal transform: band energies add up to about the signal energy
        let band_energy: f64 = (0..6)
            .map(|b| get(&format!("wavelet_coeff_energy_{b}")))
            .sum();
        let ratio = band_energy / get("signal_energy");
        assert!((0.8..1.2).contains(&ratio), "energy ratio {}", ratio);
    }

    #[test]
    fn test_from_named_rejects_missing_and_unknown_keys() {
        let partial = FEATURE_NAMES[..40].iter().map(|n| (*n, 0.0));
        let err = FeatureVector::from_named(partial).unwrap_err();
        assert!(err.to_string().contains("wavelet_coeff_energy_5"));

        let mut with_extra: Vec<(&str, f64)> = FEATURE_NAMES.iter().map(|n| (*n, 0.0)).collect();
        with_extra.push(("vel_median", 1.0));
        assert!(FeatureVector::from_named(with_extra).is_err());

        let mut duplicated: Vec<(&str, f64)> = FEATURE_NAMES.iter().map(|n| (*n, 0.0)).collect();
        duplicated[40] = ("vel_mean", 0.0);
        assert!(FeatureVector::from_named(duplicated).is_err());
    }

    #[test]
    fn test_from_named_is_order_independent() {
        let forward = FeatureVector::from_named(
            FEATURE_NAMES.iter().enumerate().map(|(i, n)| (*n, i as f64)),
        )
        .unwrap();
        let backward = FeatureVector::from_named(
            FEATURE_NAMES
                .iter()
                .enumerate()
                .rev()
                .map(|(i, n)| (*n, i as f64)),
        )
        .unwrap();
        assert_eq!(forward, backward);
        assert_eq!(forward.get("spectral_entropy"), Some(22.0));
        assert_eq!(feature_index("wavelet_coeff_mean_0"), Some(23));
    }
}
