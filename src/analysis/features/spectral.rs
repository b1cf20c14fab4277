// Spectral module - Frequency-domain summaries
//
// Features computed from the full two-sided magnitude spectrum produced by
// the conditioner. Spectral entropy uses the power spectrum |X|^2 normalized
// to a probability distribution.

use super::temporal::{self, Moments};

/// Summary statistics of a magnitude spectrum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumSummary {
    pub mean: f64,
    pub std: f64,
    pub max: f64,
    pub min: f64,
}

impl SpectrumSummary {
    pub fn of(spectrum: &[f64]) -> Self {
        let moments = Moments::of(spectrum);
        Self {
            mean: moments.mean,
            std: moments.std(),
            max: temporal::max(spectrum),
            min: temporal::min(spectrum),
        }
    }
}

/// Shannon entropy of the normalized power spectral density
///
/// # Arguments
/// * `spectrum` - magnitude spectrum |X[k]|
pub fn spectral_entropy(spectrum: &[f64]) -> f64 {
    let power: Vec<f64> = spectrum.iter().map(|m| m * m).collect();
    temporal::shannon_entropy(&power)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_bin_has_zero_entropy() {
        let mut spectrum = vec![0.0; 16];
        spectrum[3] = 4.0;
        assert_eq!(spectral_entropy(&spectrum), 0.0);
    }

    #[test]
    fn test_flat_spectrum_has_max_entropy() {
        let spectrum = vec![2.0; 16];
        assert!((spectral_entropy(&spectrum) - 16.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_summary() {
        let summary = SpectrumSummary::of(&[1.0, 3.0]);
        assert_eq!(summary.mean, 2.0);
        assert_eq!(summary.std, 1.0);
        assert_eq!(summary.max, 3.0);
        assert_eq!(summary.min, 1.0);
    }
}
