// Temporal module - Time-domain statistics
//
// Population statistics (ddof = 0) and biased moment estimators for skew and
// excess kurtosis. A series whose variance vanishes relative to its mean has
// undefined skew/kurtosis; those come back as NaN so a degenerate segment is
// visible in the feature vector instead of silently reading as symmetric.

/// Relative resolution below which a variance is treated as zero
const VARIANCE_RESOLUTION: f64 = 1e-15;

/// Central moments of a series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    pub mean: f64,
    pub variance: f64,
    pub skew: f64,
    pub kurtosis: f64,
}

impl Moments {
    /// Compute mean, population variance, skew and excess kurtosis
    pub fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                mean: f64::NAN,
                variance: f64::NAN,
                skew: f64::NAN,
                kurtosis: f64::NAN,
            };
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;

        let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
        for &v in values {
            let d = v - mean;
            let d2 = d * d;
            m2 += d2;
            m3 += d2 * d;
            m4 += d2 * d2;
        }
        m2 /= n;
        m3 /= n;
        m4 /= n;

        let degenerate = m2 <= (VARIANCE_RESOLUTION * mean).powi(2);
        let (skew, kurtosis) = if degenerate {
            (f64::NAN, f64::NAN)
        } else {
            (m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
        };

        Self {
            mean,
            variance: m2,
            skew,
            kurtosis,
        }
    }

    pub fn std(&self) -> f64 {
        self.variance.sqrt()
    }
}

pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

/// Sign with zero mapped to zero
fn sign(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Sign changes between consecutive samples divided by the sample count
///
/// A pass through an exact zero (`+, 0, -`) counts as two changes.
pub fn zero_crossing_rate(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let changes = values
        .windows(2)
        .filter(|w| sign(w[0]) != sign(w[1]))
        .count();

    changes as f64 / values.len() as f64
}

/// Sum of squared samples
pub fn energy(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum()
}

/// Shannon entropy (natural log) of a non-negative distribution
///
/// The input is normalized to sum to one first; zero entries contribute
/// nothing. An all-zero input has no distribution and yields NaN.
pub fn shannon_entropy(weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().sum();
    if total == 0.0 || !total.is_finite() {
        return f64::NAN;
    }

    -weights
        .iter()
        .map(|w| w / total)
        .filter(|p| *p > 0.0)
        .map(|p| p * p.ln())
        .sum::<f64>()
}

/// Entropy of the magnitudes |x|
pub fn magnitude_entropy(values: &[f64]) -> f64 {
    let magnitudes: Vec<f64> = values.iter().map(|v| v.abs()).collect();
    shannon_entropy(&magnitudes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moments_of_known_series() {
        let m = Moments::of(&[1.0, 2.0, 3.0, 4.0]);
        assert!((m.mean - 2.5).abs() < 1e-12);
        assert!((m.variance - 1.25).abs() < 1e-12);
        assert!(m.skew.abs() < 1e-12);
        // Uniform 4-point: m4 / m2^2 - 3 = 2.5625 / 1.5625 - 3
        assert!((m.kurtosis - (2.5625 / 1.5625 - 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_skew_sign_follows_tail() {
        let right_tail = Moments::of(&[0.0, 0.0, 0.0, 0.0, 10.0]);
        assert!(right_tail.skew > 0.0);
        let left_tail = Moments::of(&[0.0, 0.0, 0.0, 0.0, -10.0]);
        assert!(left_tail.skew < 0.0);
    }

    #[test]
    fn test_constant_series_has_undefined_shape() {
        let m = Moments::of(&[3.0; 10]);
        assert_eq!(m.variance, 0.0);
        assert!(m.skew.is_nan());
        assert!(m.kurtosis.is_nan());
    }

    #[test]
    fn test_zero_crossing_rate_counts_sign_changes() {
        assert_eq!(zero_crossing_rate(&[1.0, -1.0, 1.0, -1.0]), 0.75);
        assert_eq!(zero_crossing_rate(&[1.0, 0.0, -1.0, -2.0]), 0.5);
        assert_eq!(zero_crossing_rate(&[0.0; 4]), 0.0);
    }

    #[test]
    fn test_energy() {
        assert_eq!(energy(&[1.0, -2.0, 3.0]), 14.0);
    }

    #[test]
    fn test_entropy_of_uniform_distribution() {
        let h = shannon_entropy(&[1.0, 1.0, 1.0, 1.0]);
        assert!((h - 4.0_f64.ln()).abs() < 1e-12);
        assert_eq!(shannon_entropy(&[0.0, 5.0, 0.0]), 0.0);
        assert!(shannon_entropy(&[0.0, 0.0]).is_nan());
    }

    #[test]
    fn test_extrema() {
        assert_eq!(max(&[1.0, -3.0, 2.0]), 2.0);
        assert_eq!(min(&[1.0, -3.0, 2.0]), -3.0);
    }
}
