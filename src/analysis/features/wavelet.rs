// Wavelet module - multilevel discrete wavelet decomposition
//
// Daubechies-4 (8-tap) analysis filters with half-sample symmetric boundary
// extension. Each level convolves the current approximation with the low-
// and high-pass filters and keeps every second output starting at index 1,
// giving floor((N + 7) / 2) coefficients per band.
//
// A 5-level decomposition yields 6 bands ordered coarse to fine:
// [cA5, cD5, cD4, cD3, cD2, cD1]

/// Decomposition depth used by the feature extractor
pub const DECOMPOSITION_LEVEL: u32 = 5;

/// db4 decomposition low-pass filter
pub const DB4_DEC_LO: [f64; 8] = [
    -0.010597401784997278,
    0.032883011666982945,
    0.030841381835986965,
    -0.18703481171888114,
    -0.02798376941698385,
    0.6308807679295904,
    0.7148465705525415,
    0.23037781330885523,
];

/// db4 decomposition high-pass filter (quadrature mirror of the low-pass)
pub const DB4_DEC_HI: [f64; 8] = [
    -0.23037781330885523,
    0.7148465705525415,
    -0.6308807679295904,
    -0.02798376941698385,
    0.18703481171888114,
    0.030841381835986965,
    -0.032883011666982945,
    -0.010597401784997278,
];

/// Shortest input for which every level still has interior coefficients:
/// (filter_len - 1) * 2^level
pub const MIN_DECOMPOSITION_LEN: usize = (DB4_DEC_LO.len() - 1) * (1 << DECOMPOSITION_LEVEL);

/// Deepest level that avoids boundary-only coefficients
pub fn max_level(len: usize, filter_len: usize) -> u32 {
    if filter_len < 2 || len < filter_len - 1 {
        return 0;
    }
    (len / (filter_len - 1)).ilog2()
}

/// Map an out-of-range index onto the half-sample symmetric extension
fn symmetric_index(index: isize, len: usize) -> usize {
    let period = 2 * len as isize;
    let folded = index.rem_euclid(period) as usize;
    if folded < len {
        folded
    } else {
        2 * len - 1 - folded
    }
}

/// Single-level decimated convolution with symmetric extension
fn decimate(input: &[f64], filter: &[f64]) -> Vec<f64> {
    let n = input.len();
    let f = filter.len();
    let out_len = (n + f - 1) / 2;

    (0..out_len)
        .map(|o| {
            let i = (2 * o + 1) as isize;
            filter
                .iter()
                .enumerate()
                .map(|(j, tap)| tap * input[symmetric_index(i - j as isize, n)])
                .sum()
        })
        .collect()
}

/// One analysis step: (approximation, detail)
pub fn dwt(input: &[f64]) -> (Vec<f64>, Vec<f64>) {
    if input.is_empty() {
        return (Vec::new(), Vec::new());
    }
    (decimate(input, &DB4_DEC_LO), decimate(input, &DB4_DEC_HI))
}

/// Multilevel decomposition, bands ordered `[cA_n, cD_n, ..., cD_1]`
pub fn wavedec(input: &[f64], level: u32) -> Vec<Vec<f64>> {
    let mut details = Vec::with_capacity(level as usize);
    let mut approximation = input.to_vec();

    for _ in 0..level {
        let (a, d) = dwt(&approximation);
        details.push(d);
        approximation = a;
    }

    let mut bands = Vec::with_capacity(level as usize + 1);
    bands.push(approximation);
    bands.extend(details.into_iter().rev());
    bands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_form_orthonormal_pair() {
        let lo_energy: f64 = DB4_DEC_LO.iter().map(|c| c * c).sum();
        let hi_energy: f64 = DB4_DEC_HI.iter().map(|c| c * c).sum();
        let cross: f64 = DB4_DEC_LO.iter().zip(&DB4_DEC_HI).map(|(a, b)| a * b).sum();
        let lo_sum: f64 = DB4_DEC_LO.iter().sum();

        assert!((lo_energy - 1.0).abs() < 1e-12);
        assert!((hi_energy - 1.0).abs() < 1e-12);
        assert!(cross.abs() < 1e-12);
        assert!((lo_sum - std::f64::consts::SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn test_band_lengths() {
        let input: Vec<f64> = (0..1000).map(|i| (i as f64 * 0.01).sin()).collect();
        let bands = wavedec(&input, DECOMPOSITION_LEVEL);
        let lengths: Vec<usize> = bands.iter().map(Vec::len).collect();
        // 1000 → 503 → 255 → 131 → 69 → 38
        assert_eq!(lengths, vec![38, 38, 69, 131, 255, 503]);
    }

    #[test]
    fn test_constant_signal_has_no_detail() {
        let input = vec![1.5; 256];
        let (approx, detail) = dwt(&input);
        assert!(detail.iter().all(|d| d.abs() < 1e-12));
        assert!(approx
            .iter()
            .all(|a| (a - 1.5 * std::f64::consts::SQRT_2).abs() < 1e-12));
    }

    #[test]
    fn test_symmetric_extension() {
        assert_eq!(symmetric_index(-1, 5), 0);
        assert_eq!(symmetric_index(-2, 5), 1);
        assert_eq!(symmetric_index(5, 5), 4);
        assert_eq!(symmetric_index(6, 5), 3);
        assert_eq!(symmetric_index(2, 5), 2);
    }

    #[test]
    fn test_minimum_length_supports_full_depth() {
        assert_eq!(MIN_DECOMPOSITION_LEN, 224);
        assert_eq!(max_level(MIN_DECOMPOSITION_LEN, 8), DECOMPOSITION_LEVEL);
        assert_eq!(max_level(MIN_DECOMPOSITION_LEN - 1, 8), DECOMPOSITION_LEVEL - 1);
    }
}
