// FFT module - Discrete Fourier Transform magnitudes
//
// The detector works on whole segments rather than short frames, so the
// magnitude spectrum covers the full two-sided DFT of the series with no
// windowing and no zero padding: output length equals input length.

use rustfft::{num_complex::Complex, FftPlanner};
use std::sync::{Mutex, PoisonError};

/// FFT processor that computes full-length magnitude spectra
///
/// The planner is kept so repeated segments of the same length reuse the
/// cached plan.
pub struct FftProcessor {
    fft_planner: Mutex<FftPlanner<f64>>,
}

impl FftProcessor {
    pub fn new() -> Self {
        Self {
            fft_planner: Mutex::new(FftPlanner::new()),
        }
    }

    /// Compute |DFT| of a real series
    ///
    /// # Returns
    /// Magnitude spectrum (same length as `series`, all bins)
    pub fn magnitude(&self, series: &[f64]) -> Vec<f64> {
        if series.is_empty() {
            return Vec::new();
        }

        let mut buffer: Vec<Complex<f64>> =
            series.iter().map(|&x| Complex::new(x, 0.0)).collect();

        let fft = {
            let mut planner = self
                .fft_planner
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            planner.plan_fft_forward(series.len())
        };
        fft.process(&mut buffer);

        buffer.iter().map(|c| c.norm()).collect()
    }
}

impl Default for FftProcessor {
    fn default() -> Self {
        Self::new()
    }
}
