// SignalConditioner - zero-phase band-pass filtering and derived series
//
// Conditioning turns a raw segment into the arrays the feature extractor
// consumes:
// - acceleration: numeric gradient of velocity w.r.t. time (second order in
//   the interior, first order at the edges, non-uniform spacing aware)
// - fft_magnitude: |DFT| of the full velocity series (same length)
// - filtered_velocity: Butterworth band-pass, applied forward and backward
//
// Filter design follows the classic analog-prototype route:
// 1. Butterworth prototype poles on the unit circle (order N)
// 2. Pre-warp band edges and transform low-pass → band-pass (2N poles)
// 3. Bilinear transform to the z-plane, expand to (b, a) polynomials
//
// Zero-phase application pads both ends with an odd reflection of
// 3 * max(len(a), len(b)) samples and starts each pass from the filter's
// steady-state initial conditions so edges do not ring.

use rustfft::num_complex::Complex;
use std::f64::consts::PI;

use super::features::fft::FftProcessor;
use super::Segment;
use crate::error::DetectionError;

/// Pipeline band-pass lower edge (Hz)
pub const FILTER_LOWCUT_HZ: f64 = 0.5;
/// Pipeline band-pass upper edge (Hz)
pub const FILTER_HIGHCUT_HZ: f64 = 1.0;
/// Sampling rate assumed by the pipeline filter (Hz)
pub const FILTER_SAMPLING_RATE_HZ: f64 = 6.0;
/// Butterworth prototype order
pub const FILTER_ORDER: usize = 4;

/// Digital filter in transfer-function form, `a[0] == 1`
#[derive(Debug, Clone, PartialEq)]
pub struct TransferFunction {
    pub b: Vec<f64>,
    pub a: Vec<f64>,
}

impl TransferFunction {
    /// Edge padding used by zero-phase filtering
    pub fn pad_len(&self) -> usize {
        3 * self.a.len().max(self.b.len())
    }
}

/// Design a digital Butterworth band-pass filter
///
/// # Arguments
/// * `lowcut`, `highcut` - band edges in Hz
/// * `sampling_rate` - sampling rate in Hz
/// * `order` - prototype order (the band-pass has `2 * order` poles)
///
/// # Errors
/// `InvalidFilterBand` unless `0 < lowcut < highcut < sampling_rate / 2`
pub fn butter_bandpass(
    lowcut: f64,
    highcut: f64,
    sampling_rate: f64,
    order: usize,
) -> Result<TransferFunction, DetectionError> {
    let nyquist = 0.5 * sampling_rate;
    let low = lowcut / nyquist;
    let high = highcut / nyquist;

    let valid = order > 0 && low > 0.0 && high < 1.0 && low < high;
    if !valid {
        return Err(DetectionError::InvalidFilterBand {
            lowcut,
            highcut,
            sampling_rate,
        });
    }

    // Pre-warp for a bilinear transform with fs = 2
    let fs = 2.0;
    let warped_low = 2.0 * fs * (PI * low / fs).tan();
    let warped_high = 2.0 * fs * (PI * high / fs).tan();
    let bandwidth = warped_high - warped_low;
    let center = (warped_low * warped_high).sqrt();

    let n = order as f64;
    let prototype: Vec<Complex<f64>> = (0..order)
        .map(|k| {
            let m = -n + 1.0 + 2.0 * k as f64;
            -Complex::from_polar(1.0, PI * m / (2.0 * n))
        })
        .collect();

    // Low-pass → band-pass: each prototype pole splits in two, `order`
    // zeros land at the origin
    let center_sq = Complex::new(center * center, 0.0);
    let mut poles = Vec::with_capacity(2 * order);
    for &p in &prototype {
        let scaled = p * (bandwidth / 2.0);
        poles.push(scaled + (scaled * scaled - center_sq).sqrt());
    }
    for &p in &prototype {
        let scaled = p * (bandwidth / 2.0);
        poles.push(scaled - (scaled * scaled - center_sq).sqrt());
    }
    let analog_gain = bandwidth.powi(order as i32);

    // Bilinear transform; zeros at the origin map to z = 1, the excess
    // poles put matching zeros at z = -1
    let fs2 = Complex::new(2.0 * fs, 0.0);
    let digital_poles: Vec<Complex<f64>> = poles.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect();
    let mut digital_zeros = vec![Complex::new(1.0, 0.0); order];
    digital_zeros.extend(std::iter::repeat(Complex::new(-1.0, 0.0)).take(order));

    let zero_term = fs2.powu(order as u32);
    let pole_term = poles
        .iter()
        .fold(Complex::new(1.0, 0.0), |acc, &p| acc * (fs2 - p));
    let gain = analog_gain * (zero_term / pole_term).re;

    let b = poly(&digital_zeros).into_iter().map(|c| c * gain).collect();
    let a = poly(&digital_poles);

    Ok(TransferFunction { b, a })
}

/// Real coefficients of the monic polynomial with the given roots
fn poly(roots: &[Complex<f64>]) -> Vec<f64> {
    let mut coeffs = vec![Complex::new(1.0, 0.0)];
    for &root in roots {
        let mut next = coeffs.clone();
        next.push(Complex::new(0.0, 0.0));
        for i in 1..next.len() {
            next[i] -= root * coeffs[i - 1];
        }
        coeffs = next;
    }
    coeffs.into_iter().map(|c| c.re).collect()
}

/// Steady-state initial conditions of the transposed direct form II for a
/// unit step input.
fn lfilter_zi(tf: &TransferFunction) -> Vec<f64> {
    let n = tf.a.len().max(tf.b.len());
    let mut a = tf.a.clone();
    a.resize(n, 0.0);
    let mut b = tf.b.clone();
    b.resize(n, 0.0);

    let a_sum: f64 = a.iter().sum();
    let b_sum: f64 = b[1..]
        .iter()
        .zip(&a[1..])
        .map(|(bk, ak)| bk - ak * b[0])
        .sum();

    let mut zi = vec![0.0; n - 1];
    zi[0] = b_sum / a_sum;

    let mut asum = 1.0;
    let mut csum = 0.0;
    for k in 1..n - 1 {
        asum += a[k];
        csum += b[k] - a[k] * b[0];
        zi[k] = asum * zi[0] - csum;
    }
    zi
}

/// Transposed direct form II filter run with explicit initial state
fn lfilter(tf: &TransferFunction, input: &[f64], mut state: Vec<f64>) -> Vec<f64> {
    let b = &tf.b;
    let a = &tf.a;
    let order = state.len();

    input
        .iter()
        .map(|&x| {
            let y = b[0] * x + state[0];
            for i in 0..order - 1 {
                state[i] = b[i + 1] * x + state[i + 1] - a[i + 1] * y;
            }
            state[order - 1] = b[order] * x - a[order] * y;
            y
        })
        .collect()
}

/// Forward-backward filtering with odd edge extension
///
/// # Errors
/// `SegmentTooShort` when the series is not longer than the edge padding
pub fn filtfilt(tf: &TransferFunction, series: &[f64]) -> Result<Vec<f64>, DetectionError> {
    let pad = tf.pad_len();
    if series.len() <= pad {
        return Err(DetectionError::SegmentTooShort {
            required: pad + 1,
            actual: series.len(),
        });
    }

    let n = series.len();
    let first = series[0];
    let last = series[n - 1];

    let mut extended = Vec::with_capacity(n + 2 * pad);
    extended.extend((1..=pad).rev().map(|i| 2.0 * first - series[i]));
    extended.extend_from_slice(series);
    extended.extend((1..=pad).map(|i| 2.0 * last - series[n - 1 - i]));

    let zi = lfilter_zi(tf);

    let x0 = extended[0];
    let forward = lfilter(tf, &extended, zi.iter().map(|z| z * x0).collect());

    let mut reversed = forward;
    reversed.reverse();
    let y0 = reversed[0];
    let mut backward = lfilter(tf, &reversed, zi.iter().map(|z| z * y0).collect());
    backward.reverse();

    Ok(backward[pad..pad + n].to_vec())
}

/// Zero-phase Butterworth band-pass of a raw series
pub fn bandpass(
    series: &[f64],
    lowcut: f64,
    highcut: f64,
    sampling_rate: f64,
    order: usize,
) -> Result<Vec<f64>, DetectionError> {
    let tf = butter_bandpass(lowcut, highcut, sampling_rate, order)?;
    filtfilt(&tf, series)
}

/// Gradient of `values` with respect to the (possibly non-uniform) `axis`
pub fn gradient(values: &[f64], axis: &[f64]) -> Result<Vec<f64>, DetectionError> {
    let n = values.len();
    if n < 2 || axis.len() != n {
        return Err(DetectionError::SegmentTooShort {
            required: 2,
            actual: n.min(axis.len()),
        });
    }

    let mut out = vec![0.0; n];
    out[0] = (values[1] - values[0]) / (axis[1] - axis[0]);
    out[n - 1] = (values[n - 1] - values[n - 2]) / (axis[n - 1] - axis[n - 2]);

    for i in 1..n - 1 {
        let hs = axis[i] - axis[i - 1];
        let hd = axis[i + 1] - axis[i];
        let numerator =
            hs * hs * values[i + 1] + (hd * hd - hs * hs) * values[i] - hd * hd * values[i - 1];
        out[i] = numerator / (hs * hd * (hd + hs));
    }

    Ok(out)
}

/// Raw segment plus the derived per-sample series
///
/// Derived fields are computed fresh by every [`SignalConditioner::condition`]
/// call.
#[derive(Debug, Clone)]
pub struct ConditionedSegment<'a> {
    pub segment: &'a Segment,
    pub acceleration: Vec<f64>,
    pub fft_magnitude: Vec<f64>,
    /// Band-passed velocity; no feature reads it yet
    pub filtered_velocity: Vec<f64>,
}

impl ConditionedSegment<'_> {
    pub fn velocity(&self) -> &[f64] {
        self.segment.velocity()
    }

    pub fn time(&self) -> &[f64] {
        self.segment.time()
    }
}

/// Applies the fixed pipeline conditioning to raw segments
pub struct SignalConditioner {
    filter: TransferFunction,
    fft_processor: FftProcessor,
}

impl SignalConditioner {
    /// Build a conditioner with the pipeline filter constants
    pub fn new() -> Result<Self, DetectionError> {
        let filter = butter_bandpass(
            FILTER_LOWCUT_HZ,
            FILTER_HIGHCUT_HZ,
            FILTER_SAMPLING_RATE_HZ,
            FILTER_ORDER,
        )?;

        Ok(Self {
            filter,
            fft_processor: FftProcessor::new(),
        })
    }

    pub fn filter(&self) -> &TransferFunction {
        &self.filter
    }

    /// Derive acceleration, FFT magnitude and filtered velocity
    pub fn condition<'a>(
        &self,
        segment: &'a Segment,
    ) -> Result<ConditionedSegment<'a>, DetectionError> {
        let acceleration = gradient(segment.velocity(), segment.time())?;
        let fft_magnitude = self.fft_processor.magnitude(segment.velocity());
        let filtered_velocity = filtfilt(&self.filter, segment.velocity())?;

        Ok(ConditionedSegment {
            segment,
            acceleration,
            fft_magnitude,
            filtered_velocity,
        })
    }
}
