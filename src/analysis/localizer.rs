// EventLocalizer - onset estimation for positively classified segments
//
// Algorithm:
// 1. Height threshold = 99th percentile of the raw velocity (linear
//    interpolation between order statistics)
// 2. Local maxima (plateaus resolve to their midpoint) at or above the
//    threshold
// 3. Enforce a minimum spacing of 50 samples, keeping the taller peak
// 4. Scan peaks in index order; a peak less than 300 samples after the
//    previous one joins its group, otherwise it opens a new group
// 5. Largest group wins, earliest group on ties
// 6. Onset index = first peak of that group minus 750, clamped at 0
//
// The returned time is always read from the segment's own time axis.

use super::Segment;
use crate::error::DetectionError;

/// Percentile of the raw velocity used as the peak height floor
pub const PEAK_PERCENTILE: f64 = 99.0;

/// Minimum spacing between retained peaks (samples)
pub const MIN_PEAK_DISTANCE: usize = 50;

/// Peaks closer than this to the previous peak share a group (samples)
pub const GROUP_GAP: usize = 300;

/// Samples between the onset and the first peak of the selected group
pub const ONSET_LOOKBACK: usize = 750;

/// Percentile with linear interpolation between closest ranks
///
/// Returns NaN for an empty series.
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (q / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let t = rank - lo as f64;

    let (a, b) = (sorted[lo], sorted[hi]);
    let diff = b - a;
    // Interpolate from the nearer end to stay monotonic in t
    if t >= 0.5 {
        b - diff * (1.0 - t)
    } else {
        a + diff * t
    }
}

/// Strict local maxima; a flat top reports its (lower) midpoint
fn local_maxima(values: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if values.len() < 3 {
        return peaks;
    }

    let last = values.len() - 1;
    let mut i = 1;
    while i < last {
        if values[i - 1] < values[i] {
            let mut ahead = i + 1;
            while ahead < last && values[ahead] == values[i] {
                ahead += 1;
            }
            if values[ahead] < values[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }

    peaks
}

/// Drop peaks within `distance` samples of a taller peak
///
/// Peaks are visited tallest first; among equal heights the later peak is
/// visited first.
fn select_by_distance(peaks: &[usize], values: &[f64], distance: usize) -> Vec<usize> {
    let mut keep = vec![true; peaks.len()];

    let mut by_height: Vec<usize> = (0..peaks.len()).collect();
    by_height.sort_by(|&a, &b| values[peaks[a]].total_cmp(&values[peaks[b]]));

    for &j in by_height.iter().rev() {
        if !keep[j] {
            continue;
        }

        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }

        let mut k = j + 1;
        while k < peaks.len() && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&peak, kept)| kept.then_some(peak))
        .collect()
}

/// Peak indices at or above `height`, at least `distance` samples apart
pub fn find_peaks(values: &[f64], height: f64, distance: usize) -> Vec<usize> {
    let candidates: Vec<usize> = local_maxima(values)
        .into_iter()
        .filter(|&i| values[i] >= height)
        .collect();

    if distance <= 1 {
        return candidates;
    }
    select_by_distance(&candidates, values, distance)
}

/// Split ascending peak indices into runs separated by at least `gap`
pub fn group_peaks(peaks: &[usize], gap: usize) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for &peak in peaks {
        match groups.last_mut() {
            Some(group) if group.last().is_some_and(|&prev| peak - prev < gap) => {
                group.push(peak)
            }
            _ => groups.push(vec![peak]),
        }
    }

    groups
}

/// Largest group, the earliest one when several share the largest size
pub fn select_group(groups: &[Vec<usize>]) -> Option<&[usize]> {
    groups
        .iter()
        .fold(None::<&Vec<usize>>, |best, group| match best {
            Some(current) if current.len() >= group.len() => Some(current),
            _ => Some(group),
        })
        .map(Vec::as_slice)
}

/// Onset sample index for a group's first peak
pub fn onset_index(first_peak: usize) -> usize {
    first_peak.saturating_sub(ONSET_LOOKBACK)
}

/// Peak-cluster onset estimator
#[derive(Debug, Clone, Copy, Default)]
pub struct EventLocalizer;

impl EventLocalizer {
    pub fn new() -> Self {
        Self
    }

    /// Estimate the onset time of the dominant event in `segment`
    ///
    /// # Errors
    /// `NoPeaksFound` if nothing clears the height threshold; callers must
    /// not confuse this with a negative detection.
    pub fn locate(&self, segment: &Segment) -> Result<f64, DetectionError> {
        let velocity = segment.velocity();
        let threshold = percentile(velocity, PEAK_PERCENTILE);
        let peaks = find_peaks(velocity, threshold, MIN_PEAK_DISTANCE);
        let groups = group_peaks(&peaks, GROUP_GAP);

        let group = select_group(&groups).ok_or(DetectionError::NoPeaksFound)?;
        let first_peak = *group.first().ok_or(DetectionError::NoPeaksFound)?;
        let index = onset_index(first_peak);

        log::debug!(
            "[EventLocalizer] threshold={:.3e} peaks={} groups={} selected_len={} onset_index={}",
            threshold,
            peaks.len(),
            groups.len(),
            group.len(),
            index
        );

        segment
            .time()
            .get(index)
            .copied()
            .ok_or(DetectionError::NoPeaksFound)
    }
}
