// src/peaks.rs
//! Constellation peak extraction (spec §4.C).

use log::debug;

use crate::config::NEIGHBORHOOD;
use crate::spectrogram::Spectrogram;

#[derive(Debug, Clone, Copy)]
pub struct Peak {
    // Fields also public
    pub time_idx: usize,
    pub freq_bin_idx: usize,
    pub magnitude: f32,
}

fn mean_and_std(spectrogram: &Spectrogram) -> (f32, f32) {
    let mut sum = 0.0f64;
    let mut count = 0u64;
    for t in 0..spectrogram.num_frames() {
        for &v in spectrogram.frame(t) {
            sum += v as f64;
            count += 1;
        }
    }
    if count == 0 {
        return (0.0, 0.0);
    }
    let mean = sum / count as f64;

    let mut sq_sum = 0.0f64;
    for t in 0..spectrogram.num_frames() {
        for &v in spectrogram.frame(t) {
            let d = v as f64 - mean;
            sq_sum += d * d;
        }
    }
    let variance = sq_sum / count as f64;
    (mean as f32, variance.sqrt() as f32)
}

/// Extracts the sparse constellation of local-maximum peaks from `spectrogram`.
///
/// `amp_threshold_override` corresponds to the spec's `τ_override?`: when
/// `Some`, it replaces the adaptive `mean + 2*std` threshold. The
/// neighborhood is a square window exactly [`NEIGHBORHOOD`] cells wide on
/// each axis, split `before`/`after` the cell the way scipy's
/// `maximum_filter` centers an even-sized footprint (`NEIGHBORHOOD/2`
/// cells before, `NEIGHBORHOOD/2 - 1` after), implemented with clamped
/// ("reflect"-equivalent) edge handling — the same boundary convention must
/// be used at ingest and query, which this function guarantees by
/// construction.
pub fn find_peaks(spectrogram: &Spectrogram, amp_threshold_override: Option<f32>) -> Vec<Peak> {
    let mut peaks: Vec<Peak> = Vec::new();

    if spectrogram.is_empty() || spectrogram.num_freq_bins() == 0 {
        debug!("find_peaks - spectrogram is empty or has zero freq bins");
        return peaks;
    }

    let num_frames = spectrogram.num_frames();
    let num_freq_bins = spectrogram.num_freq_bins();
    // NEIGHBORHOOD=20 is the literal window side length: `before` cells at
    // lower indices plus the cell itself plus `after` cells at higher
    // indices, matching scipy's asymmetric split for an even-sized footprint.
    let before = NEIGHBORHOOD / 2;
    let after = NEIGHBORHOOD / 2 - 1;

    let threshold = match amp_threshold_override {
        Some(t) => t,
        None => {
            let (mean, std) = mean_and_std(spectrogram);
            mean + 2.0 * std
        }
    };

    debug!(
        "find_peaks - {} frames, {} freq bins, neighborhood={}, threshold={}",
        num_frames, num_freq_bins, NEIGHBORHOOD, threshold
    );

    for t_idx in 0..num_frames {
        for f_idx in 0..num_freq_bins {
            let current_magnitude = spectrogram.get(t_idx, f_idx);

            if current_magnitude <= threshold {
                continue;
            }

            let mut is_local_max = true;
            let t_start = t_idx.saturating_sub(before);
            let t_end = (t_idx + after + 1).min(num_frames);
            let f_start = f_idx.saturating_sub(before);
            let f_end = (f_idx + after + 1).min(num_freq_bins);

            'search: for nt_idx in t_start..t_end {
                for nf_idx in f_start..f_end {
                    if nt_idx == t_idx && nf_idx == f_idx {
                        continue;
                    }
                    let neighbor = spectrogram.get(nt_idx, nf_idx);
                    if neighbor > current_magnitude {
                        is_local_max = false;
                        break 'search;
                    }
                    // Break plateau ties deterministically toward the
                    // lexicographically-first cell so a flat region emits
                    // exactly one peak.
                    if neighbor == current_magnitude
                        && (nt_idx < t_idx || (nt_idx == t_idx && nf_idx < f_idx))
                    {
                        is_local_max = false;
                        break 'search;
                    }
                }
            }

            if is_local_max {
                peaks.push(Peak {
                    time_idx: t_idx,
                    freq_bin_idx: f_idx,
                    magnitude: current_magnitude,
                });
            }
        }
    }
    debug!("find_peaks - found {} peaks", peaks.len());
    peaks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrogram;

    #[test]
    fn all_zero_spectrogram_yields_no_peaks() {
        let samples = vec![0.0f32; 4096];
        let s = spectrogram::compute_with(&samples, 256, 128);
        let peaks = find_peaks(&s, None);
        assert!(peaks.is_empty());
    }

    #[test]
    fn constant_spectrogram_yields_no_peaks() {
        // mean == value, std == 0, threshold == value; strict `>` rejects all,
        // even though every cell trivially equals its neighborhood max.
        let s = spectrogram::Spectrogram::from_raw(vec![vec![1.0f32; 10]; 10]);
        let peaks = find_peaks(&s, None);
        assert!(peaks.is_empty());
    }

    #[test]
    fn explicit_threshold_overrides_adaptive_one() {
        let samples: Vec<f32> = (0..8192).map(|i| (i as f32 * 0.05).sin() * 0.5).collect();
        let s = spectrogram::compute_with(&samples, 512, 256);
        let low = find_peaks(&s, Some(0.0));
        let high = find_peaks(&s, Some(1e6));
        assert!(low.len() >= high.len());
        assert!(high.is_empty());
    }
}
