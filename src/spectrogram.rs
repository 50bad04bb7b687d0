// src/spectrogram.rs
//! STFT magnitude spectrogram (spec §4.B).

use rustfft::FftPlanner;
use rustfft::num_complex::Complex;
use std::f32::consts::PI;

use crate::config::{FFT_SIZE, HOP_SIZE};

/// Dense magnitude spectrogram, frame-major: `frames[t][f]`.
///
/// Invariant: every entry is `>= 0.0`.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    frames: Vec<Vec<f32>>,
    num_freq_bins: usize,
}

impl Spectrogram {
    /// Builds a spectrogram from raw frame-major magnitudes, bypassing the
    /// STFT. Used by tests that need exact control over the grid (e.g. a
    /// constant-valued spectrogram).
    #[cfg(test)]
    pub(crate) fn from_raw(frames: Vec<Vec<f32>>) -> Self {
        let num_freq_bins = frames.first().map_or(0, |f| f.len());
        Spectrogram {
            frames,
            num_freq_bins,
        }
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn num_freq_bins(&self) -> usize {
        self.num_freq_bins
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[inline]
    pub fn get(&self, t: usize, f: usize) -> f32 {
        self.frames[t][f]
    }

    pub fn frame(&self, t: usize) -> &[f32] {
        &self.frames[t]
    }

    pub fn frames(&self) -> &[Vec<f32>] {
        &self.frames
    }
}

// This function is only used by compute_with in this module, so it doesn't need to be pub
fn hann_window(window_size: usize) -> Vec<f32> {
    let mut window = Vec::with_capacity(window_size);
    if window_size == 0 {
        return window;
    }
    if window_size == 1 {
        window.push(1.0);
        return window;
    }
    for i in 0..window_size {
        window.push(0.5 * (1.0 - (2.0 * PI * i as f32 / (window_size - 1) as f32).cos()));
    }
    window
}

/// Computes the magnitude spectrogram of `samples` using the default
/// [`FFT_SIZE`]/[`HOP_SIZE`].
pub fn compute(samples: &[f32]) -> Spectrogram {
    compute_with(samples, FFT_SIZE, HOP_SIZE)
}

/// Computes the magnitude spectrogram with explicit window/hop sizes.
///
/// Frames are taken over `samples` symmetrically zero-padded by
/// `window_size / 2` on each side (the same boundary-extension convention
/// the reference STFT uses), so peak time indices stay stable regardless of
/// where in the signal the energy sits. An empty `samples` yields a
/// zero-wide spectrogram.
pub fn compute_with(samples: &[f32], window_size: usize, hop_size: usize) -> Spectrogram {
    let num_bins = window_size / 2 + 1;

    if samples.is_empty() || window_size == 0 || hop_size == 0 {
        return Spectrogram {
            frames: Vec::new(),
            num_freq_bins: num_bins,
        };
    }

    let pad = window_size / 2;
    let mut padded = Vec::with_capacity(samples.len() + 2 * pad);
    padded.resize(pad, 0.0);
    padded.extend_from_slice(samples);
    padded.resize(padded.len() + pad, 0.0);

    let num_frames = padded.len().saturating_sub(window_size) / hop_size + 1;

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(window_size);
    let window_values = hann_window(window_size); // Calls local hann_window
    let mut buffer: Vec<Complex<f32>> = vec![Complex::new(0.0, 0.0); window_size];
    let mut frames: Vec<Vec<f32>> = Vec::with_capacity(num_frames);

    for i in 0..num_frames {
        let start = i * hop_size;
        let end = (start + window_size).min(padded.len());
        let chunk = &padded[start..end];

        for (j, sample) in chunk.iter().enumerate() {
            buffer[j] = Complex::new(*sample * window_values[j], 0.0);
        }
        for slot in buffer.iter_mut().take(window_size).skip(chunk.len()) {
            *slot = Complex::new(0.0, 0.0);
        }

        fft.process(&mut buffer);

        let mut magnitudes: Vec<f32> = Vec::with_capacity(num_bins);
        for bin in buffer.iter().take(num_bins) {
            magnitudes.push(bin.norm());
        }
        frames.push(magnitudes);
    }

    Spectrogram {
        frames,
        num_freq_bins: num_bins,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_signal_yields_zero_wide_spectrogram() {
        let s = compute(&[]);
        assert_eq!(s.num_frames(), 0);
        assert!(s.is_empty());
    }

    #[test]
    fn all_entries_nonnegative() {
        let samples: Vec<f32> = (0..8192).map(|i| (i as f32 * 0.01).sin()).collect();
        let s = compute_with(&samples, 256, 128);
        for t in 0..s.num_frames() {
            for f in 0..s.num_freq_bins() {
                assert!(s.get(t, f) >= 0.0);
            }
        }
    }

    #[test]
    fn pure_tone_peaks_near_expected_bin() {
        let sample_rate = 8000.0f32;
        let freq = 1000.0f32;
        let window_size = 256;
        let samples: Vec<f32> = (0..4096)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate).sin())
            .collect();
        let s = compute_with(&samples, window_size, 128);
        let expected_bin = (freq / sample_rate * window_size as f32).round() as usize;
        let mid_frame = s.num_frames() / 2;
        let frame = s.frame(mid_frame);
        let (argmax, _) = frame
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap();
        assert!((argmax as isize - expected_bin as isize).abs() <= 1);
    }

    #[test]
    fn dimensions_match_spec_formula() {
        let window_size = 64;
        let hop_size = 32;
        let samples = vec![0.1f32; 1000];
        let s = compute_with(&samples, window_size, hop_size);
        let pad = window_size / 2;
        let padded_len = samples.len() + 2 * pad;
        let expected = (padded_len - window_size) / hop_size + 1;
        assert_eq!(s.num_frames(), expected);
        assert_eq!(s.num_freq_bins(), window_size / 2 + 1);
    }
}
