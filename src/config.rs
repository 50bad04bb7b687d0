//! Tunable constants of the reference design (spec §6).
//!
//! These default to the reference values and are what the facade uses when
//! no per-call [`Params`] override is given.

/// Fixed sample rate the core operates at, Hz.
pub const SAMPLE_RATE: u32 = 44_100;

/// STFT window size (FFT size), in samples.
pub const FFT_SIZE: usize = 4096;

/// STFT hop size, in samples (50% overlap at the default FFT_SIZE).
pub const HOP_SIZE: usize = 2048;

/// Side length of the square neighborhood used by the peak-picker's max
/// filter.
pub const NEIGHBORHOOD: usize = 20;

/// Minimum allowed anchor-target time delta, in frames.
pub const ZONE_MIN: i64 = 1;

/// Maximum allowed anchor-target time delta, in frames.
pub const ZONE_MAX: i64 = 200;

/// Maximum number of targets paired with one anchor.
pub const FAN_OUT: usize = 15;

/// Minimum aligned-hash count for a match to be reported.
pub const MIN_MATCHES: usize = 5;

/// Number of bytes kept from the SHA-1 digest used to build a hash token
/// (80 bits, matching the reference implementation's 20 hex characters).
pub const HASH_TOKEN_BYTES: usize = 10;

/// Per-call overrides of the tunables above. `None` fields fall back to the
/// defaults in this module. Threshold override corresponds to spec §4.C
/// step 3 ("If an override is supplied, use it").
#[derive(Debug, Clone, Copy, Default)]
pub struct Params {
    /// Absolute peak-amplitude threshold override (τ). When `None`,
    /// τ = mean(S) + 2·std(S) is computed per spectrogram.
    pub amp_threshold: Option<f32>,
}
