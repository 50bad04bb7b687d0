// src/facade.rs
//! Facade: stateless orchestration of spectrogram -> peaks -> hashes, and
//! of hashes against the store (spec §4.G).

use crate::config::Params;
use crate::error::Result;
use crate::hashing::{self, Fingerprint};
use crate::matcher::{self, MatchResult};
use crate::peaks;
use crate::spectrogram;
use crate::store::{IndexStore, SongId};

/// `fingerprint(signal) = hashes(peaks(spectrogram(signal)))`.
pub fn fingerprint(signal: &[f32], params: Params) -> Vec<Fingerprint> {
    let spec = spectrogram::compute(signal);
    let peaks = peaks::find_peaks(&spec, params.amp_threshold);
    hashing::create_hashes(&peaks, None)
}

/// `add(name, signal) = store.insert(name, fingerprint(signal))`.
pub fn add(
    store: &mut IndexStore,
    name: &str,
    signal: &[f32],
    params: Params,
) -> Result<SongId> {
    let hashes = fingerprint(signal, params);
    store.insert(name, &hashes)
}

/// `identify(signal) = matcher(fingerprint(signal), store)`.
pub fn identify(
    store: &IndexStore,
    signal: &[f32],
    params: Params,
) -> Result<Option<MatchResult>> {
    let hashes = fingerprint(signal, params);
    matcher::identify(&hashes, store)
}
