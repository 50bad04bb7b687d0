// src/hashing.rs
//! Combinatorial anchor/target hashing (spec §4.D).

use std::fmt;

use sha1::{Digest, Sha1};

use crate::config::{FAN_OUT, HASH_TOKEN_BYTES, ZONE_MAX, ZONE_MIN};
use crate::peaks::Peak; // Import Peak from our peaks module

/// Opaque, fixed-width hash token derived from `(f1, f2, Δt)`.
///
/// A newtype over a byte array rather than the reference's hex string (spec
/// §9, "Dynamic typing in the reference") — equality and storage operate on
/// the raw bytes; [`fmt::Display`] renders the hex form only for debug dumps.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashToken([u8; HASH_TOKEN_BYTES]);

impl HashToken {
    /// Builds the token deterministically from an anchor/target pair.
    /// Matches the reference's `sha1("f1|f2|dt").hexdigest()[:20]`, kept as
    /// raw bytes instead of hex text (same 80 bits of width).
    pub fn new(f1: usize, f2: usize, delta_t: i64) -> Self {
        let input = format!("{f1}|{f2}|{delta_t}");
        let digest = Sha1::digest(input.as_bytes());
        let mut bytes = [0u8; HASH_TOKEN_BYTES];
        bytes.copy_from_slice(&digest[..HASH_TOKEN_BYTES]);
        HashToken(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != HASH_TOKEN_BYTES {
            return None;
        }
        let mut out = [0u8; HASH_TOKEN_BYTES];
        out.copy_from_slice(bytes);
        Some(HashToken(out))
    }
}

impl fmt::Debug for HashToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashToken({self})")
    }
}

impl fmt::Display for HashToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// One emitted hash: `(H, t_anchor, song_id)` from spec §3 "Hash Record".
/// `song_id` is `None` for a query's transient hashes and `Some` once
/// attached to a catalog entry at ingest time.
#[derive(Debug, Clone, Copy)]
pub struct Fingerprint {
    pub hash: HashToken,
    pub anchor_time_idx: usize,
    pub song_id: Option<u32>,
}

/// Generates combinatorial hashes from a constellation of peaks.
///
/// Peaks are sorted ascending by time (ties broken by frequency bin) before
/// pairing, as required for determinism. For each anchor, subsequent peaks
/// within `[ZONE_MIN, ZONE_MAX]` frames are paired as targets, up to
/// [`FAN_OUT`] per anchor; the scan stops as soon as a target exceeds
/// `ZONE_MAX` since peaks are time-sorted.
pub fn create_hashes(peaks: &[Peak], song_id: Option<u32>) -> Vec<Fingerprint> {
    let mut sorted: Vec<Peak> = peaks.to_vec();
    sorted.sort_by(|a, b| {
        a.time_idx
            .cmp(&b.time_idx)
            .then(a.freq_bin_idx.cmp(&b.freq_bin_idx))
    });

    let mut fingerprints: Vec<Fingerprint> = Vec::new();

    if sorted.len() < 2 {
        log::debug!("create_hashes - fewer than 2 peaks, no pairs possible");
        return fingerprints;
    }

    for i in 0..sorted.len() {
        let anchor = &sorted[i];
        let mut accepted = 0usize;

        for target in &sorted[i + 1..] {
            if accepted >= FAN_OUT {
                break;
            }

            let delta_t = target.time_idx as i64 - anchor.time_idx as i64;
            if delta_t < ZONE_MIN {
                continue;
            }
            if delta_t > ZONE_MAX {
                break;
            }

            let hash = HashToken::new(anchor.freq_bin_idx, target.freq_bin_idx, delta_t);
            fingerprints.push(Fingerprint {
                hash,
                anchor_time_idx: anchor.time_idx,
                song_id,
            });
            accepted += 1;
        }
    }

    log::debug!(
        "create_hashes - generated {} fingerprints",
        fingerprints.len()
    );
    fingerprints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peaks::Peak;

    fn peak(t: usize, f: usize) -> Peak {
        Peak {
            time_idx: t,
            freq_bin_idx: f,
            magnitude: 1.0,
        }
    }

    #[test]
    fn single_peak_yields_no_hashes() {
        let peaks = vec![peak(10, 5)];
        assert!(create_hashes(&peaks, None).is_empty());
    }

    #[test]
    fn zero_delta_is_rejected() {
        let peaks = vec![peak(5, 1), peak(5, 2)];
        assert!(create_hashes(&peaks, None).is_empty());
    }

    #[test]
    fn delta_past_zone_max_is_rejected() {
        let peaks = vec![peak(0, 1), peak(201, 2)];
        assert!(create_hashes(&peaks, None).is_empty());
    }

    #[test]
    fn delta_at_zone_max_is_accepted() {
        let peaks = vec![peak(0, 1), peak(200, 2)];
        assert_eq!(create_hashes(&peaks, None).len(), 1);
    }

    #[test]
    fn fan_out_is_respected() {
        let mut peaks = vec![peak(0, 0)];
        for i in 1..=(FAN_OUT + 10) {
            peaks.push(peak(i, i));
        }
        let hashes = create_hashes(&peaks, None);
        let from_first_anchor = hashes.iter().filter(|h| h.anchor_time_idx == 0).count();
        assert_eq!(from_first_anchor, FAN_OUT);
    }

    #[test]
    fn deterministic_and_permutation_invariant() {
        let peaks = vec![peak(10, 3), peak(2, 1), peak(5, 9), peak(2, 4)];
        let mut shuffled = peaks.clone();
        shuffled.reverse();

        let a = create_hashes(&peaks, Some(7));
        let b = create_hashes(&shuffled, Some(7));

        let mut a_sorted: Vec<(Vec<u8>, usize)> = a
            .iter()
            .map(|fp| (fp.hash.as_bytes().to_vec(), fp.anchor_time_idx))
            .collect();
        let mut b_sorted: Vec<(Vec<u8>, usize)> = b
            .iter()
            .map(|fp| (fp.hash.as_bytes().to_vec(), fp.anchor_time_idx))
            .collect();
        a_sorted.sort();
        b_sorted.sort();
        assert_eq!(a_sorted, b_sorted);
    }

    #[test]
    fn bounded_by_fan_out_times_peak_count() {
        let peaks: Vec<Peak> = (0..30).map(|i| peak(i, i)).collect();
        let hashes = create_hashes(&peaks, None);
        assert!(hashes.len() <= FAN_OUT * peaks.len());
    }
}
