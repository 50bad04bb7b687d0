// src/matcher.rs
//! Time-coherent alignment scoring (spec §4.F).

use std::collections::HashMap;

use log::debug;

use crate::config::MIN_MATCHES;
use crate::hashing::Fingerprint;
use crate::store::{IndexStore, SongId};

/// Result of a successful identification.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub song_id: SongId,
    pub song_name: String,
    pub confidence: f64,
    pub aligned_matches: usize,
}

/// Identifies `query_hashes` against `store` by voting over `(song_id, Δ)`
/// where `Δ = t_db - t_query`. Pure and total given a working store: every
/// failure mode is "no match", never an error (spec §4.F step 1-2, §7).
pub fn identify(query_hashes: &[Fingerprint], store: &IndexStore) -> crate::error::Result<Option<MatchResult>> {
    if query_hashes.is_empty() {
        debug!("identify - empty query, no match");
        return Ok(None);
    }

    let hits = store.probe(query_hashes)?;
    if hits.is_empty() {
        debug!("identify - no hits for any query hash, no match");
        return Ok(None);
    }

    let mut votes: HashMap<(SongId, i64), usize> = HashMap::new();
    for hit in &hits {
        let delta = hit.t_db - hit.t_query;
        *votes.entry((hit.song_id, delta)).or_insert(0) += 1;
    }

    // Tie-break deterministically: highest count, then smallest song_id,
    // then smallest Δ (spec §4.F step 4 permits any deterministic rule).
    let best = votes
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .map(|(&key, &count)| (key, count));

    let ((best_song_id, best_delta), best_count) = match best {
        Some(v) => v,
        None => return Ok(None),
    };
    debug!(
        "identify - best alignment song_id={} delta={} count={}",
        best_song_id, best_delta, best_count
    );

    if best_count < MIN_MATCHES {
        debug!(
            "identify - best count {} below MIN_MATCHES {}",
            best_count, MIN_MATCHES
        );
        return Ok(None);
    }

    let name = match store.name(best_song_id)? {
        Some(n) => n,
        None => return Ok(None),
    };

    Ok(Some(MatchResult {
        song_id: best_song_id,
        song_name: name,
        confidence: best_count as f64 / query_hashes.len() as f64,
        aligned_matches: best_count,
    }))
}
