//! Error kinds for the fingerprinting core (spec §7).

use std::path::PathBuf;

use thiserror::Error;

/// Failure modes surfaced by the core. "No match" is *not* one of these —
/// it is a normal `Option::None` return from the matcher.
#[derive(Debug, Error)]
pub enum FpError {
    #[error("could not read or decode audio file {path}: {message}")]
    InvalidInput { path: PathBuf, message: String },

    #[error("fingerprint store error: {0}")]
    StoreIo(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, FpError>;
