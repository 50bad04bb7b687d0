// src/cli.rs
//! CLI surface (spec §6): `add`, `add-dir`, `identify`, `list`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Shazam-style audio fingerprinting and identification.
#[derive(Parser, Debug)]
#[command(name = "fpmatch", version, about)]
pub struct Cli {
    /// Database file path.
    #[arg(long, global = true, default_value = "fingerprints.db")]
    pub db: PathBuf,

    /// Enable verbose (info-level) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ingest one audio file.
    Add {
        /// Path to audio file.
        filepath: PathBuf,
        /// Song name (default: filename stem).
        #[arg(long)]
        name: Option<String>,
    },
    /// Ingest every recognized audio file in a directory (non-recursive).
    AddDir {
        /// Path to directory.
        directory: PathBuf,
    },
    /// Identify a song from an audio sample.
    Identify {
        /// Path to audio sample.
        filepath: PathBuf,
    },
    /// List all songs in the database.
    List,
}

/// Extensions recognized by `add-dir` (spec §6).
pub const RECOGNIZED_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "m4a", "ogg"];
