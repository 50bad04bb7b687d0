// src/main.rs
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use fpmatch::config::Params;
use fpmatch::store::IndexStore;
use fpmatch::{audio, facade};

use cli::{Cli, Command, RECOGNIZED_EXTENSIONS};

mod cli;

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Add { filepath, name } => add_song(&cli.db, &filepath, name.as_deref()),
        Command::AddDir { directory } => add_dir(&cli.db, &directory),
        Command::Identify { filepath } => identify(&cli.db, &filepath),
        Command::List => list(&cli.db),
    }
}

fn open_store(db: &Path) -> Result<IndexStore> {
    IndexStore::open(db).with_context(|| format!("opening database {}", db.display()))
}

fn add_song(db: &Path, filepath: &Path, name: Option<&str>) -> Result<()> {
    let mut store = open_store(db)?;
    let display_name = name.map(str::to_owned).unwrap_or_else(|| stem(filepath));

    let samples = audio::load(filepath)?;
    let song_id = facade::add(&mut store, &display_name, &samples, Params::default())?;
    println!("Added: {display_name} (id={song_id})");
    Ok(())
}

fn add_dir(db: &Path, directory: &Path) -> Result<()> {
    let mut store = open_store(db)?;

    let mut files: Vec<_> = std::fs::read_dir(directory)
        .with_context(|| format!("reading directory {}", directory.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| RECOGNIZED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    files.sort();

    if files.is_empty() {
        println!("No audio files found in {}", directory.display());
        return Ok(());
    }

    let count = files.len();
    for filepath in &files {
        let display_name = stem(filepath);
        let samples = audio::load(filepath)?;
        let song_id = facade::add(&mut store, &display_name, &samples, Params::default())?;
        println!("Added: {display_name} (id={song_id})");
        info!(
            "add-dir - ingested {} as song id {}",
            filepath.display(),
            song_id
        );
    }
    println!("\nAdded {count} songs");
    Ok(())
}

fn identify(db: &Path, filepath: &Path) -> Result<()> {
    let store = open_store(db)?;
    let samples = audio::load(filepath)?;

    match facade::identify(&store, &samples, Params::default())? {
        Some(result) => {
            println!("Match: {}", result.song_name);
            println!("Confidence: {:.1}%", result.confidence * 100.0);
            println!("Aligned matches: {}", result.aligned_matches);
        }
        None => println!("No match found"),
    }
    Ok(())
}

fn list(db: &Path) -> Result<()> {
    let store = open_store(db)?;
    let songs = store.list()?;

    if songs.is_empty() {
        println!("No songs in database");
        return Ok(());
    }

    for (id, name) in &songs {
        println!("  {id}: {name}");
    }

    let (n_songs, n_fingerprints) = store.counts()?;
    println!("\nTotal: {n_songs} songs, {n_fingerprints} fingerprints");
    Ok(())
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}
