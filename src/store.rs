// src/store.rs
//! Inverted-index persistence: songs and fingerprint postings (spec §4.E).

use std::path::Path;

use log::{debug, info};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use crate::error::{FpError, Result};
use crate::hashing::Fingerprint;

pub type SongId = u32;

#[derive(Debug, Clone)]
pub struct Song {
    pub id: SongId,
    pub name: String,
}

/// One stored occurrence of a hash: `(song_id, t_db, t_query)`, the shape
/// `probe` needs to feed the matcher's Δ-histogram directly (spec §3
/// "Index Posting", §4.F step 3).
#[derive(Debug, Clone, Copy)]
pub struct Hit {
    pub song_id: SongId,
    pub t_db: i64,
    pub t_query: i64,
}

/// The Index Store: the only piece of state shared across requests (spec
/// §5). Owns the SQLite connection for the process lifetime rather than
/// reopening it per call (spec §9, "the source's ingest path re-opens the
/// store for every operation; implementations should feel free to keep a
/// single handle open").
pub struct IndexStore {
    conn: Connection,
}

impl IndexStore {
    /// Opens (creating if absent) the fingerprint database at `path` and
    /// ensures the schema exists.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")?;
        Self::init_schema(&conn)?;
        Ok(IndexStore { conn })
    }

    /// Opens an in-memory store, for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::init_schema(&conn)?;
        Ok(IndexStore { conn })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "BEGIN;
             CREATE TABLE IF NOT EXISTS songs (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 name TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS fingerprints (
                 hash BLOB NOT NULL,
                 song_id INTEGER NOT NULL,
                 t_anchor INTEGER NOT NULL,
                 FOREIGN KEY (song_id) REFERENCES songs(id)
             );
             CREATE INDEX IF NOT EXISTS idx_fingerprints_hash ON fingerprints (hash);
             COMMIT;",
        )?;
        Ok(())
    }

    /// Inserts a new song and all of its fingerprints as one atomic
    /// transaction: either both are visible afterward or neither is.
    /// An empty `hashes` slice is accepted (spec §7 `Empty`: ingest still
    /// creates the song row).
    pub fn insert(&mut self, name: &str, hashes: &[Fingerprint]) -> Result<SongId> {
        let tx = self.conn.transaction()?;
        tx.execute("INSERT INTO songs (name) VALUES (?1)", params![name])?;
        let song_id = tx.last_insert_rowid() as SongId;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO fingerprints (hash, song_id, t_anchor) VALUES (?1, ?2, ?3)",
            )?;
            for fp in hashes {
                stmt.execute(params![
                    fp.hash.as_bytes(),
                    song_id,
                    fp.anchor_time_idx as i64
                ])?;
            }
        }

        tx.commit()?;
        info!(
            "insert - song id={} name={:?} fingerprints={}",
            song_id,
            name,
            hashes.len()
        );
        Ok(song_id)
    }

    /// Looks up all stored postings for each query hash, pairing every hit
    /// with its query-side anchor time so the matcher can compute Δ without
    /// a second pass.
    pub fn probe(&self, query_hashes: &[Fingerprint]) -> Result<Vec<Hit>> {
        if query_hashes.is_empty() {
            return Ok(Vec::new());
        }

        let mut stmt = self
            .conn
            .prepare("SELECT song_id, t_anchor FROM fingerprints WHERE hash = ?1")?;

        let mut hits = Vec::new();
        for q in query_hashes {
            let rows = stmt.query_map(params![q.hash.as_bytes()], |row| {
                Ok((row.get::<_, i64>(0)? as SongId, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                let (song_id, t_db) = row?;
                hits.push(Hit {
                    song_id,
                    t_db,
                    t_query: q.anchor_time_idx as i64,
                });
            }
        }
        debug!("probe - {} query hashes -> {} hits", query_hashes.len(), hits.len());
        Ok(hits)
    }

    pub fn name(&self, id: SongId) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT name FROM songs WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(FpError::from)
    }

    pub fn list(&self) -> Result<Vec<(SongId, String)>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM songs ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)? as SongId, row.get(1)?))
        })?;
        let mut songs = Vec::new();
        for row in rows {
            songs.push(row?);
        }
        Ok(songs)
    }

    pub fn counts(&self) -> Result<(u64, u64)> {
        let n_songs: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM songs", [], |row| row.get(0))?;
        let n_fingerprints: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM fingerprints", [], |row| row.get(0))?;
        Ok((n_songs as u64, n_fingerprints as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::HashToken;

    fn fp(byte: u8, anchor: usize) -> Fingerprint {
        Fingerprint {
            hash: HashToken::new(byte as usize, byte as usize + 1, 10),
            anchor_time_idx: anchor,
            song_id: None,
        }
    }

    #[test]
    fn round_trip_insert_and_probe() {
        let mut store = IndexStore::open_in_memory().unwrap();
        let hashes = vec![fp(1, 0), fp(1, 0), fp(2, 5)];
        let id = store.insert("Song A", &hashes).unwrap();

        assert_eq!(store.name(id).unwrap().as_deref(), Some("Song A"));

        let hits = store.probe(&hashes).unwrap();
        // fp(1,0) appears twice in the inserted set, so probing with it once
        // must surface both postings.
        let dup_hits = hits.iter().filter(|h| h.t_db == 0).count();
        assert_eq!(dup_hits, 2);
        assert!(hits.iter().all(|h| h.song_id == id));
    }

    #[test]
    fn empty_hashes_still_creates_song() {
        let mut store = IndexStore::open_in_memory().unwrap();
        let id = store.insert("Silent", &[]).unwrap();
        assert_eq!(store.name(id).unwrap().as_deref(), Some("Silent"));
        let (n_songs, n_fps) = store.counts().unwrap();
        assert_eq!(n_songs, 1);
        assert_eq!(n_fps, 0);
    }

    #[test]
    fn two_inserts_get_disjoint_ids() {
        let mut store = IndexStore::open_in_memory().unwrap();
        let hashes = vec![fp(3, 0)];
        let id1 = store.insert("One", &hashes).unwrap();
        let id2 = store.insert("Two", &hashes).unwrap();
        assert_ne!(id1, id2);
    }

    #[test]
    fn list_is_ordered_by_id() {
        let mut store = IndexStore::open_in_memory().unwrap();
        store.insert("A", &[]).unwrap();
        store.insert("B", &[]).unwrap();
        let songs = store.list().unwrap();
        assert_eq!(songs.len(), 2);
        assert!(songs[0].0 < songs[1].0);
    }

    #[test]
    fn probe_on_empty_store_returns_empty() {
        let store = IndexStore::open_in_memory().unwrap();
        let hits = store.probe(&[fp(9, 0)]).unwrap();
        assert!(hits.is_empty());
    }
}
