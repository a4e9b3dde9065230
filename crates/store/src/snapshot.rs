// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot persistence for crash recovery.
//!
//! A snapshot captures the complete [`MaterializedState`] at a WAL sequence
//! number. Recovery loads the snapshot, then replays WAL entries after that
//! sequence (see [`crate::Store::open`]).

use crate::state::MaterializedState;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot is schema version {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "v")]
    pub version: u32,
    /// WAL sequence number captured by this snapshot.
    pub seq: u64,
    pub state: MaterializedState,
    pub created_at_ms: u64,
}

impl Snapshot {
    pub fn new(seq: u64, state: MaterializedState, now_ms: u64) -> Self {
        Self { version: CURRENT_SNAPSHOT_VERSION, seq, state, created_at_ms: now_ms }
    }

    /// Write this snapshot to `path`, zstd-compressed, rotating the
    /// previous file into a `.bak` slot first.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        if path.exists() {
            let bak = rotate_bak_path(path);
            fs::rename(path, bak)?;
        }
        let json = serde_json::to_vec(self)?;
        let compressed = zstd::encode_all(json.as_slice(), 3)?;
        let tmp = path.with_extension("tmp");
        fs::File::create(&tmp)?.write_all(&compressed)?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>, SnapshotError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        let mut compressed = Vec::new();
        fs::File::open(path)?.read_to_end(&mut compressed)?;
        let json = zstd::decode_all(compressed.as_slice())?;
        let snapshot: Snapshot = serde_json::from_slice(&json)?;
        if snapshot.version != CURRENT_SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                found: snapshot.version,
                expected: CURRENT_SNAPSHOT_VERSION,
            });
        }
        Ok(Some(snapshot))
    }
}

const MAX_BAK_FILES: u32 = 3;

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out. Keeps
/// up to [`MAX_BAK_FILES`] backups, dropping the oldest at capacity.
fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }
    bak(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snap.zst");
        let snapshot = Snapshot::new(5, MaterializedState::default(), 1_000);
        snapshot.save(&path).unwrap();

        let loaded = Snapshot::load(&path).unwrap().unwrap();
        assert_eq!(loaded.seq, 5);
        assert_eq!(loaded.created_at_ms, 1_000);
    }

    #[test]
    fn load_missing_file_returns_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.zst");
        assert!(Snapshot::load(&path).unwrap().is_none());
    }

    #[test]
    fn save_rotates_previous_file_into_bak() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snap.zst");
        Snapshot::new(1, MaterializedState::default(), 0).save(&path).unwrap();
        Snapshot::new(2, MaterializedState::default(), 0).save(&path).unwrap();

        assert!(path.with_extension("bak").exists());
        let loaded = Snapshot::load(&path).unwrap().unwrap();
        assert_eq!(loaded.seq, 2);
    }
}
