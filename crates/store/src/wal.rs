// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log: a durable, ordered, append-only record of every [`Op`]
//! the control plane has accepted. Encoded as JSON Lines so a truncated
//! final line (crash mid-write) is detectable and simply dropped on replay.

use crate::op::Op;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("wal io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("wal entry corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub op: Op,
}

/// Append-only log backed by a single JSON-Lines file.
pub struct Wal {
    path: PathBuf,
    writer: BufWriter<File>,
    write_seq: u64,
    processed_seq: u64,
    read_pos: u64,
}

impl Wal {
    /// Open (creating if absent) the log at `path`. `processed_seq` is the
    /// watermark from the last loaded snapshot: entries at or below it are
    /// skipped by [`Wal::next_unprocessed`].
    pub fn open(path: impl AsRef<Path>, processed_seq: u64) -> Result<Self, WalError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).read(true).open(&path)?;

        let mut write_seq = 0u64;
        let mut read_pos = 0u64;
        let mut reader = BufReader::new(File::open(&path)?);
        let mut line = String::new();
        loop {
            line.clear();
            let consumed = reader.read_line(&mut line)?;
            if consumed == 0 {
                break;
            }
            let Ok(entry) = serde_json::from_str::<WalEntry>(line.trim_end()) else {
                // Truncated final line from a crash mid-write; stop here.
                break;
            };
            write_seq = entry.seq;
            if entry.seq <= processed_seq {
                read_pos += consumed as u64;
            }
        }

        Ok(Self { path, writer: BufWriter::new(file), write_seq, processed_seq, read_pos })
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    /// Append `op`, returning its assigned sequence number. Not flushed to
    /// disk until [`Wal::flush`] is called.
    pub fn append(&mut self, op: &Op) -> Result<u64, WalError> {
        self.write_seq += 1;
        let entry = WalEntry { seq: self.write_seq, op: op.clone() };
        let line = serde_json::to_string(&entry)?;
        writeln!(self.writer, "{line}")?;
        Ok(entry.seq)
    }

    pub fn flush(&mut self) -> Result<(), WalError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Read the next entry past the current processed watermark, if any.
    pub fn next_unprocessed(&mut self) -> Result<Option<WalEntry>, WalError> {
        let mut reader = BufReader::new(File::open(&self.path)?);
        reader.seek(SeekFrom::Start(self.read_pos))?;
        let mut line = String::new();
        let consumed = reader.read_line(&mut line)?;
        if consumed == 0 {
            return Ok(None);
        }
        let entry: WalEntry = serde_json::from_str(line.trim_end())?;
        self.read_pos += consumed as u64;
        Ok(Some(entry))
    }

    pub fn mark_processed(&mut self, seq: u64) {
        self.processed_seq = self.processed_seq.max(seq);
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
