// SPDX-License-Identifier: MIT

//! An append-only JSON-lines write-ahead log of [`Event`]s, and replay into
//! a fresh [`MaterializedState`] at startup.

use crate::errors::StorageError;
use crate::state::{apply, MaterializedState};
use cylc_core::event::Event;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A durable event log backing a [`MaterializedState`].
pub struct Wal {
    path: PathBuf,
    file: File,
}

impl Wal {
    /// Open (creating if absent) the log at `path` for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| StorageError::Open { path: path.display().to_string(), source })?;
        Ok(Self { path, file })
    }

    /// Append one event, flushing before returning so a crash immediately
    /// after this call can't lose it.
    pub fn append(&mut self, event: &Event) -> Result<(), StorageError> {
        let line = serde_json::to_string(event).map_err(StorageError::Encode)?;
        writeln!(self.file, "{line}").map_err(StorageError::Append)?;
        self.file.flush().map_err(StorageError::Append)?;
        debug!(path = %self.path.display(), "appended event to write-ahead log");
        Ok(())
    }

    /// Rebuild a [`MaterializedState`] by replaying every event in the log
    /// in order. A malformed trailing line (a crash mid-write) is logged at
    /// warning and the replay stops there rather than failing outright.
    pub fn replay(path: impl AsRef<Path>) -> Result<MaterializedState, StorageError> {
        let path = path.as_ref();
        let mut state = MaterializedState::new();
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(state),
            Err(source) => {
                return Err(StorageError::Open { path: path.display().to_string(), source })
            }
        };
        let reader = BufReader::new(file);
        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(StorageError::Append)?;
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Event>(&line) {
                Ok(event) => apply(&mut state, &event),
                Err(source) => {
                    warn!(line = line_num + 1, %source, "truncated write-ahead log, stopping replay");
                    break;
                }
            }
        }
        Ok(state)
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
