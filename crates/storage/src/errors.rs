// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to open write-ahead log at {path}: {source}")]
    Open { path: String, #[source] source: std::io::Error },
    #[error("failed to append to write-ahead log: {0}")]
    Append(#[source] std::io::Error),
    #[error("failed to encode event for the write-ahead log: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("malformed write-ahead log entry at line {line}: {source}")]
    Decode { line: usize, #[source] source: serde_json::Error },
}
