// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("platform {0:?} has no registered batch system {1:?}")]
    UnknownBatchSystem(String, String),
    #[error("subprocess {cmd_key:?} failed to start: {source}")]
    Spawn { cmd_key: String, #[source] source: std::io::Error },
}
