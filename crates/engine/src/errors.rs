// SPDX-License-Identifier: MIT

//! One `thiserror` enum per error-taxonomy bucket (spec.md §7), rather
//! than one big enum — each bucket has a distinct propagation rule
//! (escalate to `submit-failed`, retry-next-platform, log-and-skip, …)
//! and callers should be able to match on the bucket they care about.

use thiserror::Error;

pub use cylc_core::InputError;

#[derive(Debug, Error)]
pub enum PlatformLookupError {
    #[error("no platform named {0:?} is configured")]
    UnknownPlatform(String),
    #[error("no batch system named {0:?} is registered")]
    UnknownBatchSystem(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Ssh(#[from] cylc_adapters::SshError),
    #[error("install target {0:?} failed on every platform")]
    TargetExhausted(String),
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed submit-summary line: {0:?}")]
    MalformedSummary(String),
    #[error("malformed poll line: {0:?}")]
    MalformedPoll(String),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Storage(#[from] cylc_storage::errors::StorageError),
}

/// A late/duplicate/unknown-submit-num message: logged, not propagated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedIgnored {
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum FatalError {
    #[error("workflow {0:?} has a live scheduler; refusing to clean")]
    WorkflowRunning(String),
    #[error("clean pattern {0:?} would escape the run directory")]
    BadGlob(String),
}

#[derive(Debug, Error)]
pub enum CleanError {
    #[error(transparent)]
    Fatal(#[from] FatalError),
    #[error("filesystem error on {path:?}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("remote clean failed on install target(s): {0:?}")]
    RemoteCleanFailed(Vec<String>),
}
