// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunbookError {
    #[error("failed to parse workflow definition: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("task {0:?} declares a prerequisite on unknown task {1:?}")]
    UnknownPrerequisiteTask(String, String),
    #[error("task {0:?} has no scheduling sequence")]
    MissingSequence(String),
    #[error("malformed prerequisite entry {0:?} on task {1:?}")]
    BadPrereqEntry(String, String),
    #[error("bad cycle point in task {task:?}: {source}")]
    BadCyclePoint { task: String, #[source] source: cylc_core::cycle_point::BadPoint },
    #[error("bad cycle offset or sequence step in task {task:?}: {source}")]
    BadOffset { task: String, #[source] source: cylc_core::cycle_point::BadSequence },
}
