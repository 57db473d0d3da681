// SPDX-License-Identifier: MIT

//! Crate-wide error aggregation (spec.md §7's input-validation taxonomy).

use crate::cycle_point::{BadPoint, BadSequence};
use crate::outputs::UnknownOutput;
use thiserror::Error;

/// Errors surfaced to a command-queue caller without mutating engine state.
#[derive(Debug, Error)]
pub enum InputError {
    #[error(transparent)]
    BadPoint(#[from] BadPoint),
    #[error(transparent)]
    BadSequence(#[from] BadSequence),
    #[error(transparent)]
    UnknownOutput(#[from] UnknownOutput),
    #[error("unknown task name: {0}")]
    UnknownTaskName(String),
    #[error("bad workflow id: {0}")]
    BadWorkflowId(String),
    #[error("bad glob pattern: {0}")]
    BadGlob(String),
}
