// SPDX-License-Identifier: MIT

//! Per-task output completion tracking (spec.md §4.2).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The standard output messages every task carries regardless of its
/// declared outputs, auto-inserted when a task proxy is constructed.
pub const STANDARD_MESSAGES: &[&str] =
    &["submitted", "started", "succeeded", "failed", "submit-failed", "expired"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown output message: {0}")]
pub struct UnknownOutput(pub String);

/// Insertion-ordered map of output message → completed?.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outputs {
    messages: IndexMap<String, bool>,
}

impl Outputs {
    /// Build from a task definition's declared `(label, message)` outputs,
    /// auto-inserting the standard messages first.
    pub fn new(declared: impl IntoIterator<Item = String>) -> Self {
        let mut messages = IndexMap::new();
        for std_msg in STANDARD_MESSAGES {
            messages.insert((*std_msg).to_string(), false);
        }
        for msg in declared {
            messages.entry(msg).or_insert(false);
        }
        Self { messages }
    }

    pub fn is_known(&self, message: &str) -> bool {
        self.messages.contains_key(message)
    }

    /// Mark `message` completed/incomplete. Fails if `message` was never
    /// declared (including the standard set).
    pub fn set_completed(&mut self, message: &str, completed: bool) -> Result<(), UnknownOutput> {
        match self.messages.get_mut(message) {
            Some(slot) => {
                *slot = completed;
                Ok(())
            }
            None => Err(UnknownOutput(message.to_string())),
        }
    }

    pub fn is_completed(&self, message: &str) -> bool {
        self.messages.get(message).copied().unwrap_or(false)
    }

    pub fn all_completed(&self) -> bool {
        self.messages.values().all(|&done| done)
    }

    /// Messages completed so far, in declaration order.
    pub fn completed_messages(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().filter(|(_, &done)| done).map(|(m, _)| m.as_str())
    }
}

#[cfg(test)]
#[path = "outputs_tests.rs"]
mod tests;
