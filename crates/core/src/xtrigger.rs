// SPDX-License-Identifier: MIT

//! External trigger evaluation and caching (spec.md §4.6).
//!
//! Xtriggers are opaque, keyed by a cache key derived from their function
//! name and arguments: two tasks referencing the same function call with the
//! same arguments in the same cycle share one evaluation per tick. Clock
//! xtriggers are evaluated in-process against wall time; everything else is
//! evaluated out-of-process (the engine layer dispatches that as an effect
//! and feeds the result back through [`XtriggerManager::record_result`]).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// A task-local reference to a registered xtrigger: the label it's known by
/// within the task definition.
pub type XtriggerLabel = String;

/// An xtrigger's identity for caching/dedup purposes: function name plus its
/// rendered argument list. Two specs with the same key are the same call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct XtriggerCacheKey {
    pub func_name: String,
    pub args: Vec<String>,
}

/// What a task declares about one of its xtriggers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum XtriggerSpec {
    /// A user-defined function, evaluated out-of-process.
    Function { cache_key: XtriggerCacheKey },
    /// A clock trigger: satisfied once `point + offset <= now`.
    Clock { offset_seconds: i64 },
}

/// The cached outcome of evaluating a function xtrigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XtriggerResult {
    pub satisfied: bool,
    /// Arbitrary data the function returned, made available to dependent
    /// tasks' environments.
    pub data: serde_json::Value,
}

/// Tracks function-xtrigger results across a tick and across tasks that
/// share a cache key.
#[derive(Debug, Default)]
pub struct XtriggerManager {
    cache: IndexMap<XtriggerCacheKey, XtriggerResult>,
}

impl XtriggerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the unique set of function xtriggers that need evaluating this
    /// tick: those referenced by at least one unsatisfied proxy and not
    /// already cached.
    pub fn collate<'a>(
        &self,
        pending: impl IntoIterator<Item = &'a XtriggerCacheKey>,
    ) -> Vec<XtriggerCacheKey> {
        let mut seen = IndexMap::new();
        for key in pending {
            if !self.cache.contains_key(key) {
                seen.entry(key.clone()).or_insert(());
            }
        }
        seen.into_keys().collect()
    }

    /// Record the outcome of an out-of-process evaluation.
    pub fn record_result(&mut self, key: XtriggerCacheKey, result: XtriggerResult) {
        self.cache.insert(key, result);
    }

    pub fn result(&self, key: &XtriggerCacheKey) -> Option<&XtriggerResult> {
        self.cache.get(key)
    }

    /// Drop cached results once every dependent proxy has consumed them
    /// (called after a tick's prerequisite match pass).
    pub fn clear_consumed(&mut self, keys: impl IntoIterator<Item = XtriggerCacheKey>) {
        for key in keys {
            self.cache.shift_remove(&key);
        }
    }
}

/// Evaluate a clock xtrigger in-process: satisfied once `due` has passed.
pub fn satisfy_clock(due: Instant, now: Instant) -> bool {
    now >= due
}

#[cfg(test)]
#[path = "xtrigger_tests.rs"]
mod tests;
