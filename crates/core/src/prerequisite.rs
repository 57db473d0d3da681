// SPDX-License-Identifier: MIT

//! Prerequisites: OR-of-conjunctions over `(name, point, message)` triples
//! (spec.md §4.2).

use crate::cycle_point::CyclePoint;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single `(task name, cycle point, output message)` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrereqKey {
    pub name: String,
    pub point: CyclePoint,
    pub message: String,
}

impl PrereqKey {
    pub fn new(name: impl Into<String>, point: CyclePoint, message: impl Into<String>) -> Self {
        Self { name: name.into(), point, message: message.into() }
    }
}

/// A conjunction: satisfied iff every entry is satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Conjunction {
    entries: IndexMap<PrereqKey, bool>,
}

impl Conjunction {
    pub fn new(keys: impl IntoIterator<Item = PrereqKey>) -> Self {
        Self { entries: keys.into_iter().map(|k| (k, false)).collect() }
    }

    pub fn is_satisfied(&self) -> bool {
        self.entries.values().all(|&done| done)
    }

    pub fn keys(&self) -> impl Iterator<Item = &PrereqKey> {
        self.entries.keys()
    }

    /// Mark matching entries satisfied. Returns whether any entry changed.
    fn match_completed(&mut self, completed: &HashSet<PrereqKey>) -> bool {
        let mut changed = false;
        for (key, done) in self.entries.iter_mut() {
            if !*done && completed.contains(key) {
                *done = true;
                changed = true;
            }
        }
        changed
    }

    /// Operator output reset: set a specific entry back to unsatisfied.
    fn reset_entry(&mut self, key: &PrereqKey) -> bool {
        if let Some(done) = self.entries.get_mut(key) {
            let changed = *done;
            *done = false;
            changed
        } else {
            false
        }
    }
}

/// A prerequisite: satisfied iff any conjunction is satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Prerequisite {
    conjunctions: Vec<Conjunction>,
}

impl Prerequisite {
    pub fn new(conjunctions: Vec<Conjunction>) -> Self {
        Self { conjunctions }
    }

    pub fn is_satisfied(&self) -> bool {
        self.conjunctions.iter().any(Conjunction::is_satisfied)
    }

    pub fn conjunctions(&self) -> &[Conjunction] {
        &self.conjunctions
    }

    /// Match a tick's completed-outputs set against every unsatisfied
    /// conjunction. Idempotent and monotone: running this twice against the
    /// same `completed` set yields the same satisfied bits as once.
    pub fn match_completed(&mut self, completed: &HashSet<PrereqKey>) -> bool {
        let mut changed = false;
        for conj in &mut self.conjunctions {
            if conj.match_completed(completed) {
                changed = true;
            }
        }
        changed
    }

    /// Operator output reset.
    pub fn reset_entry(&mut self, key: &PrereqKey) -> bool {
        let mut changed = false;
        for conj in &mut self.conjunctions {
            if conj.reset_entry(key) {
                changed = true;
            }
        }
        changed
    }

    /// Every `(name, point)` this prerequisite references, for reload/graph
    /// validation (pool invariant 6).
    pub fn referenced_task_points(&self) -> impl Iterator<Item = (&str, &CyclePoint)> {
        self.conjunctions.iter().flat_map(|c| c.keys().map(|k| (k.name.as_str(), &k.point)))
    }
}

#[cfg(test)]
#[path = "prerequisite_tests.rs"]
mod tests;
