// SPDX-License-Identifier: MIT

//! The assembled, immutable workflow configuration the engine consumes
//! (spec.md §1, §3): task definitions keyed by namespace, plus the
//! platform table they reference.

use cylc_core::{Platform, PlatformName, TaskDefinition};
use indexmap::IndexMap;

/// A fully loaded workflow: its name, task namespace set, and platforms.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub name: String,
    pub tasks: IndexMap<String, TaskDefinition>,
    pub platforms: IndexMap<PlatformName, Platform>,
}

impl WorkflowConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), tasks: IndexMap::new(), platforms: IndexMap::new() }
    }

    pub fn task(&self, name: &str) -> Option<&TaskDefinition> {
        self.tasks.get(name)
    }

    pub fn platform(&self, name: &PlatformName) -> Option<&Platform> {
        self.platforms.get(name)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
