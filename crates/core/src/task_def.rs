// SPDX-License-Identifier: MIT

//! Immutable task definitions (spec.md §3): the per-namespace template a
//! [`crate::task_proxy::TaskProxy`] is instantiated from at a cycle point.

use crate::cycle_point::CycleOffset;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One entry of a prerequisite conjunction, as declared in the graph: a
/// reference to another task's output, offset from the owning task's point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrereqEntryTemplate {
    pub task_name: String,
    pub offset: CycleOffset,
    pub message: String,
}

/// A conjunction of prerequisite entries, all of which must be satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PrereqConjunctionTemplate {
    pub entries: Vec<PrereqEntryTemplate>,
}

/// Default queue name when a task declares none.
pub const DEFAULT_QUEUE: &str = "default";

/// Event handler configuration (spec.md §4.11): handler command templates
/// keyed by event name, plus the retry schedule every handler invocation
/// shares and the mail-coalescing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventsConfig {
    pub handlers: IndexMap<String, Vec<String>>,
    pub handler_retry_delays: Vec<Duration>,
    pub mail_events: Vec<String>,
    pub mail_interval: Duration,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            handlers: IndexMap::new(),
            handler_retry_delays: Vec::new(),
            mail_events: Vec::new(),
            mail_interval: Duration::from_secs(300),
        }
    }
}

/// Runtime configuration: everything that shapes how a job is built and
/// retried, independent of any particular instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub script: Option<String>,
    pub env: IndexMap<String, String>,
    pub directives: IndexMap<String, String>,
    pub submission_retry_delays: Vec<Duration>,
    pub execution_retry_delays: Vec<Duration>,
    pub platform: Option<String>,
    pub execution_time_limit: Option<Duration>,
    pub events: EventsConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            script: None,
            env: IndexMap::new(),
            directives: IndexMap::new(),
            submission_retry_delays: Vec::new(),
            execution_retry_delays: Vec::new(),
            platform: None,
            execution_time_limit: None,
            events: EventsConfig::default(),
        }
    }
}

/// An immutable task definition: name, recurrence, dependencies, and
/// runtime configuration. One per workflow namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub name: String,
    pub sequences: Vec<crate::sequence::Sequence>,
    /// Prerequisites: OR of conjunctions, each a set of offset output refs.
    pub prerequisites: Vec<PrereqConjunctionTemplate>,
    pub suicide_prerequisites: Vec<PrereqConjunctionTemplate>,
    /// Declared non-standard outputs, `(label, message)`, in graph order.
    pub outputs: Vec<(String, String)>,
    pub runtime: RuntimeConfig,
    /// Offset from point at which a clock xtrigger is satisfied.
    pub clock_offset: Option<CycleOffset>,
    /// Offset from point past which the task, if still waiting, expires.
    pub expire_offset: Option<CycleOffset>,
    pub spawn_ahead: bool,
    pub queue: String,
}

impl TaskDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sequences: Vec::new(),
            prerequisites: Vec::new(),
            suicide_prerequisites: Vec::new(),
            outputs: Vec::new(),
            runtime: RuntimeConfig::default(),
            clock_offset: None,
            expire_offset: None,
            spawn_ahead: false,
            queue: DEFAULT_QUEUE.to_string(),
        }
    }

    /// The declared output messages, for [`crate::outputs::Outputs::new`].
    pub fn output_messages(&self) -> impl Iterator<Item = String> + '_ {
        self.outputs.iter().map(|(_, message)| message.clone())
    }
}

#[cfg(test)]
#[path = "task_def_tests.rs"]
mod tests;
