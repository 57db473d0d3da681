// SPDX-License-Identifier: MIT

//! The append-only event vocabulary persisted by the storage layer
//! (see `cylc-storage`, out of core's scope per spec.md §6). Every engine
//! state mutation worth surviving a restart is expressed as one of these so
//! a `MaterializedState` can be rebuilt by replaying the log.

use crate::cycle_point::CyclePoint;
use crate::task_state::TaskStatus;
use serde::{Deserialize, Serialize};

/// A task instance identity, the unit most events are keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskInstanceId {
    pub name: String,
    pub point: CyclePoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    ProxySpawned { id: TaskInstanceId, status: TaskStatus },
    ProxyRemoved { id: TaskInstanceId },
    StatusChanged { id: TaskInstanceId, status: TaskStatus },
    HeldChanged { id: TaskInstanceId, held: bool },
    OutputCompleted { id: TaskInstanceId, message: String },
    OutputReset { id: TaskInstanceId, message: String },
    SubmitNumIncremented { id: TaskInstanceId, submit_num: u32 },
    BroadcastPut { point: Option<CyclePoint>, namespace: String, path: String, value: serde_json::Value },
    BroadcastCleared { point: Option<CyclePoint>, namespace: String, path: String },
    CheckpointTaken { label: String },
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
