// SPDX-License-Identifier: MIT

//! The materialized view rebuilt by replaying the event log.

use cylc_core::event::{Event, TaskInstanceId};
use cylc_core::TaskStatus;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as SettingValue;

/// The persisted subset of a task instance's state: enough to rebuild a
/// `TaskProxy`'s lifecycle-relevant fields, not its transient timers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub status: TaskStatus,
    pub held: bool,
    pub submit_num: u32,
    pub completed_messages: Vec<String>,
}

impl TaskRecord {
    fn spawned(status: TaskStatus) -> Self {
        Self { status, held: false, submit_num: 0, completed_messages: Vec::new() }
    }
}

/// A broadcast record's key, mirroring `cylc_core::broadcast::BroadcastManager`
/// but in a form serializable as a flat map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BroadcastRecordKey {
    pub point: Option<String>,
    pub namespace: String,
    pub path: String,
}

/// Event-sourced state: task/job rows and the platform sets the out-of-scope
/// persistence contract in spec.md §1 calls for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterializedState {
    tasks: IndexMap<TaskInstanceId, TaskRecord>,
    broadcasts: IndexMap<BroadcastRecordKey, SettingValue>,
    platform_sets: IndexMap<String, Vec<String>>,
    checkpoints: Vec<String>,
}

impl MaterializedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task(&self, id: &TaskInstanceId) -> Option<&TaskRecord> {
        self.tasks.get(id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = (&TaskInstanceId, &TaskRecord)> {
        self.tasks.iter()
    }

    pub fn broadcasts(&self) -> impl Iterator<Item = (&BroadcastRecordKey, &SettingValue)> {
        self.broadcasts.iter()
    }

    pub fn checkpoints(&self) -> &[String] {
        &self.checkpoints
    }

    /// Platform sets are upserted directly by the caller (they're sourced
    /// from workflow config, not the event log) and simply retrieved here.
    pub fn upsert_platform_set(&mut self, install_target: impl Into<String>, platforms: Vec<String>) {
        self.platform_sets.insert(install_target.into(), platforms);
    }

    pub fn platform_set(&self, install_target: &str) -> Option<&[String]> {
        self.platform_sets.get(install_target).map(Vec::as_slice)
    }
}

/// Apply one event to the materialized state. This is the sole mutation
/// path: the engine never writes `MaterializedState` fields directly,
/// it emits events and replays them through here, which is also how state
/// is rebuilt from the write-ahead log at startup.
pub fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::ProxySpawned { id, status } => {
            state.tasks.insert(id.clone(), TaskRecord::spawned(*status));
        }
        Event::ProxyRemoved { id } => {
            state.tasks.shift_remove(id);
        }
        Event::StatusChanged { id, status } => {
            if let Some(record) = state.tasks.get_mut(id) {
                record.status = *status;
            }
        }
        Event::HeldChanged { id, held } => {
            if let Some(record) = state.tasks.get_mut(id) {
                record.held = *held;
            }
        }
        Event::OutputCompleted { id, message } => {
            if let Some(record) = state.tasks.get_mut(id) {
                if !record.completed_messages.contains(message) {
                    record.completed_messages.push(message.clone());
                }
            }
        }
        Event::OutputReset { id, message } => {
            if let Some(record) = state.tasks.get_mut(id) {
                record.completed_messages.retain(|m| m != message);
            }
        }
        Event::SubmitNumIncremented { id, submit_num } => {
            if let Some(record) = state.tasks.get_mut(id) {
                record.submit_num = *submit_num;
            }
        }
        Event::BroadcastPut { point, namespace, path, value } => {
            let key = BroadcastRecordKey {
                point: point.as_ref().map(|p| p.format()),
                namespace: namespace.clone(),
                path: path.clone(),
            };
            state.broadcasts.insert(key, value.clone());
        }
        Event::BroadcastCleared { point, namespace, path } => {
            let key = BroadcastRecordKey {
                point: point.as_ref().map(|p| p.format()),
                namespace: namespace.clone(),
                path: path.clone(),
            };
            state.broadcasts.shift_remove(&key);
        }
        Event::CheckpointTaken { label } => {
            state.checkpoints.push(label.clone());
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
