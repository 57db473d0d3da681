// SPDX-License-Identifier: MIT

//! The in-process command queue (spec.md §6): `(verb, args, kwargs)` tuples
//! placed by UI/HTTP/CLI layers, replied to as `(ok, message)`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verb", rename_all = "snake_case")]
pub enum Command {
    HoldTasks { task_ids: Vec<String> },
    ReleaseTasks { task_ids: Vec<String> },
    HoldAfterPointString { point: String },
    ReleaseSuite,
    HoldSuite,
    Nudge,
    ReloadSuite,
    SetVerbosity { level: String },
    SetStopAfterPoint { point: String },
    SetStopAfterClockTime { iso_time: String },
    SetStopAfterTask { task_id: String },
    SetStopCleanly { kill_active_tasks: bool },
    StopNow { terminate: bool },
    TriggerTasks { task_ids: Vec<String>, back_out: bool },
    InsertTasks { task_ids: Vec<String>, stop_point_string: Option<String>, no_check: bool },
    RemoveTasks { task_ids: Vec<String>, spawn: bool },
    ResetTaskStates { task_ids: Vec<String>, state: Option<String>, outputs: Vec<String> },
    PollTasks { task_ids: Vec<String>, poll_succ: bool },
    KillTasks { task_ids: Vec<String> },
    SpawnTasks { task_ids: Vec<String> },
    TakeCheckpoints { label: String },
    DryRunTasks { task_ids: Vec<String>, check_syntax: bool },
}

/// A command paired with an id the reply channel echoes back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub id: String,
    pub command: Command,
}

/// The command queue's reply to a caller (spec.md §7 propagation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandReply {
    pub id: String,
    pub ok: bool,
    pub message: String,
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
