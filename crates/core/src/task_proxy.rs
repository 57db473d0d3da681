// SPDX-License-Identifier: MIT

//! A task instance at a cycle point (spec.md §3, §4.5): the mutable
//! counterpart to [`crate::task_def::TaskDefinition`].

use crate::action_timer::ActionTimer;
use crate::cycle_point::CyclePoint;
use crate::outputs::Outputs;
use crate::prerequisite::Prerequisite;
use crate::sequence::Sequence;
use crate::task_def::TaskDefinition;
use crate::task_state::{TaskState, TaskStatus};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Which summary timestamp a job message updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryTimeKind {
    Submitted,
    Started,
    Finished,
}

/// Latest known facts about a task's current/most recent job, surfaced to
/// the UI and to event handler field substitution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub latest_message: Option<String>,
    pub submitted_time: Option<u64>,
    pub started_time: Option<u64>,
    pub finished_time: Option<u64>,
    pub batch_sys_name: Option<String>,
    pub batch_sys_job_id: Option<String>,
    pub host: Option<String>,
    pub owner: Option<String>,
    pub job_log_dir: Option<String>,
}

/// The retry/poll timers a proxy carries through its lifecycle, plus one
/// per configured event handler (keyed by event name, or `event#N` for the
/// non-unique events that don't dedupe).
#[derive(Debug, Default)]
pub struct ActionTimers {
    pub poll_timer: Option<ActionTimer>,
    pub submit_retry_timer: Option<ActionTimer>,
    pub execution_retry_timer: Option<ActionTimer>,
    pub handler_timers: IndexMap<String, ActionTimer>,
}

/// A task instance at `(name, point)`.
#[derive(Debug)]
pub struct TaskProxy {
    pub name: String,
    pub point: CyclePoint,
    pub submit_num: u32,
    pub try_num: u32,
    pub submit_retry_num: u32,
    state: TaskState,
    /// Status saved when the proxy is held from a queued/ready state, so
    /// release can restore it rather than re-deriving from scratch.
    swap_status: Option<TaskStatus>,
    pub outputs: Outputs,
    pub prerequisites: Vec<Prerequisite>,
    pub suicide_prerequisites: Vec<Prerequisite>,
    pub xtriggers: IndexMap<String, bool>,
    pub xclock: Option<(String, bool)>,
    pub timers: ActionTimers,
    /// Absolute deadline (epoch ms) for the current submitted/running status.
    pub timeout_ms: Option<u64>,
    pub summary: JobSummary,
    pub spawned: bool,
    pub manual_trigger: bool,
    pub reload_successor: Option<(String, CyclePoint)>,
    /// Set by a batch-system vacation signal, cleared by the next `started`
    /// message (spec.md §4.11).
    pub job_vacated: bool,
}

impl TaskProxy {
    pub fn new(
        taskdef: &TaskDefinition,
        point: CyclePoint,
        initial_status: Option<TaskStatus>,
        submit_num: u32,
    ) -> Self {
        Self {
            name: taskdef.name.clone(),
            point,
            submit_num,
            try_num: 0,
            submit_retry_num: 0,
            state: TaskState::new(initial_status.unwrap_or(TaskStatus::Waiting)),
            swap_status: None,
            outputs: Outputs::new(taskdef.output_messages()),
            prerequisites: Vec::new(),
            suicide_prerequisites: Vec::new(),
            xtriggers: IndexMap::new(),
            xclock: taskdef.clock_offset.as_ref().map(|_| ("clock".to_string(), false)),
            timers: ActionTimers::default(),
            timeout_ms: None,
            summary: JobSummary::default(),
            spawned: false,
            manual_trigger: false,
            reload_successor: None,
            job_vacated: false,
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.state.status()
    }

    pub fn is_held(&self) -> bool {
        self.state.is_held()
    }

    pub fn state_mut(&mut self) -> &mut TaskState {
        &mut self.state
    }

    /// Hold the proxy. If it's queued or ready, pull it back to waiting and
    /// remember the swapped-out status so [`Self::release`] can restore it.
    pub fn hold(&mut self) {
        self.state.set_held(true);
        if matches!(self.status(), TaskStatus::Queued | TaskStatus::Ready) {
            self.swap_status = Some(self.status());
            self.state.reset(TaskStatus::Waiting);
        }
    }

    pub fn release(&mut self) {
        self.state.set_held(false);
        if let Some(status) = self.swap_status.take() {
            self.state.reset(status);
        }
    }

    /// Build the next cycle point's proxy from the same definition, with
    /// fresh instance state. Returns `None` if the sequence has no further
    /// point after this one.
    pub fn advance_to_next_point(
        &self,
        sequence: &Sequence,
        taskdef: &TaskDefinition,
    ) -> Option<TaskProxy> {
        let next_point = sequence.next_after(&self.point)?;
        Some(TaskProxy::new(taskdef, next_point, None, 0))
    }

    /// The upstream `(name, point, message)` references this proxy's
    /// satisfied prerequisite entries resolved against, for display.
    pub fn resolved_dependencies(&self) -> Vec<String> {
        self.prerequisites
            .iter()
            .flat_map(|p| p.conjunctions())
            .flat_map(|c| c.keys())
            .map(|k| format!("{}.{}:{}", k.name, k.point, k.message))
            .collect()
    }

    /// 1-based attempt number, for `CYLC_TASK_TRY_NUMBER`-style reporting.
    pub fn try_num(&self) -> u32 {
        self.try_num + 1
    }

    pub fn set_summary_time(&mut self, kind: SummaryTimeKind, time: Option<u64>) {
        match kind {
            SummaryTimeKind::Submitted => self.summary.submitted_time = time,
            SummaryTimeKind::Started => self.summary.started_time = time,
            SummaryTimeKind::Finished => self.summary.finished_time = time,
        }
    }

    /// True when every gating condition for a waiting→ready transition
    /// holds: prerequisites satisfied, xtriggers satisfied, clock trigger
    /// reached, not held.
    pub fn is_ready(&self) -> bool {
        if self.is_held() {
            return false;
        }
        if !self.prerequisites.iter().all(Prerequisite::is_satisfied) {
            return false;
        }
        if !self.xtriggers.values().all(|&satisfied| satisfied) {
            return false;
        }
        if let Some((_, satisfied)) = &self.xclock {
            if !satisfied {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
#[path = "task_proxy_tests.rs"]
mod tests;
