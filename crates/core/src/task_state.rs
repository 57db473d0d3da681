// SPDX-License-Identifier: MIT

//! Task status state machine (spec.md §4.3).
//!
//! `held` is a modifier orthogonal to the base status, not a status of its
//! own. Transitions are functions returning whether they changed anything;
//! an invalid transition is a no-op, not an error.

use crate::macros::simple_display;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Waiting,
    Queued,
    Ready,
    SubmitRetrying,
    Submitted,
    SubmitFailed,
    Running,
    Retrying,
    Succeeded,
    Failed,
    Expired,
}

simple_display!(TaskStatus {
    Waiting => "waiting",
    Queued => "queued",
    Ready => "ready",
    SubmitRetrying => "submit-retrying",
    Submitted => "submitted",
    SubmitFailed => "submit-failed",
    Running => "running",
    Retrying => "retrying",
    Succeeded => "succeeded",
    Failed => "failed",
    Expired => "expired",
});

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::SubmitFailed | Self::Expired)
    }

    /// Ordering rank among job-lifecycle statuses, used to reject a
    /// late-arriving message that would regress status. `None` for statuses
    /// that aren't reached via incoming job messages (they're pool-driven).
    pub fn job_rank(self) -> Option<u8> {
        match self {
            Self::Submitted => Some(0),
            Self::SubmitFailed => Some(1),
            Self::Running => Some(2),
            Self::Succeeded | Self::Failed | Self::Expired => Some(3),
            Self::Waiting | Self::Queued | Self::Ready | Self::SubmitRetrying | Self::Retrying => {
                None
            }
        }
    }
}

/// Base status plus the `held` modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskState {
    status: TaskStatus,
    held: bool,
}

impl TaskState {
    pub fn new(status: TaskStatus) -> Self {
        Self { status, held: false }
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn set_held(&mut self, held: bool) -> bool {
        let changed = self.held != held;
        self.held = held;
        changed
    }

    fn transition(&mut self, from: &[TaskStatus], to: TaskStatus) -> bool {
        if from.contains(&self.status) {
            self.status = to;
            true
        } else {
            debug!(from = %self.status, to = %to, "rejected invalid task status transition");
            false
        }
    }

    pub fn to_queued(&mut self) -> bool {
        self.transition(&[TaskStatus::Waiting], TaskStatus::Queued)
    }

    pub fn to_ready(&mut self) -> bool {
        self.transition(
            &[TaskStatus::Queued, TaskStatus::SubmitRetrying, TaskStatus::Retrying],
            TaskStatus::Ready,
        )
    }

    pub fn to_submitted(&mut self) -> bool {
        self.transition(&[TaskStatus::Ready], TaskStatus::Submitted)
    }

    pub fn to_submit_failed(&mut self) -> bool {
        self.transition(&[TaskStatus::Ready, TaskStatus::Submitted], TaskStatus::SubmitFailed)
    }

    pub fn to_submit_retrying(&mut self) -> bool {
        self.transition(&[TaskStatus::SubmitFailed], TaskStatus::SubmitRetrying)
    }

    pub fn to_running(&mut self) -> bool {
        self.transition(&[TaskStatus::Submitted], TaskStatus::Running)
    }

    pub fn to_succeeded(&mut self) -> bool {
        self.transition(&[TaskStatus::Submitted, TaskStatus::Running], TaskStatus::Succeeded)
    }

    pub fn to_failed(&mut self) -> bool {
        self.transition(&[TaskStatus::Submitted, TaskStatus::Running], TaskStatus::Failed)
    }

    pub fn to_retrying(&mut self) -> bool {
        self.transition(&[TaskStatus::Running, TaskStatus::Failed], TaskStatus::Retrying)
    }

    pub fn to_expired(&mut self) -> bool {
        self.transition(&[TaskStatus::Waiting, TaskStatus::Queued, TaskStatus::Ready], TaskStatus::Expired)
    }

    /// Operator-forced transition: bypasses the DAG entirely.
    pub fn reset(&mut self, status: TaskStatus) -> bool {
        let changed = self.status != status;
        self.status = status;
        changed
    }

    /// Apply a status implied by an incoming job message, honouring the
    /// anti-regression ordering guarantee (spec.md §4.3): a message that
    /// would move a job-lifecycle status backward is rejected outright, not
    /// merely no-opped, so the caller can schedule a confirmation poll.
    pub fn apply_job_message_status(&mut self, incoming: TaskStatus) -> bool {
        if let (Some(incoming_rank), Some(current_rank)) =
            (incoming.job_rank(), self.status.job_rank())
        {
            if incoming_rank < current_rank {
                debug!(
                    current = %self.status,
                    incoming = %incoming,
                    "rejected regressive job message, scheduling confirmation poll instead"
                );
                return false;
            }
        }
        match incoming {
            TaskStatus::Submitted => self.to_submitted(),
            TaskStatus::SubmitFailed => self.to_submit_failed(),
            TaskStatus::Running => self.to_running(),
            TaskStatus::Succeeded => self.to_succeeded(),
            TaskStatus::Failed => self.to_failed(),
            TaskStatus::Expired => self.to_expired(),
            other => self.reset(other),
        }
    }
}

#[cfg(test)]
#[path = "task_state_tests.rs"]
mod tests;
