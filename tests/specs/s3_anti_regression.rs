// SPDX-License-Identifier: MIT

//! S3: a stale `submitted` message arriving after the job has already
//! been observed `running` must not regress the task's status — it
//! triggers a poll instead (spec.md §4.11 "anti-regression").

use crate::common::{empty_inbox, one_task_scheduler};
use cylc_core::effect::SchedulerEffect;
use cylc_core::task_state::TaskStatus;
use cylc_engine::{IncomingMessage, Inbox, Severity};

#[test]
fn a_reordered_submitted_message_after_running_does_not_regress_status() {
    let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let (mut scheduler, id) = one_task_scheduler(tmp.path(), |_| {});
    let now_point = id.1;

    scheduler.tick(1_000, now_point, empty_inbox()).unwrap_or_else(|e| panic!("tick: {e}"));
    assert_eq!(scheduler.task_pool().get(&id).unwrap_or_else(|| panic!("missing")).status(), TaskStatus::Submitted);

    let started = IncomingMessage { id: id.clone(), severity: Severity::Normal, message: "started".to_string(), submit_num: Some(1) };
    scheduler.tick(2_000, now_point, Inbox { messages: vec![started], ..Default::default() }).unwrap_or_else(|e| panic!("tick: {e}"));
    assert_eq!(scheduler.task_pool().get(&id).unwrap_or_else(|| panic!("missing")).status(), TaskStatus::Running);

    // A delayed "submitted" message for the same submit number, reordered
    // behind "started" by the transport.
    let late_submitted = IncomingMessage { id: id.clone(), severity: Severity::Normal, message: "submitted".to_string(), submit_num: Some(1) };
    let outcome = scheduler
        .tick(3_000, now_point, Inbox { messages: vec![late_submitted], ..Default::default() })
        .unwrap_or_else(|e| panic!("tick: {e}"));

    assert_eq!(
        scheduler.task_pool().get(&id).unwrap_or_else(|| panic!("missing")).status(),
        TaskStatus::Running,
        "a lower-ranked message must never regress an already-observed higher-ranked status"
    );
    assert!(
        outcome.effects.iter().any(|e| matches!(e, SchedulerEffect::RunSubprocess(ctx) if ctx.cmd_key == "jobs-poll")),
        "anti-regression should trigger a poll to reconcile the true job state"
    );
}
