// SPDX-License-Identifier: MIT

//! S1: a task with a satisfied recurrence runs to completion and spawns its
//! successor at the next cycle point (spec.md §4.7, §4.14).

use crate::common::{empty_inbox, one_task_scheduler};
use cylc_core::effect::SchedulerEffect;
use cylc_core::task_state::TaskStatus;
use cylc_engine::{IncomingMessage, Inbox, Severity};

#[test]
fn a_ready_task_submits_then_succeeds_and_spawns_its_successor() {
    let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let (mut scheduler, id) = one_task_scheduler(tmp.path(), |_| {});
    let now_point = id.1;

    let outcome =
        scheduler.tick(1_000, now_point, empty_inbox()).unwrap_or_else(|e| panic!("tick: {e}"));
    assert!(outcome
        .effects
        .iter()
        .any(|e| matches!(e, SchedulerEffect::RunSubprocess(ctx) if ctx.cmd_key == "jobs-submit")));
    assert_eq!(scheduler.task_pool().get(&id).unwrap_or_else(|| panic!("task missing")).status(), TaskStatus::Submitted);

    let succeeded = IncomingMessage {
        id: id.clone(),
        severity: Severity::Normal,
        message: "succeeded".to_string(),
        submit_num: Some(1),
    };
    scheduler
        .tick(2_000, now_point, Inbox { messages: vec![succeeded], ..Default::default() })
        .unwrap_or_else(|e| panic!("tick: {e}"));

    assert_eq!(scheduler.task_pool().get(&id).unwrap_or_else(|| panic!("task missing")).status(), TaskStatus::Succeeded);

    let next_point = now_point.add_offset(&cylc_core::CycleOffset::hours(24));
    let next_id = (id.0.clone(), next_point);
    assert!(scheduler.task_pool().get(&next_id).is_some(), "successor was not spawned");
}
