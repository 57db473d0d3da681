// SPDX-License-Identifier: MIT

//! S2: a task configured with execution retry delays retries on failure up
//! to its configured budget, then goes terminal once exhausted (spec.md
//! §4.4, §4.11).

use crate::common::{empty_inbox, one_task_scheduler};
use cylc_core::task_state::TaskStatus;
use cylc_engine::{IncomingMessage, Inbox, Severity};
use std::time::Duration;

#[test]
fn a_failed_task_retries_once_then_goes_terminal() {
    let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let (mut scheduler, id) = one_task_scheduler(tmp.path(), |def| {
        def.runtime.execution_retry_delays = vec![Duration::from_millis(100)];
    });
    let now_point = id.1;

    scheduler.tick(1_000, now_point, empty_inbox()).unwrap_or_else(|e| panic!("tick: {e}"));
    assert_eq!(scheduler.task_pool().get(&id).unwrap_or_else(|| panic!("missing")).status(), TaskStatus::Submitted);

    let started = IncomingMessage { id: id.clone(), severity: Severity::Normal, message: "started".to_string(), submit_num: Some(1) };
    scheduler.tick(2_000, now_point, Inbox { messages: vec![started], ..Default::default() }).unwrap_or_else(|e| panic!("tick: {e}"));
    assert_eq!(scheduler.task_pool().get(&id).unwrap_or_else(|| panic!("missing")).status(), TaskStatus::Running);

    let failed = IncomingMessage { id: id.clone(), severity: Severity::Normal, message: "failed".to_string(), submit_num: Some(1) };
    scheduler.tick(3_000, now_point, Inbox { messages: vec![failed], ..Default::default() }).unwrap_or_else(|e| panic!("tick: {e}"));
    let proxy = scheduler.task_pool().get(&id).unwrap_or_else(|| panic!("missing"));
    assert_eq!(proxy.status(), TaskStatus::Retrying, "first failure should retry, not go terminal");
    assert_eq!(proxy.try_num, 1);

    // Retrying re-queues and re-submits; simulate the resubmission reaching
    // running then failing again, past the single configured retry delay.
    let outcome = scheduler.tick(4_000, now_point, empty_inbox()).unwrap_or_else(|e| panic!("tick: {e}"));
    assert!(outcome.effects.iter().any(
        |e| matches!(e, cylc_core::effect::SchedulerEffect::RunSubprocess(ctx) if ctx.cmd_key == "jobs-submit")
    ));

    let started2 = IncomingMessage { id: id.clone(), severity: Severity::Normal, message: "started".to_string(), submit_num: Some(2) };
    scheduler.tick(5_000, now_point, Inbox { messages: vec![started2], ..Default::default() }).unwrap_or_else(|e| panic!("tick: {e}"));

    let failed2 = IncomingMessage { id: id.clone(), severity: Severity::Normal, message: "failed".to_string(), submit_num: Some(2) };
    scheduler.tick(6_000, now_point, Inbox { messages: vec![failed2], ..Default::default() }).unwrap_or_else(|e| panic!("tick: {e}"));
    let proxy = scheduler.task_pool().get(&id).unwrap_or_else(|| panic!("missing"));
    assert_eq!(proxy.status(), TaskStatus::Failed, "retry budget is exhausted, the second failure is terminal");
}
