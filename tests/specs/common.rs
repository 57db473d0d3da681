// SPDX-License-Identifier: MIT

//! Shared scaffolding for the scenario tests: a one-task-definition
//! workflow, localhost platform, and a scheduler wired exactly the way
//! `cylcd` wires one, minus the tokio main loop.

use cylc_core::platform::{InstallTarget, JobRunnerName, Platform, PlatformName};
use cylc_core::test_support::{bare_taskdef, point};
use cylc_core::{CycleOffset, CyclePoint, Sequence, TaskDefinition};
use cylc_adapters::batch_system::BatchSystemRegistry;
use cylc_engine::{Inbox, RunaheadLimit, Scheduler, TaskId, TaskPool};
use cylc_storage::state::MaterializedState;
use cylc_storage::Wal;
use indexmap::IndexMap;
use std::time::Duration;

pub fn localhost_platform() -> Platform {
    Platform {
        name: PlatformName::new("localhost"),
        hosts: vec!["localhost".to_string()],
        install_target: InstallTarget::new("localhost"),
        ssh_command: "ssh".to_string(),
        job_runner: JobRunnerName("background".to_string()),
        owner: None,
        execution_polling_intervals: vec![],
        execution_time_limit_polling_intervals: vec![],
        submission_polling_intervals: vec![],
        submission_timeout: None,
        execution_timeout: None,
        retrieve_job_logs: false,
        retrieve_job_logs_retry_delays: vec![],
        remote_timeout: Duration::from_secs(120),
    }
}

/// One task, `foo`, recurring every 24h starting at `2026-01-01T00`, with a
/// runahead limit of 2 distinct cycle points.
pub fn one_task_scheduler(tmp: &std::path::Path, configure: impl FnOnce(&mut TaskDefinition)) -> (Scheduler, TaskId) {
    let p = point(2026, 1, 1, 0);
    let mut def = bare_taskdef("foo");
    def.sequences = vec![Sequence::new(p, CycleOffset::hours(24)).unwrap_or_else(|e| panic!("sequence: {e}"))];
    def.runtime.script = Some("true".to_string());
    configure(&mut def);

    let mut taskdefs = IndexMap::new();
    taskdefs.insert("foo".to_string(), def);
    let mut task_pool = TaskPool::new(taskdefs, RunaheadLimit::Count(2));
    task_pool.insert("foo", p);

    let registry = BatchSystemRegistry::with_defaults();
    let wal = Wal::open(tmp.join("wal.jsonl")).unwrap_or_else(|e| panic!("wal open: {e}"));
    let state = MaterializedState::new();

    let mut scheduler = Scheduler::new(
        "flow_a",
        tmp.join("log").display().to_string(),
        task_pool,
        vec!["default".to_string()],
        registry,
        wal,
        state,
        "test-uuid",
        300_000,
    );
    let mut platforms = IndexMap::new();
    platforms.insert("localhost".to_string(), localhost_platform());
    scheduler.set_platforms(platforms);
    (scheduler, ("foo".to_string(), p))
}

pub fn empty_inbox() -> Inbox {
    Inbox::default()
}

pub fn wall_point() -> CyclePoint {
    point(2026, 1, 1, 0)
}
