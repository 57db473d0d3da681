// SPDX-License-Identifier: MIT

//! S4: future cycle points stay parked in the runahead pool instead of
//! entering the active pool (and becoming queue-eligible) until an
//! earlier point completes and the cutoff advances (spec.md §4.7
//! "Runahead").

use cylc_core::test_support::{bare_taskdef, point};
use cylc_core::{CycleOffset, Sequence, TaskStatus};
use cylc_engine::{RunaheadLimit, TaskPool};
use indexmap::IndexMap;

fn pool() -> (TaskPool, cylc_core::CyclePoint, cylc_core::CyclePoint, cylc_core::CyclePoint) {
    let p0 = point(2026, 1, 1, 0);
    let p1 = point(2026, 1, 2, 0);
    let p2 = point(2026, 1, 3, 0);
    let mut def = bare_taskdef("foo");
    def.sequences = vec![Sequence::new(p0, CycleOffset::hours(24)).unwrap_or_else(|e| panic!("sequence: {e}"))];
    let mut taskdefs = IndexMap::new();
    taskdefs.insert("foo".to_string(), def);
    (TaskPool::new(taskdefs, RunaheadLimit::Count(2)), p0, p1, p2)
}

#[test]
fn future_points_are_held_in_runahead_until_the_base_task_completes() {
    let (mut task_pool, p0, p1, p2) = pool();
    task_pool.insert("foo", p0);
    task_pool.insert("foo", p1);
    task_pool.insert("foo", p2);

    let active: Vec<_> = task_pool.active_ids().cloned().collect();
    assert_eq!(active, vec![("foo".to_string(), p0)], "only the base point is active while p0 hasn't completed");
    assert!(task_pool.get(&("foo".to_string(), p1)).is_some(), "future points stay in the pool");
    assert!(task_pool.get(&("foo".to_string(), p2)).is_some());

    // Releasing while the base is still unresolved changes nothing.
    let released = task_pool.release_runahead_tasks();
    assert!(released.is_empty());
    assert_eq!(task_pool.active_ids().count(), 1);

    // Force p0 to its terminal state (as a real run would via job messages)
    // and recompute: the cutoff advances to p1, releasing exactly p1.
    let proxy = task_pool.get_mut(&("foo".to_string(), p0)).unwrap_or_else(|| panic!("p0 missing"));
    proxy.state_mut().reset(TaskStatus::Succeeded);

    let released = task_pool.release_runahead_tasks();
    assert_eq!(released, vec![("foo".to_string(), p1)]);
    let mut active: Vec<_> = task_pool.active_ids().cloned().collect();
    active.sort();
    assert_eq!(active, vec![("foo".to_string(), p0), ("foo".to_string(), p1)]);
    assert!(
        task_pool.get(&("foo".to_string(), p2)).is_some() && !task_pool.active_ids().any(|id| id.1 == p2),
        "p2 stays parked in runahead; only one point ahead of the base is released at a time"
    );
}
