use super::*;
use cylc_core::test_support::point;
use cylc_core::{PrereqConjunctionTemplate, PrereqEntryTemplate, Sequence, TaskDefinition};
use indexmap::IndexMap;

fn hourly_taskdef(name: &str) -> TaskDefinition {
    let mut def = TaskDefinition::new(name);
    def.sequences = vec![Sequence::new(point(2020, 1, 1, 0), CycleOffset::hours(1)).unwrap()];
    def
}

fn taskdefs(names: &[&str]) -> IndexMap<String, TaskDefinition> {
    names.iter().map(|n| (n.to_string(), hourly_taskdef(n))).collect()
}

#[test]
fn insert_places_base_point_directly_in_active() {
    let mut pool = TaskPool::new(taskdefs(&["foo"]), RunaheadLimit::Count(3));
    assert!(pool.insert("foo", point(2020, 1, 1, 0)));
    assert_eq!(pool.active_ids().count(), 1);
}

#[test]
fn duplicate_insert_is_a_no_op() {
    let mut pool = TaskPool::new(taskdefs(&["foo"]), RunaheadLimit::Count(3));
    assert!(pool.insert("foo", point(2020, 1, 1, 0)));
    assert!(!pool.insert("foo", point(2020, 1, 1, 0)));
    assert_eq!(pool.len(), 1);
}

#[test]
fn count_mode_n_equals_one_keeps_exactly_one_active_cycle() {
    let mut pool = TaskPool::new(taskdefs(&["foo"]), RunaheadLimit::Count(1));
    pool.insert("foo", point(2020, 1, 1, 0));
    pool.insert("foo", point(2020, 1, 1, 1));
    pool.insert("foo", point(2020, 1, 1, 2));
    assert_eq!(pool.active_ids().count(), 1);
}

#[test]
fn release_runahead_tasks_moves_points_within_cutoff() {
    let mut pool = TaskPool::new(taskdefs(&["foo"]), RunaheadLimit::Count(2));
    pool.insert("foo", point(2020, 1, 1, 0));
    pool.insert("foo", point(2020, 1, 1, 1));
    pool.insert("foo", point(2020, 1, 1, 2));
    assert_eq!(pool.active_ids().count(), 2);
    let released = pool.release_runahead_tasks();
    assert!(released.is_empty(), "everything within cutoff was already active on insert");
}

#[test]
fn match_dependencies_is_idempotent() {
    let mut defs = taskdefs(&["foo", "bar"]);
    defs.get_mut("bar").unwrap().prerequisites = vec![PrereqConjunctionTemplate {
        entries: vec![PrereqEntryTemplate { task_name: "foo".to_string(), offset: CycleOffset::default(), message: "succeeded".to_string() }],
    }];
    let mut pool = TaskPool::new(defs, RunaheadLimit::Count(3));
    pool.insert("foo", point(2020, 1, 1, 0));
    pool.insert("bar", point(2020, 1, 1, 0));

    // Wire up bar's prerequisite by hand (a runbook/task-def compiler would do this).
    {
        let key = cylc_core::prerequisite::PrereqKey::new("foo".to_string(), point(2020, 1, 1, 0), "succeeded".to_string());
        let conj = cylc_core::prerequisite::Conjunction::new([key]);
        pool.get_mut(&("bar".to_string(), point(2020, 1, 1, 0))).unwrap().prerequisites =
            vec![cylc_core::Prerequisite::new(vec![conj])];
    }

    pool.get_mut(&("foo".to_string(), point(2020, 1, 1, 0))).unwrap().outputs.set_completed("succeeded", true).unwrap();

    pool.match_dependencies();
    let satisfied_once = pool.get(&("bar".to_string(), point(2020, 1, 1, 0))).unwrap().is_ready();
    pool.match_dependencies();
    let satisfied_twice = pool.get(&("bar".to_string(), point(2020, 1, 1, 0))).unwrap().is_ready();
    assert_eq!(satisfied_once, satisfied_twice);
    assert!(satisfied_once);
}

#[test]
fn spawn_all_tasks_spawns_succeeded_proxy_exactly_once() {
    let mut pool = TaskPool::new(taskdefs(&["foo"]), RunaheadLimit::Count(5));
    pool.insert("foo", point(2020, 1, 1, 0));
    pool.get_mut(&("foo".to_string(), point(2020, 1, 1, 0))).unwrap().state_mut().reset(cylc_core::TaskStatus::Succeeded);

    let spawned_first = pool.spawn_all_tasks();
    assert_eq!(spawned_first, vec![("foo".to_string(), point(2020, 1, 1, 1))]);

    let spawned_second = pool.spawn_all_tasks();
    assert!(spawned_second.is_empty(), "already spawned, must not spawn again");
}

#[test]
fn process_queue_respects_limit() {
    let mut pool = TaskPool::new(taskdefs(&["foo"]), RunaheadLimit::Count(5));
    pool.set_queue_limit("default", 1);
    pool.insert("foo", point(2020, 1, 1, 0));
    pool.insert("foo", point(2020, 1, 1, 1));
    for id in [("foo".to_string(), point(2020, 1, 1, 0)), ("foo".to_string(), point(2020, 1, 1, 1))] {
        pool.get_mut(&id).unwrap().state_mut().to_queued();
    }
    let released = pool.process_queue("default");
    assert_eq!(released.len(), 1);
}

#[test]
fn remove_suiciding_tasks_removes_and_spawns_successor() {
    let mut defs = taskdefs(&["foo"]);
    defs.get_mut("foo").unwrap().suicide_prerequisites = vec![PrereqConjunctionTemplate { entries: vec![] }];
    let mut pool = TaskPool::new(defs, RunaheadLimit::Count(5));
    pool.insert("foo", point(2020, 1, 1, 0));
    {
        let proxy = pool.get_mut(&("foo".to_string(), point(2020, 1, 1, 0))).unwrap();
        proxy.suicide_prerequisites = vec![cylc_core::Prerequisite::new(vec![cylc_core::prerequisite::Conjunction::new([])])];
    }
    let events = pool.remove_suiciding_tasks();
    assert_eq!(events.len(), 1);
    assert!(pool.get(&("foo".to_string(), point(2020, 1, 1, 0))).is_none());
}

#[test]
fn empty_pool_is_not_stalled() {
    let pool = TaskPool::new(taskdefs(&["foo"]), RunaheadLimit::Count(3));
    assert!(!pool.is_stalled());
}

#[test]
fn waiting_on_unmet_prerequisite_is_stalled() {
    let mut defs = taskdefs(&["bar"]);
    defs.get_mut("bar").unwrap().prerequisites = vec![PrereqConjunctionTemplate {
        entries: vec![PrereqEntryTemplate { task_name: "foo".to_string(), offset: CycleOffset::default(), message: "succeeded".to_string() }],
    }];
    let mut pool = TaskPool::new(defs, RunaheadLimit::Count(3));
    pool.insert("bar", point(2020, 1, 1, 0));
    let key = cylc_core::prerequisite::PrereqKey::new("foo".to_string(), point(2020, 1, 1, 0), "succeeded".to_string());
    let conj = cylc_core::prerequisite::Conjunction::new([key]);
    pool.get_mut(&("bar".to_string(), point(2020, 1, 1, 0))).unwrap().prerequisites = vec![cylc_core::Prerequisite::new(vec![conj])];
    assert!(pool.is_stalled());
}
