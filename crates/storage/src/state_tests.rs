use super::*;
use cylc_core::cycle_point::{Calendar, CyclePoint};

fn id(name: &str) -> TaskInstanceId {
    TaskInstanceId { name: name.to_string(), point: CyclePoint::new(Calendar::Gregorian, 2020, 1, 1, 0, 0, 0) }
}

#[test]
fn spawn_then_remove_round_trips() {
    let mut state = MaterializedState::new();
    apply(&mut state, &Event::ProxySpawned { id: id("foo"), status: TaskStatus::Waiting });
    assert!(state.task(&id("foo")).is_some());
    apply(&mut state, &Event::ProxyRemoved { id: id("foo") });
    assert!(state.task(&id("foo")).is_none());
}

#[test]
fn status_changed_updates_existing_record_only() {
    let mut state = MaterializedState::new();
    apply(&mut state, &Event::StatusChanged { id: id("foo"), status: TaskStatus::Running });
    assert!(state.task(&id("foo")).is_none(), "no record to update yet");

    apply(&mut state, &Event::ProxySpawned { id: id("foo"), status: TaskStatus::Waiting });
    apply(&mut state, &Event::StatusChanged { id: id("foo"), status: TaskStatus::Running });
    assert_eq!(state.task(&id("foo")).unwrap().status, TaskStatus::Running);
}

#[test]
fn output_completed_is_idempotent() {
    let mut state = MaterializedState::new();
    apply(&mut state, &Event::ProxySpawned { id: id("foo"), status: TaskStatus::Waiting });
    apply(&mut state, &Event::OutputCompleted { id: id("foo"), message: "succeeded".to_string() });
    apply(&mut state, &Event::OutputCompleted { id: id("foo"), message: "succeeded".to_string() });
    assert_eq!(state.task(&id("foo")).unwrap().completed_messages, vec!["succeeded".to_string()]);
}

#[test]
fn output_reset_removes_the_message() {
    let mut state = MaterializedState::new();
    apply(&mut state, &Event::ProxySpawned { id: id("foo"), status: TaskStatus::Waiting });
    apply(&mut state, &Event::OutputCompleted { id: id("foo"), message: "succeeded".to_string() });
    apply(&mut state, &Event::OutputReset { id: id("foo"), message: "succeeded".to_string() });
    assert!(state.task(&id("foo")).unwrap().completed_messages.is_empty());
}

#[test]
fn platform_sets_are_upserted_directly_not_event_sourced() {
    let mut state = MaterializedState::new();
    state.upsert_platform_set("hpc", vec!["hpc-a".to_string(), "hpc-b".to_string()]);
    assert_eq!(state.platform_set("hpc"), Some(&["hpc-a".to_string(), "hpc-b".to_string()][..]));
}

#[test]
fn checkpoint_taken_is_appended() {
    let mut state = MaterializedState::new();
    apply(&mut state, &Event::CheckpointTaken { label: "before-reload".to_string() });
    assert_eq!(state.checkpoints(), &["before-reload".to_string()]);
}
