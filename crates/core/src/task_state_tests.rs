use super::*;

#[test]
fn happy_path_progresses_through_the_dag() {
    let mut state = TaskState::new(TaskStatus::Waiting);
    assert!(state.to_queued());
    assert!(state.to_ready());
    assert!(state.to_submitted());
    assert!(state.to_running());
    assert!(state.to_succeeded());
    assert_eq!(state.status(), TaskStatus::Succeeded);
}

#[test]
fn invalid_transition_is_a_noop() {
    let mut state = TaskState::new(TaskStatus::Waiting);
    assert!(!state.to_submitted(), "waiting cannot jump straight to submitted");
    assert_eq!(state.status(), TaskStatus::Waiting);
}

#[test]
fn held_is_orthogonal_to_status() {
    let mut state = TaskState::new(TaskStatus::Waiting);
    assert!(state.set_held(true));
    assert!(!state.set_held(true), "setting the same value again reports no change");
    assert!(state.to_queued());
    assert!(state.is_held());
}

#[test]
fn reset_bypasses_the_dag() {
    let mut state = TaskState::new(TaskStatus::Waiting);
    assert!(state.reset(TaskStatus::Failed));
    assert_eq!(state.status(), TaskStatus::Failed);
}

#[test]
fn late_message_does_not_regress_status() {
    let mut state = TaskState::new(TaskStatus::Waiting);
    state.to_queued();
    state.to_ready();
    state.to_submitted();
    state.to_running();
    assert!(state.apply_job_message_status(TaskStatus::Succeeded));
    assert_eq!(state.status(), TaskStatus::Succeeded);

    // a late "started" message arrives after succeeded was already applied
    let changed = state.apply_job_message_status(TaskStatus::Running);
    assert!(!changed, "a late-arriving started message must not regress status");
    assert_eq!(state.status(), TaskStatus::Succeeded);
}

#[test]
fn forward_message_still_applies() {
    let mut state = TaskState::new(TaskStatus::Waiting);
    state.to_queued();
    state.to_ready();
    assert!(state.apply_job_message_status(TaskStatus::Submitted));
    assert!(state.apply_job_message_status(TaskStatus::Running));
    assert_eq!(state.status(), TaskStatus::Running);
}
