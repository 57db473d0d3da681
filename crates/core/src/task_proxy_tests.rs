use super::*;
use crate::cycle_point::Calendar;
use crate::prerequisite::{Conjunction, PrereqKey};
use crate::task_def::TaskDefinition;
use std::collections::HashSet;

fn point(h: u32) -> CyclePoint {
    CyclePoint::new(Calendar::Gregorian, 2020, 1, 1, h, 0, 0)
}

#[test]
fn is_ready_requires_prerequisites_satisfied() {
    let def = TaskDefinition::new("foo");
    let mut proxy = TaskProxy::new(&def, point(0), None, 0);
    proxy.prerequisites.push(crate::prerequisite::Prerequisite::new(vec![Conjunction::new([
        PrereqKey::new("bar", point(0), "succeeded"),
    ])]));
    assert!(!proxy.is_ready());

    let mut completed = HashSet::new();
    completed.insert(PrereqKey::new("bar", point(0), "succeeded"));
    proxy.prerequisites[0].match_completed(&completed);
    assert!(proxy.is_ready());
}

#[test]
fn held_proxy_is_never_ready() {
    let def = TaskDefinition::new("foo");
    let mut proxy = TaskProxy::new(&def, point(0), None, 0);
    proxy.hold();
    assert!(!proxy.is_ready());
}

#[test]
fn hold_then_release_restores_queued_status() {
    let def = TaskDefinition::new("foo");
    let mut proxy = TaskProxy::new(&def, point(0), None, 0);
    proxy.state_mut().to_queued();
    proxy.hold();
    assert_eq!(proxy.status(), TaskStatus::Waiting);
    assert!(proxy.is_held());
    proxy.release();
    assert_eq!(proxy.status(), TaskStatus::Queued);
    assert!(!proxy.is_held());
}

#[test]
fn unsatisfied_xclock_blocks_readiness() {
    let mut def = TaskDefinition::new("foo");
    def.clock_offset = Some(crate::cycle_point::CycleOffset::zero());
    let proxy = TaskProxy::new(&def, point(0), None, 0);
    assert!(!proxy.is_ready(), "xclock starts unsatisfied");
}

#[test]
fn advance_to_next_point_builds_fresh_instance() {
    let def = TaskDefinition::new("foo");
    let seq = Sequence::new(point(0), crate::cycle_point::CycleOffset::hours(1)).unwrap();
    let proxy = TaskProxy::new(&def, point(0), None, 3);
    let next = proxy.advance_to_next_point(&seq, &def).expect("sequence has a next point");
    assert_eq!(next.point, point(1));
    assert_eq!(next.submit_num, 0);
    assert_eq!(next.status(), TaskStatus::Waiting);
}

#[test]
fn try_num_is_one_based() {
    let def = TaskDefinition::new("foo");
    let proxy = TaskProxy::new(&def, point(0), None, 0);
    assert_eq!(proxy.try_num(), 1);
}
