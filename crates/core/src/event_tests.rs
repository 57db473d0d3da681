use super::*;
use crate::cycle_point::Calendar;

#[test]
fn event_round_trips_through_json() {
    let id = TaskInstanceId {
        name: "foo".to_string(),
        point: CyclePoint::new(Calendar::Gregorian, 2020, 1, 1, 0, 0, 0),
    };
    let event = Event::StatusChanged { id, status: TaskStatus::Running };
    let encoded = serde_json::to_string(&event).unwrap();
    let decoded: Event = serde_json::from_str(&encoded).unwrap();
    assert_eq!(event, decoded);
}
