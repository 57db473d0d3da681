use super::*;

#[test]
fn standard_messages_are_auto_inserted() {
    let outputs = Outputs::new(std::iter::empty());
    for msg in STANDARD_MESSAGES {
        assert!(outputs.is_known(msg), "{msg} should be known");
    }
}

#[test]
fn declared_outputs_are_known_too() {
    let outputs = Outputs::new(["data-ready".to_string()]);
    assert!(outputs.is_known("data-ready"));
}

#[test]
fn set_completed_rejects_unknown_message() {
    let mut outputs = Outputs::new(std::iter::empty());
    assert!(matches!(outputs.set_completed("bogus", true), Err(UnknownOutput(_))));
}

#[test]
fn all_completed_requires_every_declared_message() {
    let mut outputs = Outputs::new(["a".to_string(), "b".to_string()]);
    outputs.set_completed("a", true).unwrap();
    assert!(!outputs.all_completed());
    outputs.set_completed("b", true).unwrap();
    assert!(!outputs.all_completed()); // standard messages still incomplete
}

#[test]
fn completed_messages_preserve_insertion_order() {
    let mut outputs = Outputs::new(["x".to_string(), "y".to_string()]);
    outputs.set_completed("y", true).unwrap();
    outputs.set_completed("x", true).unwrap();
    let completed: Vec<&str> = outputs.completed_messages().collect();
    // insertion order is x, y (declared order), not completion order
    assert_eq!(completed, vec!["x", "y"]);
}
