use super::*;

fn key(f: &str) -> XtriggerCacheKey {
    XtriggerCacheKey { func_name: f.to_string(), args: vec![] }
}

#[test]
fn collate_dedupes_shared_cache_keys() {
    let mgr = XtriggerManager::new();
    let pending = vec![key("echo"), key("echo"), key("suntime")];
    let collated = mgr.collate(pending.iter());
    assert_eq!(collated.len(), 2);
}

#[test]
fn collate_skips_already_cached_keys() {
    let mut mgr = XtriggerManager::new();
    mgr.record_result(
        key("echo"),
        XtriggerResult { satisfied: true, data: serde_json::Value::Null },
    );
    let pending = vec![key("echo"), key("suntime")];
    let collated = mgr.collate(pending.iter());
    assert_eq!(collated, vec![key("suntime")]);
}

#[test]
fn clear_consumed_drops_cache_entries() {
    let mut mgr = XtriggerManager::new();
    mgr.record_result(
        key("echo"),
        XtriggerResult { satisfied: true, data: serde_json::Value::Null },
    );
    mgr.clear_consumed([key("echo")]);
    assert!(mgr.result(&key("echo")).is_none());
}

#[test]
fn clock_trigger_satisfied_once_due_has_passed() {
    let now = Instant::now();
    let due = now + std::time::Duration::from_secs(5);
    assert!(!satisfy_clock(due, now));
    assert!(satisfy_clock(due, due));
}
