use super::*;

#[test]
fn sub_proc_context_starts_with_empty_env_and_ids() {
    let ctx = SubProcContext::new("jobs-submit", vec!["cylc".to_string(), "jobs-submit".to_string()]);
    assert!(ctx.env.is_empty());
    assert!(ctx.id_keys.is_empty());
    assert_eq!(ctx.cmd_key, "jobs-submit");
}

#[test]
fn effect_round_trips_through_json() {
    let effect = SchedulerEffect::ReplyToCommand {
        command_id: "abc".to_string(),
        ok: true,
        message: "done".to_string(),
    };
    let encoded = serde_json::to_string(&effect).unwrap();
    let decoded: SchedulerEffect = serde_json::from_str(&encoded).unwrap();
    assert_eq!(effect, decoded);
}
