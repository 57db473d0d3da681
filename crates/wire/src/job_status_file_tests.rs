use super::*;

#[test]
fn parse_then_render_round_trips_known_fields() {
    let contents = "\
CYLC_BATCH_SYS_NAME=background
CYLC_BATCH_SYS_JOB_ID=4821
CYLC_JOB_PID=4821
CYLC_JOB_EXIT=SUCCEEDED
CYLC_MESSAGE=started
CYLC_MESSAGE=succeeded
";
    let file = JobStatusFile::parse(contents);
    assert_eq!(file.batch_sys_name.as_deref(), Some("background"));
    assert_eq!(file.job_exit, Some(JobExit::Succeeded));
    assert_eq!(file.messages, vec!["started".to_string(), "succeeded".to_string()]);

    let rendered = JobStatusFile::parse(&file.render());
    assert_eq!(rendered, file);
}

#[test]
fn signal_exit_is_preserved_verbatim() {
    let file = JobStatusFile::parse("CYLC_JOB_EXIT=ERR/SIGTERM\n");
    assert_eq!(file.job_exit, Some(JobExit::Signal("ERR/SIGTERM".to_string())));
}

#[test]
fn order_of_lines_does_not_matter_except_message_order() {
    let a = JobStatusFile::parse("CYLC_JOB_PID=1\nCYLC_BATCH_SYS_NAME=background\n");
    let b = JobStatusFile::parse("CYLC_BATCH_SYS_NAME=background\nCYLC_JOB_PID=1\n");
    assert_eq!(a, b);
}

#[test]
fn unknown_keys_are_ignored() {
    let file = JobStatusFile::parse("SOME_FUTURE_KEY=value\nCYLC_JOB_PID=1\n");
    assert_eq!(file.job_pid.as_deref(), Some("1"));
}
