use super::*;

#[test]
fn chunk_batches_caps_batch_size_near_100() {
    let items: Vec<u32> = (0..250).collect();
    let batches = chunk_batches(items);
    assert!(batches.iter().all(|b| b.len() <= 100));
    assert_eq!(batches.iter().map(Vec::len).sum::<usize>(), 250);
}

#[test]
fn chunk_batches_of_small_input_is_one_batch() {
    let items = vec![1, 2, 3];
    let batches = chunk_batches(items);
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 3);
}

#[test]
fn job_log_dir_pads_submit_num_to_two_digits() {
    assert_eq!(job_log_dir("2020-01-01T00", "foo", 3), "2020-01-01T00/foo/03");
    assert_eq!(job_log_dir("2020-01-01T00", "foo", 12), "2020-01-01T00/foo/12");
}

#[test]
fn submit_outcome_resolves_per_spec_table() {
    let ok = SubmitOutcome { log_dir: "d".to_string(), rc: 0, batch_job_id: Some("123".to_string()) };
    assert_eq!(ok.resolve(), SubmitResolution::Submitted);

    let no_id = SubmitOutcome { log_dir: "d".to_string(), rc: 0, batch_job_id: None };
    assert_eq!(no_id.resolve(), SubmitResolution::SubmitFailed);

    let bad_rc = SubmitOutcome { log_dir: "d".to_string(), rc: 1, batch_job_id: Some("123".to_string()) };
    assert_eq!(bad_rc.resolve(), SubmitResolution::SubmitFailed);
}

#[test]
fn parse_jobs_output_skips_malformed_lines_without_failing() {
    let stdout = "garbage line\n[TASK JOB SUMMARY]2020-01-01T00:00:00Z|2020/foo/01|0|123\n";
    let lines = parse_jobs_output(stdout);
    assert_eq!(lines.len(), 1);
    let outcomes = extract_submit_outcomes(&lines);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].batch_job_id.as_deref(), Some("123"));
}

#[test]
fn jobs_submit_argv_includes_remote_mode_flag_when_set() {
    let argv = jobs_submit_argv("run/log", &["2020/foo/01".to_string()], true);
    assert!(argv.contains(&"--remote-mode".to_string()));
    assert_eq!(argv.last().unwrap(), "2020/foo/01");
}
