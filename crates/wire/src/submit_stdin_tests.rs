use super::*;

#[test]
fn frame_then_parse_round_trips() {
    let content = "#!/bin/bash\necho hello\n";
    let framed = frame_job_file("2020-01-01T00/foo/01", content, "/remote/cylc");
    let parsed = parse_framed_stdin(&framed).unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].log_dir, "2020-01-01T00/foo/01");
    assert_eq!(parsed[0].content, content);
}

#[test]
fn cylc_dir_export_is_rewritten_for_the_remote_host() {
    let content = "export CYLC_DIR=/local/cylc\necho hi\n";
    let framed = frame_job_file("p/n/01", content, "/remote/cylc");
    assert!(framed.contains("export CYLC_DIR=/remote/cylc"));
    assert!(!framed.contains("/local/cylc"));
}

#[test]
fn multiple_job_files_concatenate_and_parse_independently() {
    let a = frame_job_file("p/a/01", "echo a\n", "/r");
    let b = frame_job_file("p/b/01", "echo b\n", "/r");
    let parsed = parse_framed_stdin(&format!("{a}{b}")).unwrap();
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].log_dir, "p/a/01");
    assert_eq!(parsed[1].log_dir, "p/b/01");
}

#[test]
fn missing_terminator_is_an_error() {
    let broken = "# Job log directory: p/a/01\necho a\n";
    assert!(matches!(parse_framed_stdin(broken), Err(FrameParseError::MissingTerminator(_))));
}

#[test]
fn mismatched_terminator_is_an_error() {
    let broken = "# Job log directory: p/a/01\necho a\n#EOF: p/b/01\n";
    assert!(matches!(parse_framed_stdin(broken), Err(FrameParseError::MismatchedTerminator { .. })));
}
