use super::*;

#[test]
fn group_by_host_user_partitions_correctly() {
    let items = vec![("a", "h1", None), ("b", "h1", None), ("c", "h2", Some("bob"))];
    let groups = group_by_host_user(items, |(_, host, user): &(&str, &str, Option<&str>)| {
        (host.to_string(), user.map(str::to_string))
    });
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[&("h1".to_string(), None)].len(), 2);
    assert_eq!(groups[&("h2".to_string(), Some("bob".to_string()))].len(), 1);
}

#[tokio::test]
async fn run_reports_transport_failure_on_rc_255() {
    let fanout = SshFanout::new();
    let invocation = SshInvocation {
        ssh_command: "sh".to_string(),
        host: "localhost".to_string(),
        user: None,
        remote_argv: vec!["-c".to_string(), "exit 255".to_string()],
        stdin: None,
        timeout: Duration::from_secs(5),
    };
    let outcome = fanout.run(&invocation).await.unwrap();
    assert!(outcome.is_transport_failure());
}

#[tokio::test]
async fn run_returns_ok_rc_for_non_transport_exit() {
    let fanout = SshFanout::new();
    let invocation = SshInvocation {
        ssh_command: "sh".to_string(),
        host: "localhost".to_string(),
        user: None,
        remote_argv: vec!["-c".to_string(), "echo hi; exit 3".to_string()],
        stdin: None,
        timeout: Duration::from_secs(5),
    };
    let outcome = fanout.run(&invocation).await.unwrap();
    match outcome {
        SshOutcome::Ran { rc, stdout, .. } => {
            assert_eq!(rc, 3);
            assert_eq!(stdout.trim(), "hi");
        }
        SshOutcome::TransportFailure { .. } => panic!("expected a non-transport outcome"),
    }
}

#[tokio::test]
async fn run_times_out_on_a_slow_command() {
    let fanout = SshFanout::new();
    let invocation = SshInvocation {
        ssh_command: "sh".to_string(),
        host: "localhost".to_string(),
        user: None,
        remote_argv: vec!["-c".to_string(), "sleep 5".to_string()],
        stdin: None,
        timeout: Duration::from_millis(50),
    };
    let err = fanout.run(&invocation).await.unwrap_err();
    assert!(matches!(err, SshError::Timeout(_)));
}
