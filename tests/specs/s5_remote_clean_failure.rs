// SPDX-License-Identifier: MIT

//! S5: cleaning a workflow that ran on remote platforms fans the clean
//! command out over SSH to every remote install target and reports
//! which ones it couldn't reach, rather than silently succeeding
//! (spec.md §6 "Clean", §4.12).

use cylc_core::platform::{InstallTarget, JobRunnerName, Platform, PlatformName};
use cylc_engine::clean::remote_clean;
use cylc_engine::errors::CleanError;
use cylc_engine::CleanRequest;
use std::path::Path;
use std::time::Duration;

fn unreachable_platform(install_target: &str) -> Platform {
    Platform {
        name: PlatformName::new(install_target),
        hosts: vec!["unreachable.invalid".to_string()],
        install_target: InstallTarget::new(install_target),
        ssh_command: "/nonexistent/ssh-binary-for-tests".to_string(),
        job_runner: JobRunnerName("background".to_string()),
        owner: None,
        execution_polling_intervals: vec![],
        execution_time_limit_polling_intervals: vec![],
        submission_polling_intervals: vec![],
        submission_timeout: None,
        execution_timeout: None,
        retrieve_job_logs: false,
        retrieve_job_logs_retry_delays: vec![],
        remote_timeout: Duration::from_millis(500),
    }
}

fn request() -> CleanRequest {
    CleanRequest {
        workflow: "flow_a".to_string(),
        cylc_run_root: Path::new("/tmp").to_path_buf(),
        rm_patterns: vec![],
        local_only: false,
        remote_only: true,
        remote_timeout: Duration::from_millis(500),
    }
}

#[tokio::test]
async fn clean_reports_every_unreachable_install_target_rather_than_succeeding_silently() {
    let platforms = vec![unreachable_platform("hpc-a"), unreachable_platform("hpc-b")];
    let req = request();

    let err = remote_clean(&req, platforms).await.unwrap_err();
    match err {
        CleanError::RemoteCleanFailed(mut targets) => {
            targets.sort();
            assert_eq!(targets, vec!["hpc-a".to_string(), "hpc-b".to_string()]);
        }
        other => panic!("expected RemoteCleanFailed, got {other:?}"),
    }
}
