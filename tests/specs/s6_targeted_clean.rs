// SPDX-License-Identifier: MIT

//! S6: `cylc clean --rm PATTERN` removes only what the glob pattern
//! matches under the run directory, leaving the rest of the run dir
//! intact (spec.md §6 "Clean").

use cylc_engine::clean::targeted_clean;
use cylc_engine::{CleanRequest, SymlinkDirs};
use std::fs;
use std::time::Duration;

fn request(root: &std::path::Path, patterns: &[&str]) -> CleanRequest {
    CleanRequest {
        workflow: "flow_a".to_string(),
        cylc_run_root: root.to_path_buf(),
        rm_patterns: patterns.iter().map(|s| s.to_string()).collect(),
        local_only: true,
        remote_only: false,
        remote_timeout: Duration::from_secs(20),
    }
}

#[test]
fn rm_pattern_removes_only_the_matched_subtree() {
    let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let run_dir = tmp.path().join("flow_a");
    fs::create_dir_all(run_dir.join("work/1")).unwrap_or_else(|e| panic!("mkdir: {e}"));
    fs::create_dir_all(run_dir.join("share")).unwrap_or_else(|e| panic!("mkdir: {e}"));
    fs::write(run_dir.join("work/1/job.status"), b"running").unwrap_or_else(|e| panic!("write: {e}"));
    fs::write(run_dir.join("share/data.nc"), b"keep me").unwrap_or_else(|e| panic!("write: {e}"));

    let req = request(tmp.path(), &["work"]);
    let removed = targeted_clean(&req, &SymlinkDirs::default()).unwrap_or_else(|e| panic!("targeted_clean: {e}"));

    assert_eq!(removed, vec![run_dir.join("work")]);
    assert!(!run_dir.join("work").exists(), "the matched subtree should be gone");
    assert!(run_dir.join("share").exists(), "unrelated siblings must survive");
    assert!(run_dir.exists(), "a targeted clean never removes the run dir itself");
}

#[test]
fn multiple_rm_patterns_matching_the_same_subtree_are_deduplicated() {
    let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let run_dir = tmp.path().join("flow_a");
    fs::create_dir_all(run_dir.join("log/job/1")).unwrap_or_else(|e| panic!("mkdir: {e}"));

    let req = request(tmp.path(), &["log", "log/job", "log/job/1"]);
    let removed = targeted_clean(&req, &SymlinkDirs::default()).unwrap_or_else(|e| panic!("targeted_clean: {e}"));

    assert_eq!(removed, vec![run_dir.join("log")], "only the shallowest match should be reported");
    assert!(!run_dir.join("log").exists());
}
