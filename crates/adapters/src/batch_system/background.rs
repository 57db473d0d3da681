// SPDX-License-Identifier: MIT

//! `background`: the always-present local fork/exec batch system. The
//! "batch job id" is just the child's PID, so kill and poll both need the
//! process-group flags set.

use super::{BatchSystem, JobConfig};

#[derive(Debug, Default, Clone, Copy)]
pub struct BackgroundBatchSystem;

impl BatchSystem for BackgroundBatchSystem {
    fn name(&self) -> &str {
        "background"
    }

    fn format_directives(&self, _job: &JobConfig) -> Vec<String> {
        Vec::new()
    }

    fn submit_argv(&self, job_path: &str) -> Vec<String> {
        vec!["bash".to_string(), job_path.to_string(), "&".to_string(), "echo".to_string(), "$!".to_string()]
    }

    fn extract_job_id_from_stdout(&self, stdout: &str) -> Option<String> {
        stdout.lines().last().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
    }

    fn kill_argv(&self, id: &str) -> Vec<String> {
        vec!["kill".to_string(), id.to_string()]
    }

    fn should_kill_proc_group(&self) -> bool {
        true
    }

    fn should_poll_proc_group(&self) -> bool {
        true
    }
}
