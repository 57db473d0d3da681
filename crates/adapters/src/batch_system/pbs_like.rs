// SPDX-License-Identifier: MIT

//! `pbs-like`: a reference polling batch system against a named external
//! command, demonstrating the full poll/kill capability set (spec.md
//! §4.9) that `background` doesn't need (directives, a many-id poll
//! command, a poll-cmd-can't-connect substring).

use super::{BatchSystem, JobConfig};

/// A PBS-alike job-runner driven by the named queue commands (`qsub`,
/// `qstat`, `qdel` by default). The command names are configurable so
/// tests can point at a stub executable.
#[derive(Debug, Clone)]
pub struct PbsLikeBatchSystem {
    pub submit_cmd: String,
    pub poll_cmd: String,
    pub kill_cmd: String,
}

impl Default for PbsLikeBatchSystem {
    fn default() -> Self {
        Self { submit_cmd: "qsub".to_string(), poll_cmd: "qstat".to_string(), kill_cmd: "qdel".to_string() }
    }
}

impl BatchSystem for PbsLikeBatchSystem {
    fn name(&self) -> &str {
        "pbs-like"
    }

    fn format_directives(&self, job: &JobConfig) -> Vec<String> {
        let mut lines: Vec<String> = job.directives.iter().map(|(k, v)| format!("#PBS {k} {v}")).collect();
        if let Some(limit) = job.execution_time_limit_seconds {
            lines.push(format!("#PBS -l walltime={limit}"));
        }
        lines
    }

    fn submit_argv(&self, job_path: &str) -> Vec<String> {
        vec![self.submit_cmd.clone(), job_path.to_string()]
    }

    fn extract_job_id_from_stdout(&self, stdout: &str) -> Option<String> {
        stdout.lines().next().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
    }

    fn manip_job_id(&self, id: &str) -> String {
        id.split('.').next().unwrap_or(id).to_string()
    }

    fn poll_many_argv(&self, ids: &[String]) -> Option<Vec<String>> {
        let mut argv = vec![self.poll_cmd.clone()];
        argv.extend(ids.iter().cloned());
        Some(argv)
    }

    fn poll_cant_connect_err_substring(&self) -> Option<&str> {
        Some("cannot connect to server")
    }

    fn kill_argv(&self, id: &str) -> Vec<String> {
        vec![self.kill_cmd.clone(), id.to_string()]
    }
}
