// SPDX-License-Identifier: MIT

//! Platforms and install targets (spec.md §3, §4.12).

use crate::define_scoped_id;
use serde::{Deserialize, Serialize};
use std::time::Duration;

define_scoped_id! {
    /// A platform's configured name.
    pub struct PlatformName;
}

define_scoped_id! {
    /// A filesystem-identity key shared by platforms that see the same
    /// `$HOME`; remote install work happens once per target per run.
    pub struct InstallTarget;
}

/// A batch system / job-runner implementation name (e.g. `background`,
/// `pbs`, `slurm`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRunnerName(pub String);

impl std::fmt::Display for JobRunnerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Static configuration for a submission target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub name: PlatformName,
    /// Candidate hosts in priority order; host selection picks among these.
    pub hosts: Vec<String>,
    pub install_target: InstallTarget,
    pub ssh_command: String,
    pub job_runner: JobRunnerName,
    pub owner: Option<String>,
    /// Base execution-poll intervals, before any execution-time-limit
    /// extension (spec.md §4.11).
    pub execution_polling_intervals: Vec<Duration>,
    pub execution_time_limit_polling_intervals: Vec<Duration>,
    pub submission_polling_intervals: Vec<Duration>,
    pub submission_timeout: Option<Duration>,
    pub execution_timeout: Option<Duration>,
    pub retrieve_job_logs: bool,
    pub retrieve_job_logs_retry_delays: Vec<Duration>,
    /// Per-submit/poll/kill SSH invocation timeout.
    pub remote_timeout: Duration,
}

impl Platform {
    pub fn is_localhost(&self) -> bool {
        self.install_target.as_str() == "localhost"
    }
}

#[cfg(test)]
#[path = "platform_tests.rs"]
mod tests;
