// SPDX-License-Identifier: MIT

//! The batch-system registry (spec.md §4.9, §9 "Dynamic dispatch"):
//! source languages reach for a batch system by importing a module named
//! after it; here each batch system is a value implementing a fixed
//! capability trait, looked up in a `HashMap` built at scheduler startup.

mod background;
mod pbs_like;

pub use background::BackgroundBatchSystem;
pub use pbs_like::PbsLikeBatchSystem;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Everything a batch system needs to format a job submission for one task
/// instance. Built by `JobManager::prepare` from the task's runtime config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    pub task_name: String,
    pub point: String,
    pub submit_num: u32,
    pub script: String,
    pub env: IndexMap<String, String>,
    pub directives: IndexMap<String, String>,
    pub execution_time_limit_seconds: Option<u64>,
}

/// Signals trapped by default when a batch system declares none of its own.
pub fn default_fail_signals() -> Vec<String> {
    vec!["EXIT".to_string(), "ERR".to_string(), "TERM".to_string(), "XCPU".to_string()]
}

/// A fixed capability set (spec.md §4.9 table). Capabilities a batch
/// system doesn't support return `None`/the documented default rather
/// than being absent as a method — Rust has no attribute-lookup fallback,
/// so every method exists; "absence" is expressed through its return
/// value instead.
pub trait BatchSystem: Send + Sync {
    fn name(&self) -> &str;

    /// Header lines prepended to the rendered job script.
    fn format_directives(&self, job: &JobConfig) -> Vec<String>;

    /// Signals to trap inside the job script; default `{EXIT,ERR,TERM,XCPU}`.
    fn fail_signals(&self) -> Vec<String> {
        default_fail_signals()
    }

    /// The signal that, if received, means "vacated" (job pre-empted, not failed).
    fn vacation_signal(&self) -> Option<&str> {
        None
    }

    /// `"bsub < %{job}"`-style submit command template, `%{job}` replaced
    /// with the job file path. `None` means the runner has no single
    /// template and the caller must use `submit_argv`.
    fn submit_cmd_template(&self) -> Option<&str> {
        None
    }

    /// The argv used to submit a job file directly (the common case).
    fn submit_argv(&self, job_path: &str) -> Vec<String>;

    /// Extra environment variables layered onto the submit command's env.
    fn submit_cmd_env(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    /// Pull a batch job id out of the submit command's stdout.
    fn extract_job_id_from_stdout(&self, stdout: &str) -> Option<String>;

    /// Pull a batch job id out of the submit command's stderr, for runners
    /// that report it there instead (or as well).
    fn extract_job_id_from_stderr(&self, _stderr: &str) -> Option<String> {
        None
    }

    /// Canonicalize a raw job id (e.g. strip a cluster suffix).
    fn manip_job_id(&self, id: &str) -> String {
        id.to_string()
    }

    /// Strip submit-command banner noise before logging.
    fn filter_submit_output<'a>(&self, out: &'a str, err: &'a str) -> (&'a str, &'a str) {
        (out, err)
    }

    /// Preferred: poll many ids in one command. `None` means the caller
    /// should fall back to one invocation of `poll_cmd` per id.
    fn poll_many_argv(&self, _ids: &[String]) -> Option<Vec<String>> {
        None
    }

    fn poll_cmd(&self) -> Option<&str> {
        None
    }

    /// Parse poll output into the set of ids still running. Default:
    /// first whitespace-delimited column, skipping a one-line header.
    fn filter_poll_many_output(&self, stdout: &str) -> Vec<String> {
        stdout
            .lines()
            .skip(1)
            .filter_map(|line| line.split_whitespace().next())
            .map(str::to_string)
            .collect()
    }

    /// If poll stderr contains this and the command's rc is nonzero, the
    /// poll result is untrusted: jobs retain their prior recorded state.
    fn poll_cant_connect_err_substring(&self) -> Option<&str> {
        None
    }

    fn kill_argv(&self, id: &str) -> Vec<String>;

    /// Kill by process-group id rather than by the batch job id directly
    /// (meaningful for the `background` runner only).
    fn should_kill_proc_group(&self) -> bool {
        false
    }

    /// Poll by PID in addition to the batch job id (same caveat).
    fn should_poll_proc_group(&self) -> bool {
        false
    }
}

/// Registry of batch systems by name, built once at scheduler startup from
/// `SchedulerConfig` and shared read-only thereafter.
#[derive(Default)]
pub struct BatchSystemRegistry {
    systems: HashMap<String, Box<dyn BatchSystem>>,
}

impl BatchSystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry `background` is always present in (spec.md §4.9: "local
    /// fork/exec, always present").
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(BackgroundBatchSystem));
        registry
    }

    pub fn register(&mut self, system: Box<dyn BatchSystem>) {
        self.systems.insert(system.name().to_string(), system);
    }

    pub fn get(&self, name: &str) -> Option<&dyn BatchSystem> {
        self.systems.get(name).map(|b| b.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.systems.keys().map(String::as_str)
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
