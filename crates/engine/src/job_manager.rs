// SPDX-License-Identifier: MIT

//! Job preparation, submission grouping, and poll/kill dispatch
//! (spec.md §4.10). `JobManager` builds the subprocess requests the
//! scheduler hands to `SubProcPool`/SSH; it never runs a process itself.

use crate::errors::ProtocolError;
use cylc_adapters::batch_system::{BatchSystemRegistry, JobConfig};
use cylc_core::{Platform, SubProcContext, TaskProxy};
use cylc_wire::jobs_output::{parse_jobs_output_line, JobsOutputLine};
use indexmap::IndexMap;

/// One outcome of parsing a submit-summary stream (spec.md §4.10 step 4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub log_dir: String,
    pub rc: i32,
    pub batch_job_id: Option<String>,
}

/// Failure semantics table from spec.md §4.10.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitResolution {
    Submitted,
    SubmitFailed,
}

impl SubmitOutcome {
    pub fn resolve(&self) -> SubmitResolution {
        if self.rc == 0 && self.batch_job_id.is_some() {
            SubmitResolution::Submitted
        } else {
            SubmitResolution::SubmitFailed
        }
    }
}

/// Groups ready proxies into per-`(host, owner)` batches, each capped at
/// `ceil(n / (n/100 + 1))` to avoid stdio overflow (spec.md §4.10 step 2).
pub fn chunk_batches<T>(items: Vec<T>) -> Vec<Vec<T>> {
    let n = items.len();
    if n == 0 {
        return Vec::new();
    }
    let batch_size = n.div_ceil(n / 100 + 1).max(1);
    let mut batches: Vec<Vec<T>> = Vec::new();
    let mut current: Vec<T> = Vec::new();
    for item in items {
        if current.len() >= batch_size {
            batches.push(std::mem::take(&mut current));
        }
        current.push(item);
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

/// `<point>/<name>/NN`, NN zero-padded to 2 digits (spec.md §6).
pub fn job_log_dir(point: &str, name: &str, submit_num: u32) -> String {
    format!("{point}/{name}/{submit_num:02}")
}

/// Build the argv for `cylc jobs-submit` (spec.md §6).
pub fn jobs_submit_argv(log_root: &str, job_log_dirs: &[String], remote_mode: bool) -> Vec<String> {
    let mut argv = vec!["cylc".to_string(), "jobs-submit".to_string()];
    if remote_mode {
        argv.push("--remote-mode".to_string());
    }
    argv.push("--".to_string());
    argv.push(log_root.to_string());
    argv.extend(job_log_dirs.iter().cloned());
    argv
}

pub fn jobs_poll_argv(log_root: &str, job_log_dirs: &[String]) -> Vec<String> {
    let mut argv = vec!["cylc".to_string(), "jobs-poll".to_string(), "--".to_string(), log_root.to_string()];
    argv.extend(job_log_dirs.iter().cloned());
    argv
}

/// Parse every line of a `jobs-submit`/`jobs-poll` stdout stream,
/// returning the classified lines and logging (not failing on) anything
/// that doesn't parse (spec.md §7 "Protocol").
pub fn parse_jobs_output(stdout: &str) -> Vec<JobsOutputLine> {
    stdout
        .lines()
        .filter_map(|line| match parse_jobs_output_line(line) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!(error = %e, line, "skipping malformed jobs-output line");
                None
            }
        })
        .collect()
}

pub fn extract_submit_outcomes(lines: &[JobsOutputLine]) -> Vec<SubmitOutcome> {
    lines
        .iter()
        .filter_map(|line| match line {
            JobsOutputLine::Summary { log_dir, rc, batch_job_id, .. } => {
                Some(SubmitOutcome { log_dir: log_dir.clone(), rc: *rc, batch_job_id: batch_job_id.clone() })
            }
            _ => None,
        })
        .collect()
}

/// `JobManager::prepare` (spec.md §4.10): compute the `JobConfig` for a
/// ready proxy and bump its submit number. The caller is responsible for
/// writing the job file and log-dir layout (filesystem side effects are
/// out of this crate's scope per spec.md §1).
pub fn prepare(proxy: &mut TaskProxy, script: String, env: IndexMap<String, String>, directives: IndexMap<String, String>, execution_time_limit_seconds: Option<u64>) -> JobConfig {
    proxy.submit_num += 1;
    JobConfig {
        task_name: proxy.name.clone(),
        point: proxy.point.to_string(),
        submit_num: proxy.submit_num,
        script,
        env,
        directives,
        execution_time_limit_seconds,
    }
}

/// Assemble the `SubProcContext` for one submit batch against a batch
/// system (spec.md §4.10 step 3). `remote_mode` selects whether job file
/// contents are framed on stdin (remote) or referenced by path (local).
pub fn build_submit_context(
    registry: &BatchSystemRegistry,
    platform: &Platform,
    log_root: &str,
    job_log_dirs: Vec<String>,
    stdin: Option<String>,
) -> Result<SubProcContext, ProtocolError> {
    let remote_mode = !platform.is_localhost();
    if registry.get(platform.job_runner.to_string().as_str()).is_none() {
        return Err(ProtocolError::MalformedSummary(format!("unregistered batch system {}", platform.job_runner)));
    }
    let argv = jobs_submit_argv(log_root, &job_log_dirs, remote_mode);
    let mut ctx = SubProcContext::new("jobs-submit", argv);
    ctx.stdin_str = stdin;
    ctx.id_keys = job_log_dirs;
    Ok(ctx)
}

#[cfg(test)]
#[path = "job_manager_tests.rs"]
mod tests;
