// SPDX-License-Identifier: MIT

//! A minimal TOML loader from `[[tasks]]` entries into [`cylc_core::TaskDefinition`]s.
//!
//! This is not a graph compiler: it has no notion of the `graph { ... }`
//! section syntax real Cylc suites use, just a flat declaration of each
//! task's sequence and prerequisites. It exists so tests and local
//! experimentation can build a [`WorkflowConfig`] without hand-writing
//! [`TaskDefinition`]s field by field.

use crate::config::WorkflowConfig;
use crate::errors::RunbookError;
use cylc_core::cycle_point::{BadPoint, BadSequence, Calendar, CycleOffset, CyclePoint};
use cylc_core::task_def::{PrereqConjunctionTemplate, PrereqEntryTemplate};
use cylc_core::{InstallTarget, JobRunnerName, Platform, PlatformName, RuntimeConfig, Sequence, TaskDefinition};
use indexmap::IndexMap;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    tasks: Vec<RawTask>,
    #[serde(default)]
    platforms: IndexMap<String, RawPlatform>,
}

#[derive(Debug, Deserialize)]
struct RawTask {
    name: String,
    #[serde(default)]
    queue: Option<String>,
    #[serde(default)]
    spawn_ahead: bool,
    #[serde(default)]
    script: Option<String>,
    #[serde(default)]
    platform: Option<String>,
    sequence_start: String,
    sequence_step: String,
    #[serde(default)]
    sequence_bound: Option<String>,
    #[serde(default)]
    prerequisites: Vec<Vec<String>>,
    #[serde(default)]
    suicide_prerequisites: Vec<Vec<String>>,
    #[serde(default)]
    outputs: Vec<(String, String)>,
    #[serde(default)]
    env: IndexMap<String, String>,
    #[serde(default)]
    directives: IndexMap<String, String>,
    #[serde(default)]
    submission_retry_delays: Vec<String>,
    #[serde(default)]
    execution_retry_delays: Vec<String>,
    #[serde(default)]
    execution_time_limit: Option<String>,
    #[serde(default)]
    clock_offset: Option<String>,
    #[serde(default)]
    expire_offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPlatform {
    #[serde(default)]
    hosts: Vec<String>,
    #[serde(default)]
    install_target: Option<String>,
    #[serde(default = "default_ssh_command")]
    ssh_command: String,
    #[serde(default = "default_job_runner")]
    job_runner: String,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    retrieve_job_logs: bool,
}

fn default_ssh_command() -> String {
    "ssh".to_string()
}

fn default_job_runner() -> String {
    "background".to_string()
}

/// Parse a TOML workflow definition into a [`WorkflowConfig`].
pub fn load_str(contents: &str) -> Result<WorkflowConfig, RunbookError> {
    let raw: RawDocument = toml::from_str(contents)?;
    let known_tasks: std::collections::HashSet<&str> = raw.tasks.iter().map(|t| t.name.as_str()).collect();

    let mut config = WorkflowConfig::new(raw.name);

    for (platform_name, raw_platform) in &raw.platforms {
        let install_target = raw_platform.install_target.clone().unwrap_or_else(|| platform_name.clone());
        let platform = Platform {
            name: PlatformName::new(platform_name.clone()),
            hosts: if raw_platform.hosts.is_empty() { vec![platform_name.clone()] } else { raw_platform.hosts.clone() },
            install_target: InstallTarget::new(install_target),
            ssh_command: raw_platform.ssh_command.clone(),
            job_runner: JobRunnerName(raw_platform.job_runner.clone()),
            owner: raw_platform.owner.clone(),
            execution_polling_intervals: Vec::new(),
            execution_time_limit_polling_intervals: Vec::new(),
            submission_polling_intervals: Vec::new(),
            submission_timeout: None,
            execution_timeout: None,
            retrieve_job_logs: raw_platform.retrieve_job_logs,
            retrieve_job_logs_retry_delays: Vec::new(),
            remote_timeout: Duration::from_secs(60),
        };
        config.platforms.insert(platform.name.clone(), platform);
    }

    for raw_task in raw.tasks {
        let def = build_task_definition(raw_task, &known_tasks)?;
        config.tasks.insert(def.name.clone(), def);
    }

    Ok(config)
}

fn build_task_definition(raw: RawTask, known_tasks: &std::collections::HashSet<&str>) -> Result<TaskDefinition, RunbookError> {
    let name = raw.name;
    let start = parse_point(&raw.sequence_start, &name)?;
    let step = parse_offset(&raw.sequence_step, &name)?;
    let mut sequence = Sequence::new(start, step).map_err(|source| RunbookError::BadOffset { task: name.clone(), source })?;
    if let Some(bound) = &raw.sequence_bound {
        sequence = sequence.with_bound(parse_point(bound, &name)?);
    }

    let mut def = TaskDefinition::new(name.clone());
    def.sequences = vec![sequence];
    def.queue = raw.queue.unwrap_or_else(|| cylc_core::task_def::DEFAULT_QUEUE.to_string());
    def.spawn_ahead = raw.spawn_ahead;
    def.outputs = raw.outputs;

    def.prerequisites = parse_conjunctions(&raw.prerequisites, &name, known_tasks)?;
    def.suicide_prerequisites = parse_conjunctions(&raw.suicide_prerequisites, &name, known_tasks)?;

    if let Some(offset) = &raw.clock_offset {
        def.clock_offset = Some(parse_offset(offset, &name)?);
    }
    if let Some(offset) = &raw.expire_offset {
        def.expire_offset = Some(parse_offset(offset, &name)?);
    }

    let mut runtime = RuntimeConfig { script: raw.script, env: raw.env, directives: raw.directives, platform: raw.platform, ..RuntimeConfig::default() };
    for delay in &raw.submission_retry_delays {
        runtime.submission_retry_delays.push(parse_duration(delay, &name)?);
    }
    for delay in &raw.execution_retry_delays {
        runtime.execution_retry_delays.push(parse_duration(delay, &name)?);
    }
    if let Some(limit) = &raw.execution_time_limit {
        runtime.execution_time_limit = Some(parse_duration(limit, &name)?);
    }
    def.runtime = runtime;

    if def.sequences.is_empty() {
        return Err(RunbookError::MissingSequence(name));
    }
    Ok(def)
}

fn parse_conjunctions(
    raw: &[Vec<String>],
    task_name: &str,
    known_tasks: &std::collections::HashSet<&str>,
) -> Result<Vec<PrereqConjunctionTemplate>, RunbookError> {
    raw.iter()
        .map(|conjunction| {
            let entries = conjunction
                .iter()
                .map(|entry| parse_prereq_entry(entry, task_name, known_tasks))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(PrereqConjunctionTemplate { entries })
        })
        .collect()
}

/// Parse one `name[offset]:message` prerequisite reference. The offset is
/// optional and defaults to the zero offset (the owning task's own point).
fn parse_prereq_entry(
    entry: &str,
    task_name: &str,
    known_tasks: &std::collections::HashSet<&str>,
) -> Result<PrereqEntryTemplate, RunbookError> {
    let (task_ref, message) =
        entry.rsplit_once(':').ok_or_else(|| RunbookError::BadPrereqEntry(entry.to_string(), task_name.to_string()))?;

    let (referenced_task, offset) = match task_ref.split_once('[') {
        Some((base, rest)) => {
            let offset_str =
                rest.strip_suffix(']').ok_or_else(|| RunbookError::BadPrereqEntry(entry.to_string(), task_name.to_string()))?;
            (base, parse_offset(offset_str, task_name)?)
        }
        None => (task_ref, CycleOffset::default()),
    };

    if !known_tasks.contains(referenced_task) {
        return Err(RunbookError::UnknownPrerequisiteTask(task_name.to_string(), referenced_task.to_string()));
    }

    Ok(PrereqEntryTemplate { task_name: referenced_task.to_string(), offset, message: message.to_string() })
}

fn parse_point(s: &str, task_name: &str) -> Result<CyclePoint, RunbookError> {
    CyclePoint::parse(s, Calendar::Gregorian).map_err(|source: BadPoint| RunbookError::BadCyclePoint { task: task_name.to_string(), source })
}

fn parse_offset(s: &str, task_name: &str) -> Result<CycleOffset, RunbookError> {
    CycleOffset::parse(s).map_err(|source: BadSequence| RunbookError::BadOffset { task: task_name.to_string(), source })
}

fn parse_duration(s: &str, task_name: &str) -> Result<Duration, RunbookError> {
    let offset = parse_offset(s, task_name)?;
    Ok(Duration::from_secs(offset.total_seconds_approx().max(0) as u64))
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
