// SPDX-License-Identifier: MIT

//! `cylcd` — the scheduler process for one workflow run.
//!
//! Owns a single [`Scheduler`] on the main task and drives it through
//! spec.md §4.14's tick loop: subprocess completions come back through a
//! [`SubProcPool`], are translated into [`Inbox`] messages, and every
//! effect the tick emits is executed here (subprocess dispatch, mail,
//! command replies) — the engine itself never touches the outside world.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{Datelike, Timelike};
use cylc_adapters::batch_system::BatchSystemRegistry;
use cylc_adapters::SubProcPool;
use cylc_core::cycle_point::{Calendar, CyclePoint};
use cylc_core::effect::SchedulerEffect;
use cylc_engine::{Inbox, IncomingMessage, Scheduler};
use cylc_runbook::WorkflowConfig;
use cylc_storage::Wal;
use cylc_wire::jobs_output::{parse_jobs_output_line, JobsOutputLine};
use indexmap::IndexMap;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
enum DaemonError {
    #[error("usage: cylcd <workflow.toml> [run-dir]")]
    Usage,
    #[error("io error on {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error(transparent)]
    Runbook(#[from] cylc_runbook::RunbookError),
    #[error(transparent)]
    Storage(#[from] cylc_storage::errors::StorageError),
    #[error(transparent)]
    Tick(#[from] cylc_engine::PersistenceError),
}

#[tokio::main]
async fn main() {
    setup_logging();

    if let Err(e) = run().await {
        error!(error = %e, "cylcd exiting");
        std::process::exit(1);
    }
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
}

async fn run() -> Result<(), DaemonError> {
    let mut args = std::env::args().skip(1);
    let workflow_path = args.next().ok_or(DaemonError::Usage)?;
    let run_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

    let contents = std::fs::read_to_string(&workflow_path)
        .map_err(|source| DaemonError::Io { path: workflow_path.clone(), source })?;
    let config = cylc_runbook::load_str(&contents)?;
    info!(workflow = %config.name, "loaded workflow configuration");

    std::fs::create_dir_all(&run_dir)
        .map_err(|source| DaemonError::Io { path: run_dir.display().to_string(), source })?;
    let wal_path = run_dir.join("wal.jsonl");
    let state = Wal::replay(&wal_path)?;
    let wal = Wal::open(&wal_path)?;

    let task_pool = seed_task_pool(&config);
    let queues = queue_names(&config);
    let registry = BatchSystemRegistry::with_defaults();
    let remote_uuid = uuid::Uuid::new_v4().to_string();

    let mut scheduler = Scheduler::new(
        config.name.clone(),
        run_dir.join("log").display().to_string(),
        task_pool,
        queues,
        registry,
        wal,
        state,
        remote_uuid,
        300_000,
    );
    scheduler.set_platforms(platform_table(&config));

    let mut sub_proc_pool = SubProcPool::new(16);
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .map_err(|source| DaemonError::Io { path: "SIGTERM handler".to_string(), source })?;

    let mut tick_interval = tokio::time::interval(Duration::from_secs(1));
    info!("cylcd ready");

    loop {
        tokio::select! {
            _ = tick_interval.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("received SIGINT, requesting shutdown");
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, requesting shutdown");
            }
        }

        let inbox = Inbox { messages: drain_subprocess_messages(&mut sub_proc_pool), ..Inbox::default() };
        let now_point = wall_clock_point();
        let now_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        let outcome = scheduler.tick(now_ms, now_point, inbox)?;
        for effect in outcome.effects {
            dispatch_effect(effect, &mut sub_proc_pool);
        }
        if outcome.stalled {
            warn!("workflow is stalled");
        }
        if outcome.should_shutdown {
            info!("shutdown condition met, stopping engine loop");
            break;
        }
    }

    Ok(())
}

/// Seed the pool with each task's first sequence point; later points are
/// produced by `spawn_all_tasks` as dependents succeed (spec.md §4.7).
fn seed_task_pool(config: &WorkflowConfig) -> cylc_engine::TaskPool {
    let mut pool = cylc_engine::TaskPool::new(config.tasks.clone(), cylc_engine::RunaheadLimit::Count(3));
    for (name, def) in &config.tasks {
        if let Some(point) = def.sequences.first().and_then(|s| s.first()) {
            pool.insert(name, point);
        }
    }
    pool
}

fn queue_names(config: &WorkflowConfig) -> Vec<String> {
    let mut seen = Vec::new();
    for def in config.tasks.values() {
        if !seen.contains(&def.queue) {
            seen.push(def.queue.clone());
        }
    }
    if seen.is_empty() {
        seen.push(cylc_core::task_def::DEFAULT_QUEUE.to_string());
    }
    seen
}

fn platform_table(config: &WorkflowConfig) -> IndexMap<String, cylc_core::Platform> {
    config.platforms.iter().map(|(name, platform)| (name.as_str().to_string(), platform.clone())).collect()
}

/// The current wall-clock time as a `CyclePoint`, used to drive runahead
/// release and xtrigger clock evaluation (spec.md §4.1, §4.6).
fn wall_clock_point() -> CyclePoint {
    let now = chrono::Utc::now();
    CyclePoint::new(Calendar::Gregorian, now.year(), now.month(), now.day(), now.hour(), now.minute(), now.second())
}

fn drain_subprocess_messages(pool: &mut SubProcPool) -> Vec<IncomingMessage> {
    let mut messages = Vec::new();
    for result in pool.drain_ready() {
        for line in result.stdout.lines() {
            match parse_jobs_output_line(line) {
                Ok(JobsOutputLine::Message { log_dir, severity, message, .. }) => {
                    let Some((name, point_str, _submit_num)) = split_log_dir(&log_dir) else { continue };
                    let Ok(point) = CyclePoint::parse(&point_str, Calendar::Gregorian) else { continue };
                    messages.push(IncomingMessage {
                        id: (name, point),
                        severity: parse_severity(&severity),
                        message,
                        submit_num: None,
                    });
                }
                Ok(_) => {}
                Err(e) => warn!(%line, error = %e, "unrecognised jobs-poll output line"),
            }
        }
    }
    messages
}

/// A job log directory is `<point>/<name>/<submit_num>` (spec.md §6).
fn split_log_dir(log_dir: &str) -> Option<(String, String, String)> {
    let mut parts = log_dir.splitn(3, '/');
    let point = parts.next()?.to_string();
    let name = parts.next()?.to_string();
    let submit_num = parts.next()?.to_string();
    Some((name, point, submit_num))
}

fn parse_severity(raw: &str) -> cylc_engine::Severity {
    match raw.to_ascii_uppercase().as_str() {
        "CRITICAL" => cylc_engine::Severity::Critical,
        "ERROR" => cylc_engine::Severity::Error,
        "WARNING" => cylc_engine::Severity::Warning,
        "DEBUG" => cylc_engine::Severity::Debug,
        "NORMAL" => cylc_engine::Severity::Normal,
        _ => cylc_engine::Severity::Info,
    }
}

fn dispatch_effect(effect: SchedulerEffect, sub_proc_pool: &mut SubProcPool) {
    match effect {
        SchedulerEffect::RunSubprocess(ctx) => sub_proc_pool.put(ctx),
        SchedulerEffect::SendMail { recipient, subject, body } => {
            info!(%recipient, %subject, %body, "mail notification (sink not configured)");
        }
        SchedulerEffect::ReplyToCommand { command_id, ok, message } => {
            info!(%command_id, ok, %message, "command reply");
        }
    }
}
