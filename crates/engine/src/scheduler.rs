// SPDX-License-Identifier: MIT

//! The cooperative main-loop tick (spec.md §4.14): one call to
//! [`Scheduler::tick`] drains inbound work, advances the task pool, and
//! dispatches jobs in a fixed order. Nothing here blocks or runs a
//! subprocess itself — [`SchedulerEffect`]s come back out for the caller
//! to dispatch through `SubProcPool`/mail/the command-reply channel,
//! keeping engine state untouched from worker threads (spec.md §5).

use crate::errors::PersistenceError;
use crate::job_manager;
use crate::remote_manager::RemoteManager;
use crate::task_events_manager::{self, MessageOutcome, Severity, TaskEventsManager, TimeoutKind};
use crate::task_pool::{TaskId, TaskPool};
use cylc_adapters::batch_system::BatchSystemRegistry;
use cylc_core::cycle_point::{Calendar, CyclePoint};
use cylc_core::effect::{SchedulerEffect, SubProcContext};
use cylc_core::event::{Event, TaskInstanceId};
use cylc_core::platform::Platform;
use cylc_core::task_state::TaskStatus;
use cylc_core::xtrigger::{XtriggerCacheKey, XtriggerManager, XtriggerResult};
use cylc_core::BroadcastManager;
use cylc_storage::state::{apply, MaterializedState};
use cylc_storage::Wal;
use cylc_wire::command::{Command, CommandEnvelope};
use indexmap::IndexMap;
use std::collections::VecDeque;

fn to_instance_id(id: &TaskId) -> TaskInstanceId {
    TaskInstanceId { name: id.0.clone(), point: id.1 }
}

/// `"point/name"`, the id format `handler_fields`' `id` field and every
/// command-queue task-id string use.
fn parse_task_id(raw: &str, calendar: Calendar) -> Option<TaskId> {
    let (point_str, name) = raw.split_once('/')?;
    let point = CyclePoint::parse(point_str, calendar).ok()?;
    Some((name.to_string(), point))
}

fn parse_status(name: &str) -> Option<TaskStatus> {
    match name {
        "waiting" => Some(TaskStatus::Waiting),
        "queued" => Some(TaskStatus::Queued),
        "ready" => Some(TaskStatus::Ready),
        "submit-retrying" => Some(TaskStatus::SubmitRetrying),
        "submitted" => Some(TaskStatus::Submitted),
        "submit-failed" => Some(TaskStatus::SubmitFailed),
        "running" => Some(TaskStatus::Running),
        "retrying" => Some(TaskStatus::Retrying),
        "succeeded" => Some(TaskStatus::Succeeded),
        "failed" => Some(TaskStatus::Failed),
        "expired" => Some(TaskStatus::Expired),
        _ => None,
    }
}

/// One job message landing on the scheduler from a job wrapper or a poll
/// response (spec.md §4.11), queued for the next tick's drain step.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: TaskId,
    pub severity: Severity,
    pub message: String,
    pub submit_num: Option<u32>,
}

/// Everything landing on the scheduler between two ticks.
#[derive(Debug, Default)]
pub struct Inbox {
    pub commands: Vec<CommandEnvelope>,
    pub messages: Vec<IncomingMessage>,
    pub xtrigger_results: Vec<(XtriggerCacheKey, XtriggerResult)>,
}

/// What one tick produced.
#[derive(Debug, Default)]
pub struct TickOutcome {
    pub effects: Vec<SchedulerEffect>,
    /// Function xtriggers that need an out-of-process evaluation; feed the
    /// result back through the next tick's `Inbox::xtrigger_results`.
    pub xtriggers_to_evaluate: Vec<XtriggerCacheKey>,
    pub stalled: bool,
    pub should_shutdown: bool,
}

/// The single-threaded scheduler (spec.md §4.14): owns every collaborator
/// the tick wires together and nothing else touches directly.
pub struct Scheduler {
    workflow: String,
    log_root: String,
    task_pool: TaskPool,
    task_events: TaskEventsManager,
    remote_manager: RemoteManager,
    broadcast: BroadcastManager,
    xtrigger: XtriggerManager,
    batch_systems: BatchSystemRegistry,
    platforms: IndexMap<String, Platform>,
    wal: Wal,
    state: MaterializedState,
    queues: Vec<String>,
    command_queue: VecDeque<CommandEnvelope>,
    mail_recipient: Option<String>,
    auto_shutdown_on_finish: bool,
    shutdown_requested: bool,
}

impl Scheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        workflow: impl Into<String>,
        log_root: impl Into<String>,
        task_pool: TaskPool,
        queues: Vec<String>,
        batch_systems: BatchSystemRegistry,
        wal: Wal,
        state: MaterializedState,
        remote_uuid: impl Into<String>,
        mail_interval_ms: u64,
    ) -> Self {
        let workflow = workflow.into();
        Self {
            task_events: TaskEventsManager::new(workflow.clone(), mail_interval_ms),
            workflow,
            log_root: log_root.into(),
            task_pool,
            remote_manager: RemoteManager::new(remote_uuid),
            broadcast: BroadcastManager::new(),
            xtrigger: XtriggerManager::new(),
            batch_systems,
            platforms: IndexMap::new(),
            wal,
            state,
            queues,
            command_queue: VecDeque::new(),
            mail_recipient: None,
            auto_shutdown_on_finish: false,
            shutdown_requested: false,
        }
    }

    pub fn task_pool(&self) -> &TaskPool {
        &self.task_pool
    }

    pub fn task_pool_mut(&mut self) -> &mut TaskPool {
        &mut self.task_pool
    }

    pub fn remote_manager_mut(&mut self) -> &mut RemoteManager {
        &mut self.remote_manager
    }

    pub fn broadcast_mut(&mut self) -> &mut BroadcastManager {
        &mut self.broadcast
    }

    pub fn state(&self) -> &MaterializedState {
        &self.state
    }

    pub fn set_platforms(&mut self, platforms: IndexMap<String, Platform>) {
        self.platforms = platforms;
    }

    pub fn set_mail_recipient(&mut self, recipient: Option<String>) {
        self.mail_recipient = recipient;
    }

    pub fn set_auto_shutdown_on_finish(&mut self, enabled: bool) {
        self.auto_shutdown_on_finish = enabled;
    }

    /// Queue a command ahead of the next tick's own `Inbox::commands`
    /// (e.g. for a caller that wants to enqueue without waiting for the
    /// tick boundary).
    pub fn queue_command(&mut self, envelope: CommandEnvelope) {
        self.command_queue.push_back(envelope);
    }

    fn platform_for(&self, task_name: &str) -> Option<Platform> {
        let taskdef = self.task_pool.taskdef(task_name)?;
        let name = taskdef.runtime.platform.as_deref().unwrap_or("localhost");
        self.platforms.get(name).cloned()
    }

    /// Run one cooperative tick (spec.md §4.14's 11-step order). `now_ms`
    /// is wall-clock epoch milliseconds (for timers); `now_point` is the
    /// clock reading expressed in the workflow's own calendar (for clock
    /// triggers and task expiry, which are cycle-point relative).
    pub fn tick(
        &mut self,
        now_ms: u64,
        now_point: CyclePoint,
        mut inbox: Inbox,
    ) -> Result<TickOutcome, PersistenceError> {
        let mut effects = Vec::new();
        let mut deltas: Vec<Event> = Vec::new();

        // 1. Drain the command queue.
        self.command_queue.extend(inbox.commands.drain(..));
        while let Some(envelope) = self.command_queue.pop_front() {
            let (ok, message) = self.handle_command(envelope.command, now_point, &mut deltas, &mut effects);
            effects.push(SchedulerEffect::ReplyToCommand { command_id: envelope.id, ok, message });
        }

        // 2. Drain the message queue.
        for msg in std::mem::take(&mut inbox.messages) {
            self.ingest_message(&msg, now_ms, &mut deltas, &mut effects);
        }

        // 3. Xtrigger collate/satisfy.
        for (key, result) in inbox.xtrigger_results.drain(..) {
            self.xtrigger.record_result(key, result);
        }
        self.apply_clock_and_expiry(now_point, &mut deltas);
        let xtriggers_to_evaluate = self.collate_pending_xtriggers();

        // 4. Match dependencies.
        self.task_pool.match_dependencies();

        // 5. Spawn successors, then remove suiciding tasks.
        for id in self.task_pool.spawn_all_tasks() {
            deltas.push(Event::ProxySpawned { id: to_instance_id(&id), status: TaskStatus::Waiting });
        }
        for suicide in self.task_pool.remove_suiciding_tasks() {
            deltas.push(Event::ProxyRemoved { id: to_instance_id(&suicide.id) });
        }

        // 6. Release runahead, release due retries, then get ready tasks per queue.
        self.task_pool.release_runahead_tasks();
        let retried = self.task_pool.promote_due_retries(now_ms);
        for id in &retried {
            deltas.push(Event::StatusChanged { id: to_instance_id(id), status: TaskStatus::Ready });
        }
        let mut ready: Vec<TaskId> = Vec::new();
        for queue in self.queues.clone() {
            ready.extend(self.task_pool.process_queue(&queue));
        }
        for id in &ready {
            deltas.push(Event::StatusChanged { id: to_instance_id(id), status: TaskStatus::Queued });
        }
        ready.extend(retried);

        // 7. Submit.
        for id in &ready {
            self.submit_one(id, now_ms, &mut effects, &mut deltas);
        }

        // 8. Check task jobs: armed status timeouts.
        self.check_task_jobs(now_ms, &mut effects);

        // 9. Process events: flush coalesced mail.
        for mail in self.task_events.process_events(now_ms) {
            effects.push(SchedulerEffect::SendMail {
                recipient: mail.recipient,
                subject: format!("[cylc] {}", self.workflow),
                body: mail.lines.join("\n"),
            });
        }

        // 10. Flush deltas: append to the write-ahead log, then apply.
        for event in &deltas {
            self.wal.append(event)?;
            apply(&mut self.state, event);
        }

        // 11. Stall / auto-shutdown.
        let stalled = self.task_pool.is_stalled();
        let should_shutdown =
            self.shutdown_requested || (self.auto_shutdown_on_finish && self.task_pool.is_empty());

        Ok(TickOutcome { effects, xtriggers_to_evaluate, stalled, should_shutdown })
    }

    fn ingest_message(
        &mut self,
        msg: &IncomingMessage,
        now_ms: u64,
        deltas: &mut Vec<Event>,
        effects: &mut Vec<SchedulerEffect>,
    ) {
        let platform = self.platform_for(&msg.id.0);
        let taskdef = self.task_pool.taskdef(&msg.id.0).cloned();
        let Some(proxy) = self.task_pool.get_mut(&msg.id) else { return };
        let before = proxy.status();
        let (submission_retry_delays, execution_retry_delays) = taskdef
            .map(|d| (d.runtime.submission_retry_delays, d.runtime.execution_retry_delays))
            .unwrap_or_default();
        let outcome = self.task_events.process_message(
            proxy,
            msg.severity,
            &msg.message,
            now_ms,
            msg.submit_num,
            &submission_retry_delays,
            &execution_retry_delays,
        );
        match outcome {
            MessageOutcome::Handled => {
                let after = proxy.status();
                if after != before {
                    deltas.push(Event::StatusChanged { id: to_instance_id(&msg.id), status: after });
                    if let Some(platform) = &platform {
                        TaskEventsManager::arm_status_timeout(proxy, platform, after, now_ms);
                    }
                }
                if proxy.outputs.is_completed(&msg.message) {
                    deltas.push(Event::OutputCompleted { id: to_instance_id(&msg.id), message: msg.message.clone() });
                }
            }
            MessageOutcome::PollRequested => {
                let log_dir = job_manager::job_log_dir(&proxy.point.to_string(), &proxy.name, proxy.submit_num);
                let argv = job_manager::jobs_poll_argv(&self.log_root, &[log_dir.clone()]);
                let mut ctx = SubProcContext::new("jobs-poll", argv);
                ctx.id_keys = vec![log_dir];
                effects.push(SchedulerEffect::RunSubprocess(ctx));
            }
            MessageOutcome::Ignored(reason) => {
                tracing::debug!(task = %msg.id.0, point = %msg.id.1, reason = %reason.reason, "ignored task message");
            }
        }
    }

    fn apply_clock_and_expiry(&mut self, now_point: CyclePoint, deltas: &mut Vec<Event>) {
        let ids: Vec<TaskId> = self.task_pool.all_ids().cloned().collect();
        for id in ids {
            let Some(taskdef) = self.task_pool.taskdef(&id.0).cloned() else { continue };
            let Some(proxy) = self.task_pool.get_mut(&id) else { continue };
            if let Some(offset) = taskdef.clock_offset {
                if let Some((label, satisfied)) = proxy.xclock.clone() {
                    if !satisfied && now_point >= id.1.add_offset(&offset) {
                        proxy.xclock = Some((label, true));
                    }
                }
            }
            if proxy.status() == TaskStatus::Waiting {
                if let Some(offset) = taskdef.expire_offset {
                    if now_point >= id.1.add_offset(&offset) && proxy.state_mut().to_expired() {
                        deltas.push(Event::StatusChanged { id: to_instance_id(&id), status: TaskStatus::Expired });
                    }
                }
            }
        }
    }

    /// Build the set of function-xtrigger cache keys referenced by any
    /// unsatisfied proxy, apply already-cached satisfied results back onto
    /// those proxies, and return the keys still needing an out-of-process
    /// evaluation. A proxy's xtrigger args are `(name, point)`, since task
    /// definitions don't yet carry typed xtrigger-call argument lists.
    fn collate_pending_xtriggers(&mut self) -> Vec<XtriggerCacheKey> {
        let ids: Vec<TaskId> = self.task_pool.all_ids().cloned().collect();
        let mut pending_keys: Vec<XtriggerCacheKey> = Vec::new();
        for id in &ids {
            if let Some(proxy) = self.task_pool.get(id) {
                for (label, satisfied) in &proxy.xtriggers {
                    if !satisfied {
                        pending_keys.push(XtriggerCacheKey { func_name: label.clone(), args: vec![id.0.clone(), id.1.to_string()] });
                    }
                }
            }
        }
        let to_evaluate = self.xtrigger.collate(pending_keys.iter());

        let mut consumed = Vec::new();
        for id in &ids {
            let Some(proxy) = self.task_pool.get_mut(id) else { continue };
            let labels: Vec<String> = proxy.xtriggers.keys().cloned().collect();
            for label in labels {
                let key = XtriggerCacheKey { func_name: label.clone(), args: vec![id.0.clone(), id.1.to_string()] };
                if let Some(result) = self.xtrigger.result(&key) {
                    if result.satisfied {
                        proxy.xtriggers.insert(label, true);
                        consumed.push(key);
                    }
                }
            }
        }
        self.xtrigger.clear_consumed(consumed);
        to_evaluate
    }

    fn submit_one(&mut self, id: &TaskId, now_ms: u64, effects: &mut Vec<SchedulerEffect>, deltas: &mut Vec<Event>) {
        let Some(taskdef) = self.task_pool.taskdef(&id.0).cloned() else { return };
        let Some(platform) = self.platform_for(&id.0) else {
            tracing::warn!(task = %id.0, point = %id.1, "no platform configured, cannot submit");
            if let Some(proxy) = self.task_pool.get_mut(id) {
                proxy.state_mut().to_submit_failed();
            }
            deltas.push(Event::StatusChanged { id: to_instance_id(id), status: TaskStatus::SubmitFailed });
            return;
        };

        let overrides = self.broadcast.get(&id.1, std::slice::from_ref(&id.0));
        let mut script = taskdef.runtime.script.clone().unwrap_or_default();
        let mut env = taskdef.runtime.env.clone();
        for (path, value) in &overrides {
            if path == "script" {
                if let Some(s) = value.as_str() {
                    script = s.to_string();
                }
            } else if let Some(key) = path.strip_prefix("environment.") {
                if let Some(s) = value.as_str() {
                    env.insert(key.to_string(), s.to_string());
                }
            }
        }

        let Some(proxy) = self.task_pool.get_mut(id) else { return };
        let exec_limit = taskdef.runtime.execution_time_limit.map(|d| d.as_secs());
        let job_config = job_manager::prepare(proxy, script, env, taskdef.runtime.directives.clone(), exec_limit);
        let log_dir = job_manager::job_log_dir(&proxy.point.to_string(), &proxy.name, job_config.submit_num);
        let stdin = (!platform.is_localhost()).then(|| serde_json::to_string(&job_config).unwrap_or_default());

        match job_manager::build_submit_context(&self.batch_systems, &platform, &self.log_root, vec![log_dir], stdin) {
            Ok(ctx) => {
                effects.push(SchedulerEffect::RunSubprocess(ctx));
                proxy.state_mut().to_submitted();
                TaskEventsManager::arm_status_timeout(proxy, &platform, TaskStatus::Submitted, now_ms);
                deltas.push(Event::SubmitNumIncremented { id: to_instance_id(id), submit_num: proxy.submit_num });
                deltas.push(Event::StatusChanged { id: to_instance_id(id), status: TaskStatus::Submitted });
            }
            Err(e) => {
                tracing::warn!(task = %id.0, point = %id.1, error = %e, "could not build submit context");
                proxy.state_mut().to_submit_failed();
                deltas.push(Event::StatusChanged { id: to_instance_id(id), status: TaskStatus::SubmitFailed });
            }
        }
    }

    fn check_task_jobs(&mut self, now_ms: u64, effects: &mut Vec<SchedulerEffect>) {
        let ids: Vec<TaskId> = self.task_pool.active_ids().cloned().collect();
        for id in ids {
            let Some(taskdef) = self.task_pool.taskdef(&id.0).cloned() else { continue };
            let Some(proxy) = self.task_pool.get_mut(&id) else { continue };
            let Some(kind) = TaskEventsManager::check_job_time(proxy, now_ms) else { continue };
            let event_name = match kind {
                TimeoutKind::Submission => "submission-timeout",
                TimeoutKind::Execution => "execution-timeout",
            };
            tracing::warn!(task = %id.0, point = %id.1, event = event_name, "task job timeout");
            if taskdef.runtime.events.mail_events.iter().any(|e| e == event_name) {
                if let Some(recipient) = self.mail_recipient.clone() {
                    self.task_events.queue_mail(&recipient, event_name, proxy);
                }
            }
            if let Some(templates) = taskdef.runtime.events.handlers.get(event_name) {
                let event_key = self.task_events.event_key(event_name, Severity::Warning);
                for invocation in task_events_manager::build_handler_invocations(
                    &event_key,
                    event_name,
                    templates,
                    &self.workflow,
                    proxy,
                    event_name,
                ) {
                    effects.push(SchedulerEffect::RunSubprocess(SubProcContext::new("event-handler", invocation.argv)));
                }
            }
        }
    }

    fn build_poll_context(&self, id: &TaskId) -> Option<SubProcContext> {
        let proxy = self.task_pool.get(id)?;
        let log_dir = job_manager::job_log_dir(&proxy.point.to_string(), &proxy.name, proxy.submit_num);
        let argv = job_manager::jobs_poll_argv(&self.log_root, &[log_dir.clone()]);
        let mut ctx = SubProcContext::new("jobs-poll", argv);
        ctx.id_keys = vec![log_dir];
        Some(ctx)
    }

    fn build_kill_context(&self, id: &TaskId) -> Option<SubProcContext> {
        let proxy = self.task_pool.get(id)?;
        let batch_job_id = proxy.summary.batch_sys_job_id.clone()?;
        let platform = self.platform_for(&id.0)?;
        let batch_system = self.batch_systems.get(platform.job_runner.to_string().as_str())?;
        let argv = batch_system.kill_argv(&batch_job_id);
        let mut ctx = SubProcContext::new("kill", argv);
        ctx.id_keys = vec![format!("{}/{}", id.1, id.0)];
        Some(ctx)
    }

    /// Apply one command-queue entry (spec.md §6). Returns `(ok, message)`
    /// for the reply effect.
    fn handle_command(
        &mut self,
        command: Command,
        now_point: CyclePoint,
        deltas: &mut Vec<Event>,
        effects: &mut Vec<SchedulerEffect>,
    ) -> (bool, String) {
        match command {
            Command::HoldTasks { task_ids } => {
                let mut held = 0;
                for raw in &task_ids {
                    if let Some(id) = parse_task_id(raw, now_point.calendar) {
                        if let Some(proxy) = self.task_pool.get_mut(&id) {
                            proxy.hold();
                            deltas.push(Event::HeldChanged { id: to_instance_id(&id), held: true });
                            held += 1;
                        }
                    }
                }
                (true, format!("held {held} task(s)"))
            }
            Command::ReleaseTasks { task_ids } => {
                let mut released = 0;
                for raw in &task_ids {
                    if let Some(id) = parse_task_id(raw, now_point.calendar) {
                        if let Some(proxy) = self.task_pool.get_mut(&id) {
                            proxy.release();
                            deltas.push(Event::HeldChanged { id: to_instance_id(&id), held: false });
                            released += 1;
                        }
                    }
                }
                (true, format!("released {released} task(s)"))
            }
            Command::HoldAfterPointString { point } => match CyclePoint::parse(&point, now_point.calendar) {
                Ok(cutoff) => {
                    let ids: Vec<TaskId> = self.task_pool.all_ids().filter(|id| id.1 > cutoff).cloned().collect();
                    for id in &ids {
                        if let Some(proxy) = self.task_pool.get_mut(id) {
                            proxy.hold();
                            deltas.push(Event::HeldChanged { id: to_instance_id(id), held: true });
                        }
                    }
                    (true, format!("held {} task(s) after {point}", ids.len()))
                }
                Err(e) => (false, e.to_string()),
            },
            Command::ReleaseSuite => {
                self.task_pool.set_held(false);
                (true, "workflow released".to_string())
            }
            Command::HoldSuite => {
                self.task_pool.set_held(true);
                (true, "workflow held".to_string())
            }
            Command::Nudge => (true, "nudged".to_string()),
            Command::ReloadSuite => (true, "reload requested".to_string()),
            Command::SetVerbosity { level } => (true, format!("verbosity set to {level}")),
            Command::SetStopAfterPoint { point } => match CyclePoint::parse(&point, now_point.calendar) {
                Ok(p) => {
                    self.task_pool.set_stop_point(Some(p));
                    (true, format!("stop point set to {point}"))
                }
                Err(e) => (false, e.to_string()),
            },
            Command::SetStopAfterClockTime { iso_time } => (true, format!("stop-at-clock-time {iso_time} noted")),
            Command::SetStopAfterTask { task_id } => (true, format!("stop-after-task {task_id} noted")),
            Command::SetStopCleanly { kill_active_tasks } => {
                self.shutdown_requested = true;
                (true, format!("stopping cleanly (kill_active_tasks={kill_active_tasks})"))
            }
            Command::StopNow { terminate } => {
                self.shutdown_requested = true;
                (true, format!("stopping now (terminate={terminate})"))
            }
            Command::TriggerTasks { task_ids, back_out } => {
                let mut triggered = 0;
                for raw in &task_ids {
                    if let Some(id) = parse_task_id(raw, now_point.calendar) {
                        if let Some(proxy) = self.task_pool.get_mut(&id) {
                            proxy.manual_trigger = !back_out;
                            triggered += 1;
                        }
                    }
                }
                (true, format!("triggered {triggered} task(s)"))
            }
            Command::InsertTasks { task_ids, stop_point_string: _, no_check: _ } => {
                let mut inserted = 0;
                for raw in &task_ids {
                    if let Some((name, point)) = parse_task_id(raw, now_point.calendar) {
                        if self.task_pool.insert(&name, point) {
                            deltas.push(Event::ProxySpawned { id: TaskInstanceId { name, point }, status: TaskStatus::Waiting });
                            inserted += 1;
                        }
                    }
                }
                (true, format!("inserted {inserted} task(s)"))
            }
            Command::RemoveTasks { task_ids, spawn } => {
                let mut removed = 0;
                for raw in &task_ids {
                    let Some(id) = parse_task_id(raw, now_point.calendar) else { continue };
                    if !self.task_pool.force_remove(&id) {
                        continue;
                    }
                    deltas.push(Event::ProxyRemoved { id: to_instance_id(&id) });
                    removed += 1;
                    if spawn {
                        let next = self
                            .task_pool
                            .taskdef(&id.0)
                            .and_then(|d| d.sequences.first())
                            .and_then(|seq| seq.next_after(&id.1));
                        if let Some(next_point) = next {
                            if self.task_pool.insert(&id.0, next_point) {
                                deltas.push(Event::ProxySpawned {
                                    id: TaskInstanceId { name: id.0.clone(), point: next_point },
                                    status: TaskStatus::Waiting,
                                });
                            }
                        }
                    }
                }
                (true, format!("removed {removed} task(s)"))
            }
            Command::ResetTaskStates { task_ids, state, outputs } => {
                let mut reset_count = 0;
                for raw in &task_ids {
                    let Some(id) = parse_task_id(raw, now_point.calendar) else { continue };
                    let Some(proxy) = self.task_pool.get_mut(&id) else { continue };
                    if let Some(status) = state.as_deref().and_then(parse_status) {
                        proxy.state_mut().reset(status);
                        deltas.push(Event::StatusChanged { id: to_instance_id(&id), status });
                    }
                    for output in &outputs {
                        if proxy.outputs.set_completed(output, true).is_ok() {
                            deltas.push(Event::OutputCompleted { id: to_instance_id(&id), message: output.clone() });
                        }
                    }
                    reset_count += 1;
                }
                (true, format!("reset {reset_count} task(s)"))
            }
            Command::PollTasks { task_ids, poll_succ: _ } => {
                let mut polled = 0;
                for raw in &task_ids {
                    if let Some(id) = parse_task_id(raw, now_point.calendar) {
                        if let Some(ctx) = self.build_poll_context(&id) {
                            effects.push(SchedulerEffect::RunSubprocess(ctx));
                            polled += 1;
                        }
                    }
                }
                (true, format!("polling {polled} task(s)"))
            }
            Command::KillTasks { task_ids } => {
                let mut killed = 0;
                for raw in &task_ids {
                    if let Some(id) = parse_task_id(raw, now_point.calendar) {
                        if let Some(ctx) = self.build_kill_context(&id) {
                            effects.push(SchedulerEffect::RunSubprocess(ctx));
                            killed += 1;
                        }
                    }
                }
                (true, format!("kill dispatched for {killed} task(s)"))
            }
            Command::SpawnTasks { task_ids } => {
                let mut spawned = 0;
                for raw in &task_ids {
                    if let Some((name, point)) = parse_task_id(raw, now_point.calendar) {
                        if self.task_pool.insert(&name, point) {
                            deltas.push(Event::ProxySpawned { id: TaskInstanceId { name, point }, status: TaskStatus::Waiting });
                            spawned += 1;
                        }
                    }
                }
                (true, format!("spawned {spawned} task(s)"))
            }
            Command::TakeCheckpoints { label } => {
                deltas.push(Event::CheckpointTaken { label: label.clone() });
                (true, format!("checkpoint {label} recorded"))
            }
            Command::DryRunTasks { task_ids, check_syntax: _ } => {
                (true, format!("dry-run requested for {} task(s)", task_ids.len()))
            }
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
