// SPDX-License-Identifier: MIT

//! Message/poll ingestion, retry scheduling, event handlers and timeouts
//! (spec.md §4.11). `TaskEventsManager` is the only thing allowed to move a
//! [`TaskProxy`] between job-lifecycle statuses in response to job output.

use crate::errors::ReceivedIgnored;
use cylc_core::action_timer::ActionTimer;
use cylc_core::platform::Platform;
use cylc_core::task_proxy::{SummaryTimeKind, TaskProxy};
use cylc_core::task_state::TaskStatus;
use indexmap::IndexMap;
use std::time::Duration;

/// Severity of an incoming job message (spec.md §4.11).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Info,
    Normal,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warning" => Self::Warning,
            "error" => Self::Error,
            "critical" => Self::Critical,
            _ => Self::Normal,
        }
    }

    /// Severities that count toward the event index used for handler
    /// deduping on the non-unique event set (spec.md §4.11).
    pub fn is_non_unique(self) -> bool {
        matches!(self, Self::Warning | Self::Critical)
    }
}

/// What an incoming message implies about job state.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SpecialMessage {
    Submitted,
    Started,
    Succeeded,
    Failed,
    SubmitFailed,
    Abort(String),
    Vacation(String),
    FailSignal(String),
}

fn classify(message: &str) -> Option<SpecialMessage> {
    match message {
        "submitted" => Some(SpecialMessage::Submitted),
        "started" => Some(SpecialMessage::Started),
        "succeeded" => Some(SpecialMessage::Succeeded),
        "failed" => Some(SpecialMessage::Failed),
        "submit-failed" => Some(SpecialMessage::SubmitFailed),
        _ => {
            if let Some(rest) = message.strip_prefix("ABORT: ") {
                Some(SpecialMessage::Abort(rest.to_string()))
            } else if let Some(rest) = message.strip_prefix("VACATION: ") {
                Some(SpecialMessage::Vacation(rest.to_string()))
            } else if let Some(rest) = message.strip_prefix("FAIL: ") {
                Some(SpecialMessage::FailSignal(rest.to_string()))
            } else {
                None
            }
        }
    }
}

/// What happened to an incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// State changed (or an output was marked completed).
    Handled,
    /// Anti-regression: state held, caller should schedule a poll to
    /// confirm the job's real status (spec.md §4.11).
    PollRequested,
    Ignored(ReceivedIgnored),
}

/// One timeout boundary crossed for the first time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutKind {
    Submission,
    Execution,
}

/// A handler invocation ready to run, rendered from its template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerInvocation {
    pub event_key: String,
    pub argv: Vec<String>,
}

/// Render every command template configured for `event` against this
/// firing's fields (spec.md §4.11 "custom event handlers"), wrapped for
/// a shell the same way remote commands are (`sh -c <rendered>`).
pub fn build_handler_invocations(
    event_key: &str,
    event: &str,
    templates: &[String],
    workflow: &str,
    proxy: &TaskProxy,
    message: &str,
) -> Vec<HandlerInvocation> {
    let fields = handler_fields(event, workflow, proxy, message);
    templates
        .iter()
        .map(|template| HandlerInvocation {
            event_key: event_key.to_string(),
            argv: vec!["sh".to_string(), "-c".to_string(), render_handler(template, &fields)],
        })
        .collect()
}

/// A coalesced mail delivery: one recipient, several `event: id` lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMail {
    pub recipient: String,
    pub lines: Vec<String>,
}

/// Named-field map for custom handler template substitution (spec.md §4.11).
pub fn handler_fields(
    event: &str,
    workflow: &str,
    proxy: &TaskProxy,
    message: &str,
) -> IndexMap<String, String> {
    let mut fields = IndexMap::new();
    fields.insert("event".to_string(), event.to_string());
    fields.insert("suite".to_string(), workflow.to_string());
    fields.insert("point".to_string(), proxy.point.to_string());
    fields.insert("name".to_string(), proxy.name.clone());
    fields.insert("submit_num".to_string(), proxy.submit_num.to_string());
    fields.insert("try_num".to_string(), proxy.try_num().to_string());
    fields.insert("id".to_string(), format!("{}/{}", proxy.point, proxy.name));
    fields.insert("message".to_string(), message.to_string());
    fields.insert(
        "batch_sys_name".to_string(),
        proxy.summary.batch_sys_name.clone().unwrap_or_default(),
    );
    fields.insert(
        "batch_sys_job_id".to_string(),
        proxy.summary.batch_sys_job_id.clone().unwrap_or_default(),
    );
    fields.insert(
        "submit_time".to_string(),
        proxy.summary.submitted_time.map(|t| t.to_string()).unwrap_or_default(),
    );
    fields.insert(
        "start_time".to_string(),
        proxy.summary.started_time.map(|t| t.to_string()).unwrap_or_default(),
    );
    fields.insert(
        "finish_time".to_string(),
        proxy.summary.finished_time.map(|t| t.to_string()).unwrap_or_default(),
    );
    let user_at_host = match (&proxy.summary.owner, &proxy.summary.host) {
        (Some(owner), Some(host)) => format!("{owner}@{host}"),
        (None, Some(host)) => host.clone(),
        _ => String::new(),
    };
    fields.insert("user@host".to_string(), user_at_host);
    fields
}

/// Expand `template` against `fields`; if no `%(key)s`-style token in
/// `template` matched a known field, fall back to the positional form
/// `handler event suite id message` (spec.md §4.11).
pub fn render_handler(template: &str, fields: &IndexMap<String, String>) -> String {
    let mut rendered = template.to_string();
    let mut substituted = false;
    for (key, value) in fields {
        let token = format!("%({key})s");
        if rendered.contains(&token) {
            rendered = rendered.replace(&token, value);
            substituted = true;
        }
    }
    if substituted {
        rendered
    } else {
        format!(
            "{} {} {} {} {}",
            template,
            fields.get("event").map(String::as_str).unwrap_or(""),
            fields.get("suite").map(String::as_str).unwrap_or(""),
            fields.get("id").map(String::as_str).unwrap_or(""),
            fields.get("message").map(String::as_str).unwrap_or(""),
        )
    }
}

/// Build the execution polling schedule (spec.md §4.11): base intervals,
/// extended by repeating the last base interval until the running total
/// reaches the execution time limit, then the limit-specific intervals are
/// appended. With no time limit the base schedule is used unmodified.
pub fn build_execution_polling_schedule(
    base: &[Duration],
    execution_time_limit: Option<Duration>,
    limit_intervals: &[Duration],
) -> Vec<Duration> {
    let mut schedule: Vec<Duration> = base.to_vec();
    let Some(limit) = execution_time_limit else {
        return schedule;
    };
    let mut running_total: Duration = schedule.iter().sum();
    while running_total < limit {
        let Some(&last) = schedule.last() else { break };
        if last.is_zero() {
            break;
        }
        schedule.push(last);
        running_total += last;
    }
    schedule.extend_from_slice(limit_intervals);
    schedule
}

fn delays_to_ms(delays: &[Duration]) -> Vec<u64> {
    delays.iter().map(|d| d.as_millis() as u64).collect()
}

/// Message/poll ingestion, retry scheduling, and event dispatch.
pub struct TaskEventsManager {
    workflow: String,
    mail_interval_ms: u64,
    last_mail_flush_ms: u64,
    mail_queue: IndexMap<String, Vec<String>>,
    /// Next dedup index per non-unique event name (spec.md §4.11).
    event_occurrence: IndexMap<String, u32>,
}

impl TaskEventsManager {
    pub fn new(workflow: impl Into<String>, mail_interval_ms: u64) -> Self {
        Self {
            workflow: workflow.into(),
            mail_interval_ms,
            last_mail_flush_ms: 0,
            mail_queue: IndexMap::new(),
            event_occurrence: IndexMap::new(),
        }
    }

    /// A dedupe key for `event`: the bare name for unique events, or
    /// `event#N` for events in the non-unique set so repeated firings don't
    /// collapse into one handler timer.
    pub fn event_key(&mut self, event: &str, severity: Severity) -> String {
        if severity.is_non_unique() || matches!(event, "warning" | "critical" | "custom") {
            let counter = self.event_occurrence.entry(event.to_string()).or_insert(0);
            let key = format!("{event}#{counter}");
            *counter += 1;
            key
        } else {
            event.to_string()
        }
    }

    /// Ingest a job message (spec.md §4.11). `submit_num` is the submit
    /// number the message was tagged with, if known; a mismatch against the
    /// proxy's current submit number means the message is stale.
    /// `submission_retry_delays`/`execution_retry_delays` come from the
    /// task's own `RuntimeConfig` and seed the proxy's retry timer the
    /// first time a submission/execution failure needs one.
    pub fn process_message(
        &mut self,
        proxy: &mut TaskProxy,
        severity: Severity,
        message: &str,
        now_ms: u64,
        submit_num: Option<u32>,
        submission_retry_delays: &[Duration],
        execution_retry_delays: &[Duration],
    ) -> MessageOutcome {
        if let Some(sn) = submit_num {
            if sn != proxy.submit_num {
                return MessageOutcome::Ignored(ReceivedIgnored {
                    reason: format!("message for submit_num {sn}, proxy is at {}", proxy.submit_num),
                });
            }
        }

        proxy.summary.latest_message = Some(message.to_string());

        let Some(special) = classify(message) else {
            if proxy.outputs.is_known(message) {
                let _ = proxy.outputs.set_completed(message, true);
                return MessageOutcome::Handled;
            }
            tracing::event!(
                tracing::Level::INFO,
                severity = ?severity,
                message,
                "unknown task message"
            );
            return MessageOutcome::Ignored(ReceivedIgnored {
                reason: format!("unrecognised message: {message:?}"),
            });
        };

        match special {
            SpecialMessage::Vacation(reason) => {
                tracing::warn!(task = %proxy.name, point = %proxy.point, reason, "job vacated");
                proxy.state_mut().reset(TaskStatus::Submitted);
                proxy.set_summary_time(SummaryTimeKind::Started, None);
                proxy.submit_retry_num = 0;
                proxy.job_vacated = true;
                MessageOutcome::Handled
            }
            SpecialMessage::Abort(reason) => {
                tracing::error!(task = %proxy.name, point = %proxy.point, reason, "job aborted");
                self.apply_or_poll(proxy, TaskStatus::Failed, now_ms, true, submission_retry_delays, execution_retry_delays)
            }
            SpecialMessage::FailSignal(signal) => {
                tracing::warn!(task = %proxy.name, point = %proxy.point, signal, "job received fail signal");
                self.apply_or_poll(proxy, TaskStatus::Failed, now_ms, true, submission_retry_delays, execution_retry_delays)
            }
            SpecialMessage::Submitted => {
                self.apply_or_poll(proxy, TaskStatus::Submitted, now_ms, false, submission_retry_delays, execution_retry_delays)
            }
            SpecialMessage::Started => {
                proxy.job_vacated = false;
                self.apply_or_poll(proxy, TaskStatus::Running, now_ms, false, submission_retry_delays, execution_retry_delays)
            }
            SpecialMessage::Succeeded => {
                self.apply_or_poll(proxy, TaskStatus::Succeeded, now_ms, false, submission_retry_delays, execution_retry_delays)
            }
            SpecialMessage::Failed => {
                self.apply_or_poll(proxy, TaskStatus::Failed, now_ms, true, submission_retry_delays, execution_retry_delays)
            }
            SpecialMessage::SubmitFailed => {
                self.apply_or_poll(proxy, TaskStatus::SubmitFailed, now_ms, true, submission_retry_delays, execution_retry_delays)
            }
        }
    }

    /// Apply an incoming job-lifecycle status, honouring anti-regression,
    /// and (for `failed`/`submit-failed`) resolve the retry-vs-terminal
    /// branch (spec.md §4.11).
    #[allow(clippy::too_many_arguments)]
    fn apply_or_poll(
        &mut self,
        proxy: &mut TaskProxy,
        incoming: TaskStatus,
        now_ms: u64,
        may_retry: bool,
        submission_retry_delays: &[Duration],
        execution_retry_delays: &[Duration],
    ) -> MessageOutcome {
        if let (Some(incoming_rank), Some(current_rank)) =
            (incoming.job_rank(), proxy.status().job_rank())
        {
            if incoming_rank < current_rank {
                return MessageOutcome::PollRequested;
            }
        }

        if may_retry && incoming == TaskStatus::Failed {
            let timer = proxy
                .timers
                .execution_retry_timer
                .get_or_insert_with(|| ActionTimer::new(delays_to_ms(execution_retry_delays)));
            if timer.next(now_ms) {
                tracing::info!(task = %proxy.name, point = %proxy.point, "execution failed, scheduling retry");
                proxy.try_num += 1;
                proxy.state_mut().reset(TaskStatus::Retrying);
                return MessageOutcome::Handled;
            }
        }
        if may_retry && incoming == TaskStatus::SubmitFailed {
            let timer = proxy
                .timers
                .submit_retry_timer
                .get_or_insert_with(|| ActionTimer::new(delays_to_ms(submission_retry_delays)));
            if timer.next(now_ms) {
                tracing::info!(task = %proxy.name, point = %proxy.point, "submission failed, scheduling retry");
                proxy.submit_retry_num += 1;
                proxy.state_mut().reset(TaskStatus::SubmitRetrying);
                return MessageOutcome::Handled;
            }
        }

        proxy.state_mut().apply_job_message_status(incoming);
        match incoming {
            TaskStatus::Submitted => proxy.set_summary_time(SummaryTimeKind::Submitted, Some(now_ms)),
            TaskStatus::Running => proxy.set_summary_time(SummaryTimeKind::Started, Some(now_ms)),
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::SubmitFailed => {
                proxy.set_summary_time(SummaryTimeKind::Finished, Some(now_ms))
            }
            _ => {}
        }
        MessageOutcome::Handled
    }

    /// Arm the submission/execution timeout for a status just entered
    /// (spec.md §4.11).
    pub fn arm_status_timeout(proxy: &mut TaskProxy, platform: &Platform, status: TaskStatus, now_ms: u64) {
        let setting = match status {
            TaskStatus::Submitted => platform.submission_timeout,
            TaskStatus::Running => platform.execution_timeout,
            _ => None,
        };
        proxy.timeout_ms = setting.map(|d| now_ms + d.as_millis() as u64);
    }

    /// Check whether the armed status timeout has just been crossed,
    /// clearing it so the event fires exactly once (spec.md §4.11).
    pub fn check_job_time(proxy: &mut TaskProxy, now_ms: u64) -> Option<TimeoutKind> {
        let due = proxy.timeout_ms?;
        if now_ms < due {
            return None;
        }
        proxy.timeout_ms = None;
        match proxy.status() {
            TaskStatus::Submitted => Some(TimeoutKind::Submission),
            TaskStatus::Running => Some(TimeoutKind::Execution),
            _ => None,
        }
    }

    /// Queue a mail line for `recipient` (spec.md §4.11's mail coalescing).
    pub fn queue_mail(&mut self, recipient: &str, event: &str, proxy: &TaskProxy) {
        let line = format!("{event}: {}/{}/{:02}", proxy.point, proxy.name, proxy.submit_num);
        self.mail_queue.entry(recipient.to_string()).or_default().push(line);
    }

    /// Flush coalesced mail if the configured interval has elapsed.
    pub fn process_events(&mut self, now_ms: u64) -> Vec<PendingMail> {
        if self.mail_queue.is_empty() {
            return Vec::new();
        }
        if now_ms.saturating_sub(self.last_mail_flush_ms) < self.mail_interval_ms {
            return Vec::new();
        }
        self.last_mail_flush_ms = now_ms;
        std::mem::take(&mut self.mail_queue)
            .into_iter()
            .map(|(recipient, lines)| PendingMail { recipient, lines })
            .collect()
    }

    /// Whether job-log retrieval should run for `event` (spec.md §4.11):
    /// only on terminal-ish events, only for a genuinely remote host, and
    /// only if the platform opts in.
    pub fn should_retrieve_job_logs(event: &str, platform: &Platform, proxy_host_differs: bool) -> bool {
        matches!(event, "failed" | "retry" | "succeeded") && proxy_host_differs && platform.retrieve_job_logs
    }
}

#[cfg(test)]
#[path = "task_events_manager_tests.rs"]
mod tests;
