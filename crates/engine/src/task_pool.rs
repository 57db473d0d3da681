// SPDX-License-Identifier: MIT

//! Runahead/active task pools (spec.md §4.7): the heaviest subsystem in
//! the engine. Proxies live in an arena keyed by `(name, point)` per the
//! "cyclic structures" design note in spec.md §9 — nothing outside this
//! module owns a `TaskProxy` directly.

use cylc_core::prerequisite::PrereqKey;
use cylc_core::{CycleOffset, CyclePoint, Sequence, TaskDefinition, TaskProxy, TaskStatus};
use indexmap::IndexMap;
use std::collections::HashSet;

pub type TaskId = (String, CyclePoint);

/// Runahead bound policy (spec.md §4.7).
#[derive(Debug, Clone, Copy)]
pub enum RunaheadLimit {
    /// Max number of distinct active cycle points.
    Count(usize),
    /// Max duration past `base`.
    Duration(CycleOffset),
}

/// A task removed because its suicide prerequisites were satisfied, for
/// the caller to log (spec.md §4.7: "active-phase suicide is logged as
/// warning").
#[derive(Debug, Clone)]
pub struct SuicideEvent {
    pub id: TaskId,
    pub was_active: bool,
}

#[derive(Debug, Default)]
pub struct TaskPool {
    taskdefs: IndexMap<String, TaskDefinition>,
    runahead: IndexMap<TaskId, TaskProxy>,
    active: IndexMap<TaskId, TaskProxy>,
    queue_limits: IndexMap<String, usize>,
    runahead_limit: Option<RunaheadLimitCell>,
    max_future_offset: CycleOffset,
    stop_point: Option<CyclePoint>,
    held: bool,
}

#[derive(Debug, Clone, Copy)]
struct RunaheadLimitCell(RunaheadLimit);

impl TaskPool {
    pub fn new(taskdefs: IndexMap<String, TaskDefinition>, runahead_limit: RunaheadLimit) -> Self {
        Self {
            taskdefs,
            runahead: IndexMap::new(),
            active: IndexMap::new(),
            queue_limits: IndexMap::new(),
            runahead_limit: Some(RunaheadLimitCell(runahead_limit)),
            max_future_offset: CycleOffset::default(),
            stop_point: None,
            held: false,
        }
    }

    pub fn set_queue_limit(&mut self, queue: impl Into<String>, limit: usize) {
        self.queue_limits.insert(queue.into(), limit);
    }

    pub fn set_stop_point(&mut self, point: Option<CyclePoint>) {
        self.stop_point = point;
    }

    pub fn set_held(&mut self, held: bool) {
        self.held = held;
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn taskdef(&self, name: &str) -> Option<&TaskDefinition> {
        self.taskdefs.get(name)
    }

    /// Insert a fresh proxy at `(name, point)`, placing it in whichever
    /// pool the current runahead cutoff puts it in. No-op if a proxy
    /// already exists there (invariant 1, spec.md §8).
    pub fn insert(&mut self, name: &str, point: CyclePoint) -> bool {
        let id = (name.to_string(), point);
        if self.active.contains_key(&id) || self.runahead.contains_key(&id) {
            return false;
        }
        let Some(taskdef) = self.taskdefs.get(name) else { return false };
        let proxy = TaskProxy::new(taskdef, point, None, 0);
        let cutoff = self.runahead_cutoff();
        if cutoff.is_some_and(|c| point <= c) {
            self.active.insert(id, proxy);
        } else {
            self.runahead.insert(id, proxy);
        }
        true
    }

    pub fn get(&self, id: &TaskId) -> Option<&TaskProxy> {
        self.active.get(id).or_else(|| self.runahead.get(id))
    }

    pub fn get_mut(&mut self, id: &TaskId) -> Option<&mut TaskProxy> {
        if self.active.contains_key(id) {
            self.active.get_mut(id)
        } else {
            self.runahead.get_mut(id)
        }
    }

    pub fn active_ids(&self) -> impl Iterator<Item = &TaskId> {
        self.active.keys()
    }

    pub fn all_ids(&self) -> impl Iterator<Item = &TaskId> {
        self.active.keys().chain(self.runahead.keys())
    }

    pub fn len(&self) -> usize {
        self.active.len() + self.runahead.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `base`: the minimum point, across both pools, whose task is not yet
    /// succeeded/expired.
    fn base(&self) -> Option<CyclePoint> {
        self.active
            .iter()
            .chain(self.runahead.iter())
            .filter(|(_, p)| !matches!(p.status(), TaskStatus::Succeeded | TaskStatus::Expired))
            .map(|(id, _)| id.1)
            .min()
    }

    /// The latest point eligible for the active pool, per the configured
    /// runahead policy (spec.md §4.7). `None` until there is at least one
    /// live task to anchor `base`.
    pub fn runahead_cutoff(&self) -> Option<CyclePoint> {
        let base = self.base()?;
        let cutoff = match self.runahead_limit.map(|c| c.0) {
            Some(RunaheadLimit::Duration(limit)) => base.add_offset(&self.effective_limit(limit)),
            Some(RunaheadLimit::Count(n)) => self.nth_distinct_point_from(base, n.max(1)),
            None => base,
        };
        match self.stop_point {
            Some(stop) if stop < cutoff => Some(stop),
            _ => Some(cutoff),
        }
    }

    fn effective_limit(&self, limit: CycleOffset) -> CycleOffset {
        if limit.total_seconds_approx() < self.max_future_offset.total_seconds_approx() {
            tracing::warn!("runahead duration limit is smaller than the max future trigger offset");
        }
        limit
    }

    fn nth_distinct_point_from(&self, base: CyclePoint, n: usize) -> CyclePoint {
        let mut points: Vec<CyclePoint> = self
            .taskdefs
            .values()
            .flat_map(|def| def.sequences.iter())
            .filter_map(|seq| seq.first())
            .filter(|p| *p >= base)
            .collect();
        points.sort();
        points.dedup();
        let extended = n + self.max_future_offset_cycles();
        points.get(extended.saturating_sub(1)).copied().unwrap_or(base)
    }

    fn max_future_offset_cycles(&self) -> usize {
        if self.max_future_offset.total_seconds_approx() > 0 {
            1
        } else {
            0
        }
    }

    pub fn set_max_future_offset(&mut self, offset: CycleOffset) {
        self.max_future_offset = offset;
    }

    /// Move every runahead proxy whose point is within the current cutoff
    /// into the active pool (spec.md §4.7 "Release ordering").
    pub fn release_runahead_tasks(&mut self) -> Vec<TaskId> {
        let Some(cutoff) = self.runahead_cutoff() else { return Vec::new() };
        let ready: Vec<TaskId> = self.runahead.iter().filter(|(id, _)| id.1 <= cutoff).map(|(id, _)| id.clone()).collect();
        for id in &ready {
            if let Some(proxy) = self.runahead.shift_remove(id) {
                self.active.insert(id.clone(), proxy);
            }
        }
        ready
    }

    /// Recompute every active proxy's prerequisite-satisfaction bits
    /// against the union of completed outputs in both pools. Idempotent
    /// (invariant 7, spec.md §8): calling twice in a row with no new
    /// completions changes nothing.
    pub fn match_dependencies(&mut self) {
        let completed: HashSet<PrereqKey> = self
            .active
            .iter()
            .chain(self.runahead.iter())
            .flat_map(|(id, proxy)| {
                proxy.outputs.completed_messages().map(move |msg| PrereqKey::new(id.0.clone(), id.1, msg.to_string()))
            })
            .collect();

        for proxy in self.active.values_mut().chain(self.runahead.values_mut()) {
            for prereq in proxy.prerequisites.iter_mut() {
                prereq.match_completed(&completed);
            }
            for prereq in proxy.suicide_prerequisites.iter_mut() {
                prereq.match_completed(&completed);
            }
        }
    }

    /// Promote any active proxy whose armed retry timer has elapsed back
    /// to `ready` (spec.md §4.4, §4.11): a retry's due time is the only
    /// thing that moves it out of `retrying`/`submit-retrying`. `to_ready`
    /// already accepts both as source states; queue limits don't apply to
    /// a resubmission, only to a task's first entry into the pool.
    pub fn promote_due_retries(&mut self, now_ms: u64) -> Vec<TaskId> {
        let due: Vec<TaskId> = self
            .active
            .iter()
            .filter(|(_, p)| match p.status() {
                TaskStatus::Retrying => p.timers.execution_retry_timer.as_ref().is_some_and(|t| t.reached_due(now_ms)),
                TaskStatus::SubmitRetrying => p.timers.submit_retry_timer.as_ref().is_some_and(|t| t.reached_due(now_ms)),
                _ => false,
            })
            .map(|(id, _)| id.clone())
            .collect();

        let mut promoted = Vec::new();
        for id in due {
            if let Some(proxy) = self.active.get_mut(&id) {
                if proxy.state_mut().to_ready() {
                    promoted.push(id);
                }
            }
        }
        promoted
    }

    /// Queue promotion/release for one named queue (spec.md §4.7 "Queues").
    /// Returns the ids released to `ready` this call.
    pub fn process_queue(&mut self, queue: &str) -> Vec<TaskId> {
        let limit = self.queue_limits.get(queue).copied();

        let members: Vec<TaskId> = self
            .active
            .iter()
            .filter(|(_, p)| self.taskdefs.get(&p.name).map(|d| d.queue == queue).unwrap_or(false))
            .map(|(id, _)| id.clone())
            .collect();

        for id in &members {
            if let Some(proxy) = self.active.get_mut(id) {
                if proxy.status() == TaskStatus::Waiting && proxy.is_ready() {
                    proxy.state_mut().to_queued();
                }
            }
        }

        let active_count = members
            .iter()
            .filter(|id| self.active.get(*id).is_some_and(|p| matches!(p.status(), TaskStatus::Ready | TaskStatus::Submitted | TaskStatus::Running)))
            .count();

        let slots = limit.map(|l| l.saturating_sub(active_count)).unwrap_or(usize::MAX);
        let mut released = Vec::new();
        for id in members {
            if released.len() >= slots {
                break;
            }
            let Some(proxy) = self.active.get_mut(&id) else { continue };
            let forced = proxy.manual_trigger;
            if proxy.status() == TaskStatus::Queued || forced {
                proxy.state_mut().to_ready();
                released.push(id);
            }
        }
        released
    }

    /// `spawnSuccessor` (spec.md §4.7): create `(name, nextPoint)` exactly
    /// once per instance, when succeeded/expired, `spawn_ahead`, or status
    /// has reached `ready`.
    pub fn spawn_all_tasks(&mut self) -> Vec<TaskId> {
        let candidates: Vec<TaskId> = self
            .active
            .iter()
            .chain(self.runahead.iter())
            .filter(|(_, p)| {
                !p.spawned
                    && (matches!(p.status(), TaskStatus::Succeeded | TaskStatus::Expired)
                        || self.taskdefs.get(&p.name).map(|d| d.spawn_ahead).unwrap_or(false)
                        || matches!(p.status(), TaskStatus::Ready | TaskStatus::Submitted | TaskStatus::Running))
            })
            .map(|(id, _)| id.clone())
            .collect();

        let mut spawned = Vec::new();
        for id in candidates {
            let Some(taskdef) = self.taskdefs.get(&id.0).cloned() else { continue };
            let sequence = taskdef.sequences.first().cloned();
            let Some(sequence) = sequence else { continue };
            let Some(proxy) = self.get(&id) else { continue };
            let next_id = proxy.advance_to_next_point(&sequence, &taskdef).map(|p| (p.name.clone(), p.point));
            if let Some(next_id) = next_id {
                if self.insert(&next_id.0, next_id.1) {
                    spawned.push(next_id);
                }
            }
            if let Some(proxy) = self.get_mut(&id) {
                proxy.spawned = true;
            }
        }
        spawned
    }

    /// Remove any proxy whose suicide prerequisites are fully satisfied,
    /// spawning its successor first to preserve succession (spec.md §4.7).
    pub fn remove_suiciding_tasks(&mut self) -> Vec<SuicideEvent> {
        let candidates: Vec<TaskId> = self
            .active
            .iter()
            .chain(self.runahead.iter())
            .filter(|(_, p)| !p.suicide_prerequisites.is_empty() && p.suicide_prerequisites.iter().all(|pr| pr.is_satisfied()))
            .map(|(id, _)| id.clone())
            .collect();

        let mut events = Vec::new();
        for id in candidates {
            let was_active = self.active.contains_key(&id);
            if !self.get(&id).map(|p| p.spawned).unwrap_or(true) {
                if let (Some(taskdef), Some(sequence)) =
                    (self.taskdefs.get(&id.0).cloned(), self.taskdefs.get(&id.0).and_then(|d| d.sequences.first().cloned()))
                {
                    let next_id = self.get(&id).and_then(|p| p.advance_to_next_point(&sequence, &taskdef)).map(|p| (p.name.clone(), p.point));
                    if let Some(next_id) = next_id {
                        self.insert(&next_id.0, next_id.1);
                    }
                }
            }
            if was_active {
                self.active.shift_remove(&id);
                tracing::warn!(name = %id.0, point = %id.1, "removing task: suicide prerequisites satisfied");
            } else {
                self.runahead.shift_remove(&id);
            }
            events.push(SuicideEvent { id, was_active });
        }
        events
    }

    /// Remove succeeded/expired proxies once nothing downstream can still
    /// reference their outputs (spec.md §4.7 "Spent task removal").
    /// `cleanup_cutoff` maps a task name to the furthest downstream offset
    /// referring back to its outputs.
    pub fn remove_spent_tasks(&mut self, cleanup_cutoff: &IndexMap<String, CycleOffset>) -> Vec<TaskId> {
        let earliest_unsatisfied = self.earliest_unsatisfied_point();
        let Some(earliest_unsatisfied) = earliest_unsatisfied else { return Vec::new() };

        let candidates: Vec<TaskId> = self
            .active
            .iter()
            .filter(|(_, p)| p.spawned && matches!(p.status(), TaskStatus::Succeeded | TaskStatus::Expired))
            .filter_map(|(id, _)| {
                let cutoff = cleanup_cutoff.get(&id.0).copied().unwrap_or_default();
                let horizon = id.1.add_offset(&cutoff);
                (horizon < earliest_unsatisfied).then(|| id.clone())
            })
            .collect();

        for id in &candidates {
            self.active.shift_remove(id);
        }
        candidates
    }

    fn earliest_unsatisfied_point(&self) -> Option<CyclePoint> {
        let waiting_or_held = self
            .active
            .iter()
            .chain(self.runahead.iter())
            .filter(|(_, p)| p.is_held() || matches!(p.status(), TaskStatus::Waiting))
            .map(|(id, _)| id.1);
        let unspawned_next = self.active.iter().chain(self.runahead.iter()).filter(|(_, p)| !p.spawned).map(|(id, _)| id.1);
        waiting_or_held.chain(unspawned_next).min()
    }

    /// Remove a task instance directly regardless of suicide prerequisites
    /// (the `remove` command, spec.md §6): for explicit operator-requested
    /// removal rather than the suicide-trigger path.
    pub fn force_remove(&mut self, id: &TaskId) -> bool {
        if self.active.shift_remove(id).is_some() {
            return true;
        }
        self.runahead.shift_remove(id).is_some()
    }

    /// Stalled iff not held, nothing active in a live-dispatch status, and
    /// at least one waiting proxy has unmet non-clock prerequisites
    /// (spec.md §4.7).
    pub fn is_stalled(&self) -> bool {
        if self.held {
            return false;
        }
        let any_active = self.active.values().any(|p| matches!(p.status(), TaskStatus::Ready | TaskStatus::Submitted | TaskStatus::Running));
        if any_active {
            return false;
        }
        self.active
            .values()
            .chain(self.runahead.values())
            .any(|p| p.status() == TaskStatus::Waiting && !p.prerequisites.iter().all(|pr| pr.is_satisfied()))
    }
}

#[cfg(test)]
#[path = "task_pool_tests.rs"]
mod tests;
