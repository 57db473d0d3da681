// SPDX-License-Identifier: MIT

//! A bounded retry/poll schedule (spec.md §4.4): submission retries,
//! execution polling, event-handler retries all drive one of these.
//!
//! Delays and the armed deadline are tracked as millisecond counts rather
//! than `std::time::Duration`/`Instant` so the timer is `Serialize` and
//! round-trips through the persistence layer untouched.

use serde::{Deserialize, Serialize};

/// A schedule of delays (milliseconds), consumed one at a time via
/// [`ActionTimer::next`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTimer {
    delays_ms: Vec<u64>,
    index: usize,
    due_at_ms: Option<u64>,
    num: u32,
    /// When set, exhausting `delays` keeps returning the last delay forever
    /// instead of refusing further attempts (used by execution polling,
    /// which must keep polling at the final interval indefinitely).
    no_exhaust: bool,
}

impl ActionTimer {
    pub fn new(delays_ms: Vec<u64>) -> Self {
        Self { delays_ms, index: 0, due_at_ms: None, num: 0, no_exhaust: false }
    }

    pub fn no_exhaust(mut self, no_exhaust: bool) -> Self {
        self.no_exhaust = no_exhaust;
        self
    }

    pub fn num(&self) -> u32 {
        self.num
    }

    pub fn due_at_ms(&self) -> Option<u64> {
        self.due_at_ms
    }

    fn delay_at(&self, index: usize) -> Option<u64> {
        self.delays_ms.get(index).copied().or_else(|| {
            if self.no_exhaust {
                self.delays_ms.last().copied()
            } else {
                None
            }
        })
    }

    /// Arm the next delay in the schedule, returning `false` if the schedule
    /// is exhausted (and not `no_exhaust`).
    pub fn next(&mut self, now_ms: u64) -> bool {
        match self.delay_at(self.index) {
            Some(delay) => {
                self.due_at_ms = Some(now_ms + delay);
                if self.index < self.delays_ms.len() {
                    self.index += 1;
                }
                self.num += 1;
                true
            }
            None => false,
        }
    }

    /// Whether the armed delay has elapsed.
    pub fn reached_due(&self, now_ms: u64) -> bool {
        self.due_at_ms.map(|due| now_ms >= due).unwrap_or(false)
    }

    /// Clear back to the start of the schedule (a successful attempt resets
    /// the retry count for the next failure).
    pub fn reset(&mut self) {
        self.index = 0;
        self.due_at_ms = None;
        self.num = 0;
    }

    /// True once every delay in the schedule has been armed and no more
    /// remain (never true for a `no_exhaust` timer).
    pub fn is_exhausted(&self) -> bool {
        !self.no_exhaust && self.index >= self.delays_ms.len()
    }
}

#[cfg(test)]
#[path = "action_timer_tests.rs"]
mod tests;
