// SPDX-License-Identifier: MIT

//! A [`Sequence`] generates the cycle points a task recurs on.

use crate::cycle_point::{BadSequence, Calendar, CycleOffset, CyclePoint};
use serde::{Deserialize, Serialize};

/// A maximum number of steps to take while searching for the next point,
/// guarding against a non-advancing step silently looping forever.
const MAX_SEARCH_STEPS: u32 = 100_000;

/// Generates cycle points starting at `start`, stepping by `step`, optionally
/// bounded above by `bound`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    pub calendar: Calendar,
    pub start: CyclePoint,
    pub step: CycleOffset,
    pub bound: Option<CyclePoint>,
}

impl Sequence {
    pub fn new(start: CyclePoint, step: CycleOffset) -> Result<Self, BadSequence> {
        if !step.is_positive() {
            return Err(BadSequence::NonAdvancingStep);
        }
        Ok(Self { calendar: start.calendar, start, step, bound: None })
    }

    pub fn with_bound(mut self, bound: CyclePoint) -> Self {
        self.bound = Some(bound);
        self
    }

    /// The first point on or after `start` (respecting `bound`).
    pub fn first(&self) -> Option<CyclePoint> {
        if let Some(bound) = self.bound {
            if self.start > bound {
                return None;
            }
        }
        Some(self.start)
    }

    /// True iff `p` is exactly one of this sequence's generated points.
    pub fn is_on(&self, p: &CyclePoint) -> bool {
        if *p < self.start {
            return false;
        }
        if let Some(bound) = self.bound {
            if *p > bound {
                return false;
            }
        }
        let mut cursor = self.start;
        for _ in 0..MAX_SEARCH_STEPS {
            if cursor == *p {
                return true;
            }
            if cursor > *p {
                return false;
            }
            cursor = cursor.add_offset(&self.step);
        }
        false
    }

    /// The first generated point strictly after `p`, or `None` if the
    /// sequence is exhausted by `bound`.
    pub fn next_after(&self, p: &CyclePoint) -> Option<CyclePoint> {
        let mut cursor = self.start;
        if cursor > *p {
            return self.within_bound(cursor);
        }
        for _ in 0..MAX_SEARCH_STEPS {
            let candidate = cursor.add_offset(&self.step);
            if candidate > *p {
                return self.within_bound(candidate);
            }
            cursor = candidate;
        }
        None
    }

    fn within_bound(&self, p: CyclePoint) -> Option<CyclePoint> {
        match self.bound {
            Some(bound) if p > bound => None,
            _ => Some(p),
        }
    }
}

#[cfg(test)]
#[path = "sequence_tests.rs"]
mod tests;
