// SPDX-License-Identifier: MIT

//! Property tests over the pure, state-machine-adjacent pieces of the
//! engine that are cheap to generate inputs for (spec.md §4.4, §4.11).
//! These complement the fixed scenario tests with randomized coverage
//! of the same invariants.

use cylc_core::ActionTimer;
use cylc_core::task_state::TaskStatus;
use proptest::prelude::*;

proptest! {
    /// Arming a delay schedule always produces a non-decreasing sequence
    /// of due times, and the timer only reports due once `now_ms` has
    /// actually reached that deadline.
    #[test]
    fn armed_deadlines_never_go_backwards(delays in prop::collection::vec(0u64..10_000, 1..6), start in 0u64..1_000_000) {
        let mut timer = ActionTimer::new(delays.clone());
        let mut now = start;
        let mut last_due = 0u64;
        for delay in &delays {
            prop_assert!(timer.next(now));
            let due = timer.due_at_ms().unwrap_or_else(|| panic!("timer armed but due_at_ms is None"));
            prop_assert_eq!(due, now + delay);
            prop_assert!(due >= last_due);
            prop_assert!(!timer.reached_due(due.saturating_sub(1)));
            prop_assert!(timer.reached_due(due));
            last_due = due;
            now = due;
        }
        prop_assert!(!timer.next(now), "schedule is exhausted once every delay has been armed");
    }

    /// `no_exhaust` timers keep re-arming at the final delay forever
    /// instead of refusing further attempts (execution polling, spec.md
    /// §4.11, must keep polling at its last interval indefinitely).
    #[test]
    fn no_exhaust_timer_never_refuses_a_rearm(delays in prop::collection::vec(1u64..10_000, 1..4), extra_rearms in 0usize..5) {
        let last_delay = *delays.last().unwrap_or_else(|| panic!("generated an empty delay list"));
        let mut timer = ActionTimer::new(delays.clone()).no_exhaust(true);
        let mut now = 0u64;
        for _ in 0..delays.len() + extra_rearms {
            prop_assert!(timer.next(now));
            now = timer.due_at_ms().unwrap_or_else(|| panic!("due_at_ms missing after next()"));
        }
        prop_assert!(!timer.is_exhausted());
        let _ = last_delay;
    }
}

proptest! {
    /// The anti-regression job-rank ordering (spec.md §4.11) matches the
    /// order job messages are actually expected to arrive in: a message
    /// never ranks below one the proxy has already observed unless it's
    /// one of the three terminal outcomes, which all tie at the top.
    #[test]
    fn job_rank_matches_expected_message_arrival_order(a in any_ranked_status(), b in any_ranked_status()) {
        let expected_rank = |s: TaskStatus| match s {
            TaskStatus::Submitted => 0,
            TaskStatus::SubmitFailed => 1,
            TaskStatus::Running => 2,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Expired => 3,
            _ => unreachable!("any_ranked_status only generates ranked statuses"),
        };
        prop_assert_eq!(a.job_rank(), Some(expected_rank(a)));
        prop_assert_eq!(b.job_rank(), Some(expected_rank(b)));
        if expected_rank(a) == expected_rank(b) {
            prop_assert!(a == b || matches!((a, b), (TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Expired, TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Expired)));
        }
    }

    /// Every status a job message can never directly report (only reached
    /// via queue promotion or an operator-forced reset) has no rank at
    /// all, so it can never participate in the anti-regression check.
    #[test]
    fn unranked_statuses_are_exempt_from_anti_regression(s in any_unranked_status()) {
        prop_assert_eq!(s.job_rank(), None);
    }
}

fn any_ranked_status() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::Submitted),
        Just(TaskStatus::SubmitFailed),
        Just(TaskStatus::Running),
        Just(TaskStatus::Succeeded),
        Just(TaskStatus::Failed),
        Just(TaskStatus::Expired),
    ]
}

fn any_unranked_status() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::Waiting),
        Just(TaskStatus::Queued),
        Just(TaskStatus::Ready),
        Just(TaskStatus::SubmitRetrying),
        Just(TaskStatus::Retrying),
    ]
}
