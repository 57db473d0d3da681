// SPDX-License-Identifier: MIT

//! Shared construction helpers for tests in this crate and downstream
//! crates (gated behind `test-support` so `cylc-engine`/`cylc-adapters` can
//! reuse them without linking proptest into production builds).

use crate::cycle_point::{Calendar, CyclePoint};
use crate::task_def::TaskDefinition;
use crate::task_proxy::TaskProxy;

pub fn point(year: i32, month: u32, day: u32, hour: u32) -> CyclePoint {
    CyclePoint::new(Calendar::Gregorian, year, month, day, hour, 0, 0)
}

pub fn bare_taskdef(name: &str) -> TaskDefinition {
    TaskDefinition::new(name)
}

pub fn waiting_proxy(def: &TaskDefinition, at: CyclePoint) -> TaskProxy {
    TaskProxy::new(def, at, None, 0)
}
