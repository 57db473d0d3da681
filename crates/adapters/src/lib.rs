// SPDX-License-Identifier: MIT

//! Reference adapters for the batch-system registry, SSH fan-out, and
//! subprocess pool collaborators `cylc-engine` drives (spec.md §4.9,
//! §4.12, §4.13).

pub mod batch_system;
pub mod errors;
pub mod ssh;
pub mod subprocess;

pub use batch_system::{BatchSystem, BatchSystemRegistry, JobConfig};
pub use errors::AdapterError;
pub use ssh::{SshError, SshFanout, SshInvocation, SshOutcome};
pub use subprocess::{SubProcPool, SUITE_STOPPING};
