// SPDX-License-Identifier: MIT

//! Wire formats at the engine's external boundaries (spec.md §6): the
//! command queue, the `cylc jobs-*` helper protocol, and the per-job
//! `job.status` state file.

pub mod command;
pub mod job_status_file;
pub mod jobs_output;
pub mod submit_stdin;

pub use command::{Command, CommandEnvelope, CommandReply};
pub use job_status_file::{JobExit, JobStatusFile};
pub use jobs_output::JobsOutputLine;
pub use submit_stdin::{frame_job_file, parse_framed_stdin, FramedJobFile};
