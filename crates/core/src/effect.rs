// SPDX-License-Identifier: MIT

//! Effects the engine emits for out-of-process work (spec.md §4.13, §5):
//! the engine's main loop never touches subprocess machinery directly, it
//! returns these as data and the scheduler's executor dispatches them
//! through `SubProcPool`/the remote-clean driver.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Special return code meaning "the scheduler is shutting down, abandon
/// this callback".
pub const SUITE_STOPPING: i32 = 143;

/// Everything a subprocess invocation needs, independent of what kind of
/// work it performs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubProcContext {
    /// Groups related invocations for logging/activity correlation
    /// (e.g. `"jobs-submit"`, `"jobs-poll"`, `"ssh:clean"`).
    pub cmd_key: String,
    pub cmd: Vec<String>,
    pub env: HashMap<String, String>,
    pub stdin_str: Option<String>,
    pub stdin_files: Vec<String>,
    /// Identifiers (e.g. `(name, point, submit_num)` tuples rendered as
    /// strings) the callback should attribute output lines back to.
    pub id_keys: Vec<String>,
}

impl SubProcContext {
    pub fn new(cmd_key: impl Into<String>, cmd: Vec<String>) -> Self {
        Self {
            cmd_key: cmd_key.into(),
            cmd,
            env: HashMap::new(),
            stdin_str: None,
            stdin_files: Vec::new(),
            id_keys: Vec::new(),
        }
    }
}

/// A side-effecting request the engine wants performed off the main loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SchedulerEffect {
    RunSubprocess(SubProcContext),
    SendMail { recipient: String, subject: String, body: String },
    /// Reply to a command-queue caller: `(ok, message)`.
    ReplyToCommand { command_id: String, ok: bool, message: String },
}

#[cfg(test)]
#[path = "effect_tests.rs"]
mod tests;
