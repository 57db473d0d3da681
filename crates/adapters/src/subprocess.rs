// SPDX-License-Identifier: MIT

//! Bounded external-process pool (spec.md §4.13, §5). Workers run on
//! tokio's process driver; every callback is delivered back onto the
//! scheduler's single thread through `inbox`, preserving the "engine
//! state is never touched from worker threads" rule in spec.md §5.

use cylc_core::SubProcContext;
use std::process::{ExitStatus, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::mpsc;

/// Graceful-cancel return code: callbacks for results carrying this rc
/// should bail out rather than act on (possibly truncated) output.
pub const SUITE_STOPPING: i32 = cylc_core::effect::SUITE_STOPPING;

/// The result of running one `SubProcContext`, matched back to its
/// `cmd_key` and `id_keys` by the caller.
#[derive(Debug, Clone)]
pub struct SubProcResult {
    pub cmd_key: String,
    pub id_keys: Vec<String>,
    pub rc: i32,
    pub stdout: String,
    pub stderr: String,
}

/// A bounded pool of external processes. `put` enqueues work; results
/// arrive on the channel returned by `results()`, to be drained on the
/// scheduler's main loop (spec.md §4.14 step 2).
pub struct SubProcPool {
    capacity: usize,
    inflight: usize,
    stopping: bool,
    result_tx: mpsc::Sender<SubProcResult>,
    result_rx: mpsc::Receiver<SubProcResult>,
}

impl SubProcPool {
    pub fn new(capacity: usize) -> Self {
        let (result_tx, result_rx) = mpsc::channel(capacity.max(1) * 4);
        Self { capacity, inflight: 0, stopping: false, result_tx, result_rx }
    }

    /// Stop accepting new work. Already-spawned children still run to
    /// completion and still deliver results; `put` after this is a no-op.
    pub fn stop_enqueueing(&mut self) {
        self.stopping = true;
    }

    pub fn inflight(&self) -> usize {
        self.inflight
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Enqueue a subprocess. Ignored once `stop_enqueueing` has been
    /// called — spec.md §4.13: "scheduler stops enqueueing new work once
    /// stopping".
    pub fn put(&mut self, ctx: SubProcContext) {
        if self.stopping {
            tracing::debug!(cmd_key = %ctx.cmd_key, "dropping subprocess request, pool is stopping");
            return;
        }
        self.inflight += 1;
        let tx = self.result_tx.clone();
        tokio::spawn(async move {
            let result = Self::run(&ctx).await;
            Self::deliver(tx, ctx, result).await;
        });
    }

    async fn deliver(tx: mpsc::Sender<SubProcResult>, ctx: SubProcContext, result: std::io::Result<(ExitStatus, String, String)>) {
        let outcome = match result {
            Ok((status, stdout, stderr)) => SubProcResult {
                cmd_key: ctx.cmd_key,
                id_keys: ctx.id_keys,
                rc: status.code().unwrap_or(-1),
                stdout,
                stderr,
            },
            Err(e) => {
                tracing::warn!(error = %e, cmd_key = %ctx.cmd_key, "subprocess failed to run");
                SubProcResult { cmd_key: ctx.cmd_key, id_keys: ctx.id_keys, rc: -1, stdout: String::new(), stderr: e.to_string() }
            }
        };
        let _ = tx.send(outcome).await;
    }

    async fn run(ctx: &SubProcContext) -> std::io::Result<(ExitStatus, String, String)> {
        let (program, rest) = ctx.cmd.split_first().ok_or_else(|| std::io::Error::other("empty command"))?;
        let mut cmd = Command::new(program);
        cmd.args(rest);
        cmd.envs(ctx.env.iter());
        cmd.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child = cmd.spawn()?;
        if let Some(data) = &ctx.stdin_str {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(data.as_bytes()).await?;
            }
        } else {
            drop(child.stdin.take());
        }
        let output = child.wait_with_output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        Ok((output.status, stdout, stderr))
    }

    /// Drain all results currently available without blocking — called
    /// once per main-loop tick.
    pub fn drain_ready(&mut self) -> Vec<SubProcResult> {
        let mut results = Vec::new();
        while let Ok(result) = self.result_rx.try_recv() {
            self.inflight = self.inflight.saturating_sub(1);
            results.push(result);
        }
        results
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
