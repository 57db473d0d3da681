// SPDX-License-Identifier: MIT

//! Shared SSH fan-out primitive (spec.md §4.12, §4.15): `RemoteManager`,
//! `JobManager`'s remote submit/poll/kill, and the remote-clean driver all
//! group work by `(host, user)` and run one SSH invocation per group. This
//! module owns that grouping and the transport-failure classification
//! (rc 255), so the three callers share one notion of "SSH is down".

use indexmap::IndexMap;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum SshError {
    #[error("failed to spawn {0:?}: {1}")]
    Spawn(String, #[source] std::io::Error),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("command output was not valid UTF-8")]
    NonUtf8Output,
}

/// SSH transport failure per spec.md §4.15: "exit code 255 is treated as
/// SSH-transport failure". Anything else is the remote command's own rc.
pub const SSH_TRANSPORT_FAILURE_RC: i32 = 255;

#[derive(Debug, Clone)]
pub struct SshInvocation {
    pub ssh_command: String,
    pub host: String,
    pub user: Option<String>,
    /// The remote argv, passed to `ssh` after the destination.
    pub remote_argv: Vec<String>,
    pub stdin: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SshOutcome {
    Ran { rc: i32, stdout: String, stderr: String },
    TransportFailure { stderr: String },
}

impl SshOutcome {
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, SshOutcome::TransportFailure { .. })
    }
}

/// Groups items by `(host, user)` so each SSH invocation can carry a whole
/// group's worth of work (e.g. a chunked `jobs-submit` argument list).
pub fn group_by_host_user<T, F>(items: Vec<T>, key: F) -> IndexMap<(String, Option<String>), Vec<T>>
where
    F: Fn(&T) -> (String, Option<String>),
{
    let mut groups: IndexMap<(String, Option<String>), Vec<T>> = IndexMap::new();
    for item in items {
        let k = key(&item);
        groups.entry(k).or_default().push(item);
    }
    groups
}

/// Runs SSH invocations, mostly a thin wrapper over `tokio::process::Command`
/// with a timeout and the destination-string assembly factored out so
/// callers never hand-build `user@host`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SshFanout;

impl SshFanout {
    pub fn new() -> Self {
        Self
    }

    fn destination(host: &str, user: Option<&str>) -> String {
        match user {
            Some(user) => format!("{user}@{host}"),
            None => host.to_string(),
        }
    }

    pub async fn run(&self, invocation: &SshInvocation) -> Result<SshOutcome, SshError> {
        let destination = Self::destination(&invocation.host, invocation.user.as_deref());
        let mut cmd = Command::new(&invocation.ssh_command);
        cmd.arg(&destination).args(&invocation.remote_argv);
        cmd.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| SshError::Spawn(invocation.ssh_command.clone(), e))?;

        if let Some(data) = &invocation.stdin {
            if let Some(mut stdin) = child.stdin.take() {
                let _ = stdin.write_all(data.as_bytes()).await;
            }
        } else {
            drop(child.stdin.take());
        }

        let output = tokio::time::timeout(invocation.timeout, child.wait_with_output())
            .await
            .map_err(|_| SshError::Timeout(invocation.timeout))?
            .map_err(|e| SshError::Spawn(invocation.ssh_command.clone(), e))?;

        let stdout = String::from_utf8(output.stdout).map_err(|_| SshError::NonUtf8Output)?;
        let stderr = String::from_utf8(output.stderr).map_err(|_| SshError::NonUtf8Output)?;
        let rc = output.status.code().unwrap_or(SSH_TRANSPORT_FAILURE_RC);

        if rc == SSH_TRANSPORT_FAILURE_RC {
            tracing::warn!(host = %invocation.host, %rc, "ssh transport failure");
            Ok(SshOutcome::TransportFailure { stderr })
        } else {
            Ok(SshOutcome::Ran { rc, stdout, stderr })
        }
    }
}

#[cfg(test)]
#[path = "ssh_tests.rs"]
mod tests;
