// SPDX-License-Identifier: MIT

//! Per-install-target remote initialisation and host selection
//! (spec.md §4.12). `RemoteManager` never runs SSH itself — it hands the
//! scheduler an `SshInvocation` to submit through `cylc-adapters::SshFanout`
//! and is told the outcome back via [`RemoteManager::record_init_result`].

use cylc_adapters::ssh::{SshInvocation, SshOutcome};
use cylc_core::platform::InstallTarget;
use indexmap::IndexMap;
use std::time::Duration;

/// Result of remote init for one install target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteInitState {
    Pending,
    Ok,
    Failed,
}

/// Raised when host selection itself cannot proceed (spec.md §4.12): the
/// caller should escalate the owning task straight to `submit-failed`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("remote host selection failed: {0}")]
pub struct RemoteMgmtError(pub String);

/// One outcome of [`RemoteManager::select_host`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostSelection {
    Chosen(String),
    /// No host available this tick; retry next tick.
    Retry,
}

/// Tracks remote-init state per install target and the per-run identifier
/// embedded in job contexts for event correlation.
pub struct RemoteManager {
    uuid_str: String,
    init_state: IndexMap<InstallTarget, RemoteInitState>,
}

impl RemoteManager {
    pub fn new(uuid_str: impl Into<String>) -> Self {
        Self { uuid_str: uuid_str.into(), init_state: IndexMap::new() }
    }

    pub fn uuid_str(&self) -> &str {
        &self.uuid_str
    }

    /// `remoteInit(host, owner)` (spec.md §4.12): idempotent per install
    /// target. The first call for a target starts the async init job (the
    /// caller is responsible for actually dispatching it, via
    /// [`RemoteManager::build_init_invocation`]); subsequent calls return
    /// the cached result without re-dispatching.
    pub fn remote_init(&mut self, target: &InstallTarget) -> RemoteInitState {
        *self.init_state.entry(target.clone()).or_insert(RemoteInitState::Pending)
    }

    pub fn record_init_result(&mut self, target: &InstallTarget, ok: bool) {
        let state = if ok { RemoteInitState::Ok } else { RemoteInitState::Failed };
        self.init_state.insert(target.clone(), state);
        tracing::info!(target = %target.as_str(), ok, "remote init completed");
    }

    pub fn reset_init(&mut self, target: &InstallTarget) {
        self.init_state.shift_remove(target);
    }

    /// Build the SSH invocation that copies service files (authentication
    /// material, uuid) to `$HOME/cylc-run/<workflow>/.service/` on the
    /// remote (spec.md §4.12).
    pub fn build_init_invocation(
        &self,
        ssh_command: &str,
        host: &str,
        owner: Option<&str>,
        workflow: &str,
        timeout: Duration,
    ) -> SshInvocation {
        SshInvocation {
            ssh_command: ssh_command.to_string(),
            host: host.to_string(),
            user: owner.map(str::to_string),
            remote_argv: vec![
                "cylc".to_string(),
                "remote-init".to_string(),
                self.uuid_str.clone(),
                format!("cylc-run/{workflow}/.service"),
            ],
            stdin: None,
            timeout,
        }
    }

    /// Pick among a platform's candidate hosts in priority order. A real
    /// implementation may run a configured host-selection command per
    /// candidate; this picks the first that looks usable and otherwise asks
    /// the caller to retry.
    pub fn select_host(&self, candidates: &[String]) -> Result<HostSelection, RemoteMgmtError> {
        match candidates.iter().find(|h| !h.trim().is_empty()) {
            Some(host) => Ok(HostSelection::Chosen(host.clone())),
            None if candidates.is_empty() => {
                Err(RemoteMgmtError("no candidate hosts configured".to_string()))
            }
            None => Ok(HostSelection::Retry),
        }
    }

    /// Classify an init SSH run as success/failure for
    /// [`RemoteManager::record_init_result`] (spec.md §4.15's rc-255
    /// transport-failure convention applies here too).
    pub fn init_succeeded(outcome: &SshOutcome) -> bool {
        matches!(outcome, SshOutcome::Ran { rc: 0, .. })
    }
}

#[cfg(test)]
#[path = "remote_manager_tests.rs"]
mod tests;
