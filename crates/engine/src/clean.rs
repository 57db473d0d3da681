// SPDX-License-Identifier: MIT

//! Workflow run-directory cleanup, local and remote (spec.md §4.15).
//!
//! Local clean is plain filesystem work; remote clean fans out over SSH
//! through the shared [`cylc_adapters::ssh`] primitive, grouped by install
//! target rather than by host (many hosts can share one target's state).

use crate::errors::{CleanError, FatalError};
use cylc_adapters::ssh::{SshFanout, SshInvocation, SshOutcome};
use cylc_core::platform::Platform;
use indexmap::IndexMap;
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Request to clean one workflow's run directory.
#[derive(Debug, Clone)]
pub struct CleanRequest {
    pub workflow: String,
    pub cylc_run_root: PathBuf,
    /// Glob patterns relative to the run dir; empty means "clean everything".
    pub rm_patterns: Vec<String>,
    pub local_only: bool,
    pub remote_only: bool,
    pub remote_timeout: Duration,
}

/// Declared symlink targets for `log`, `share`, `share/cycle`, `work`, or
/// the run dir itself (spec.md §6 filesystem layout).
#[derive(Debug, Clone, Default)]
pub struct SymlinkDirs {
    /// Relative path under the run dir (e.g. `"log"`) → absolute target.
    pub dirs: IndexMap<String, PathBuf>,
}

fn run_dir(req: &CleanRequest) -> PathBuf {
    req.cylc_run_root.join(&req.workflow)
}

/// Reject a pattern whose normalized form would escape the run directory
/// (spec.md §4.15: any `..` component after normalization).
fn validate_pattern(pattern: &str) -> Result<(), FatalError> {
    let trimmed = pattern.trim_end_matches('/');
    for component in Path::new(trimmed).components() {
        if matches!(component, std::path::Component::ParentDir) {
            return Err(FatalError::BadGlob(pattern.to_string()));
        }
    }
    if trimmed == ".." || Path::new(trimmed).is_absolute() {
        return Err(FatalError::BadGlob(pattern.to_string()));
    }
    Ok(())
}

/// **Local check** (spec.md §4.15): the run dir must exist (or be a broken
/// symlink), the workflow must not have a live scheduler, and every
/// `rm_patterns` entry must stay inside the run dir.
pub fn local_check(req: &CleanRequest, contact_file_reports_live: bool) -> Result<PathBuf, CleanError> {
    let dir = run_dir(req);
    let exists = dir.symlink_metadata().is_ok();
    if !exists {
        return Err(CleanError::Io {
            path: dir.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "run directory does not exist"),
        });
    }
    if contact_file_reports_live {
        return Err(FatalError::WorkflowRunning(req.workflow.clone()).into());
    }
    for pattern in &req.rm_patterns {
        validate_pattern(pattern)?;
    }
    Ok(dir)
}

fn io_err(path: &Path, source: std::io::Error) -> CleanError {
    CleanError::Io { path: path.display().to_string(), source }
}

/// Remove a symlink dir: delete the target directory, then the symlink
/// itself (spec.md §4.15's `remove_target_then_link`).
fn remove_target_then_link(link: &Path, target: &Path) -> Result<(), CleanError> {
    if target.exists() {
        std::fs::remove_dir_all(target).map_err(|e| io_err(target, e))?;
    }
    if link.symlink_metadata().is_ok() {
        std::fs::remove_file(link).or_else(|_| std::fs::remove_dir(link)).map_err(|e| io_err(link, e))?;
    }
    Ok(())
}

/// **Wholesale clean** (spec.md §4.15): remove every declared symlink dir's
/// target then the run dir itself, then tidy the `runN` sibling and any now
/// empty ancestors up to the cylc-run root, preserving `_cylc-install`.
pub fn wholesale_clean(req: &CleanRequest, symlinks: &SymlinkDirs) -> Result<(), CleanError> {
    let dir = run_dir(req);
    for (relpath, target) in &symlinks.dirs {
        remove_target_then_link(&dir.join(relpath), target)?;
    }
    if dir.exists() {
        std::fs::remove_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
    }

    let parent = req.cylc_run_root.clone();
    let run_n = parent.join(format!("{}/runN", workflow_base(&req.workflow)));
    if let Ok(meta) = run_n.symlink_metadata() {
        if meta.file_type().is_symlink() {
            let points_at_removed = std::fs::read_link(&run_n).map(|t| t == dir).unwrap_or(false);
            if points_at_removed {
                let _ = std::fs::remove_file(&run_n);
            }
        }
    }

    remove_empty_ancestors(&dir, &req.cylc_run_root);
    Ok(())
}

fn workflow_base(workflow: &str) -> &str {
    workflow.rsplit('/').next().unwrap_or(workflow)
}

/// Walk upward from `start`'s parent, removing empty directories until
/// `root` (exclusive) or a non-empty dir, never removing `_cylc-install`.
fn remove_empty_ancestors(start: &Path, root: &Path) {
    let mut current = start.parent().map(Path::to_path_buf);
    while let Some(dir) = current {
        if dir == *root || !dir.starts_with(root) {
            break;
        }
        if dir.file_name().and_then(|n| n.to_str()) == Some("_cylc-install") {
            break;
        }
        match std::fs::read_dir(&dir) {
            Ok(mut entries) if entries.next().is_none() => {
                if std::fs::remove_dir(&dir).is_err() {
                    break;
                }
                current = dir.parent().map(Path::to_path_buf);
            }
            _ => break,
        }
    }
}

/// **Targeted clean** (spec.md §4.15): expand each pattern under the run
/// dir, skip matches nested under an already-matched directory, and delete
/// symlink-dir matches via `remove_target_then_link`, everything else by
/// plain recursive removal. A trailing `/` restricts matches to directories.
pub fn targeted_clean(req: &CleanRequest, symlinks: &SymlinkDirs) -> Result<Vec<PathBuf>, CleanError> {
    let dir = run_dir(req);
    let mut matches: Vec<PathBuf> = Vec::new();

    for pattern in &req.rm_patterns {
        let dirs_only = pattern.ends_with('/');
        let full_pattern = dir.join(pattern.trim_end_matches('/')).to_string_lossy().into_owned();
        let paths = glob::glob(&full_pattern)
            .map_err(|e| CleanError::Fatal(FatalError::BadGlob(format!("{pattern}: {e}"))))?;
        for entry in paths.filter_map(Result::ok) {
            if dirs_only && !entry.is_dir() {
                continue;
            }
            matches.push(entry);
        }
    }

    matches.sort();
    matches.dedup();
    let mut kept: Vec<PathBuf> = Vec::new();
    for candidate in matches {
        if kept.iter().any(|parent: &PathBuf| candidate.starts_with(parent) && candidate != *parent) {
            continue;
        }
        kept.push(candidate);
    }

    for path in &kept {
        let relpath = path.strip_prefix(&dir).unwrap_or(path).to_string_lossy().into_owned();
        if let Some(target) = symlinks.dirs.get(&relpath) {
            remove_target_then_link(path, target)?;
        } else if path.is_dir() {
            std::fs::remove_dir_all(path).map_err(|e| io_err(path, e))?;
        } else {
            std::fs::remove_file(path).map_err(|e| io_err(path, e))?;
        }
    }
    Ok(kept)
}

/// Build the `cylc clean --local-only` SSH invocation for one platform
/// (spec.md §4.15, §6).
fn build_remote_clean_argv(workflow: &str, rm_patterns: &[String]) -> Vec<String> {
    let mut argv = vec!["cylc".to_string(), "clean".to_string(), "--local-only".to_string(), workflow.to_string()];
    for pattern in rm_patterns {
        argv.push("--rm".to_string());
        argv.push(pattern.clone());
    }
    argv
}

/// Outcome of remote clean for one install target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
    Cleaned,
    Failed,
}

/// **Remote clean** (spec.md §4.15): group platforms by install target
/// (dropping `localhost`), shuffle each target's candidate list, try hosts
/// in order until one succeeds or the list is exhausted, run every target
/// concurrently, and aggregate failures.
pub async fn remote_clean(
    req: &CleanRequest,
    platforms: Vec<Platform>,
) -> Result<IndexMap<String, TargetOutcome>, CleanError> {
    let groups: IndexMap<String, Vec<Platform>> = {
        let mut by_target: IndexMap<String, Vec<Platform>> = IndexMap::new();
        for platform in platforms {
            if platform.is_localhost() {
                continue;
            }
            by_target.entry(platform.install_target.as_str().to_string()).or_default().push(platform);
        }
        by_target
    };

    let mut handles = Vec::new();
    for (target, mut candidates) in groups {
        candidates.shuffle(&mut rand::thread_rng());
        let workflow = req.workflow.clone();
        let rm_patterns = req.rm_patterns.clone();
        let timeout = req.remote_timeout;
        handles.push(tokio::spawn(async move {
            let outcome = try_candidates(&candidates, &workflow, &rm_patterns, timeout).await;
            (target, outcome)
        }));
    }

    let mut results: IndexMap<String, TargetOutcome> = IndexMap::new();
    let mut pending = handles;
    while !pending.is_empty() {
        let mut still_pending = Vec::new();
        for handle in pending {
            if handle.is_finished() {
                if let Ok((target, outcome)) = handle.await {
                    results.insert(target, outcome);
                }
            } else {
                still_pending.push(handle);
            }
        }
        pending = still_pending;
        if !pending.is_empty() {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }

    let failed: Vec<String> =
        results.iter().filter(|(_, o)| **o == TargetOutcome::Failed).map(|(t, _)| t.clone()).collect();
    if !failed.is_empty() {
        return Err(CleanError::RemoteCleanFailed(failed));
    }
    Ok(results)
}

async fn try_candidates(
    candidates: &[Platform],
    workflow: &str,
    rm_patterns: &[String],
    timeout: Duration,
) -> TargetOutcome {
    let fanout = SshFanout::new();
    for platform in candidates {
        let Some(host) = platform.hosts.first() else { continue };
        let invocation = SshInvocation {
            ssh_command: platform.ssh_command.clone(),
            host: host.clone(),
            user: platform.owner.clone(),
            remote_argv: build_remote_clean_argv(workflow, rm_patterns),
            stdin: None,
            timeout,
        };
        match fanout.run(&invocation).await {
            Ok(SshOutcome::Ran { rc: 0, .. }) => return TargetOutcome::Cleaned,
            Ok(SshOutcome::TransportFailure { .. }) => {
                tracing::warn!(%host, "ssh transport failure during remote clean, trying next host");
                continue;
            }
            Ok(SshOutcome::Ran { rc, stderr, .. }) => {
                tracing::warn!(%host, rc, %stderr, "remote clean command failed");
                return TargetOutcome::Failed;
            }
            Err(e) => {
                tracing::warn!(%host, error = %e, "remote clean ssh invocation failed");
                return TargetOutcome::Failed;
            }
        }
    }
    TargetOutcome::Failed
}

#[cfg(test)]
#[path = "clean_tests.rs"]
mod tests;
