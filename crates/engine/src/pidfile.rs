// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Forge Contributors

//! PID records for daemon mode.
//!
//! Each supervised executable maps to one on-disk PID file whose name
//! is a content hash of the absolute executable path, so a later
//! `stop` invocation from a fresh process finds the same record.
//! The hash is an injected capability so tests can assert exact
//! filenames.

use std::path::{Path, PathBuf};

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum PidError {
    #[error("failed to write PID file {0}: {1}")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("failed to read PID file {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("PID file {0} does not contain a pid: {1}")]
    Malformed(PathBuf, String),
}

/// Hashing capability used to derive PID filenames.
pub trait PathHasher: Send + Sync {
    fn digest_hex(&self, input: &str) -> String;
}

/// Default SHA-256 hasher.
#[derive(Debug, Clone, Default)]
pub struct Sha256PathHasher;

impl PathHasher for Sha256PathHasher {
    fn digest_hex(&self, input: &str) -> String {
        let digest = Sha256::digest(input.as_bytes());
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Deterministic PID file path for an executable:
/// `<pid_dir>/<hex(hash(absolute executable path))>.pid`.
pub fn pid_file(pid_dir: &Path, executable: &Path, hasher: &dyn PathHasher) -> PathBuf {
    let digest = hasher.digest_hex(&executable.to_string_lossy());
    pid_dir.join(format!("{}.pid", digest))
}

/// Persist the daemon's pid. Failure here is non-fatal for the daemon
/// itself, it only breaks a later `stop`, so callers log and move on.
pub fn save_pid(
    pid: u32,
    pid_dir: &Path,
    executable: &Path,
    hasher: &dyn PathHasher,
) -> Result<PathBuf, PidError> {
    let path = pid_file(pid_dir, executable, hasher);
    std::fs::write(&path, pid.to_string()).map_err(|e| PidError::Write(path.clone(), e))?;
    Ok(path)
}

/// Process-tree enumeration and termination, injectable for tests.
pub trait ProcessTree: Send + Sync {
    /// All descendant pids of `pid`, transitively.
    fn descendants(&self, pid: i32) -> Vec<i32>;

    /// Signal a process: SIGKILL when `force`, SIGTERM otherwise.
    fn kill(&self, pid: i32, force: bool) -> std::io::Result<()>;
}

/// Real process tree, enumerated via `ps -eo pid=,ppid=`.
#[derive(Debug, Clone, Default)]
pub struct SystemProcessTree;

impl ProcessTree for SystemProcessTree {
    fn descendants(&self, pid: i32) -> Vec<i32> {
        let output = match std::process::Command::new("ps").args(["-eo", "pid=,ppid="]).output() {
            Ok(out) if out.status.success() => out,
            _ => return Vec::new(),
        };
        let table: Vec<(i32, i32)> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter_map(|line| {
                let mut fields = line.split_whitespace();
                let child = fields.next()?.parse().ok()?;
                let parent = fields.next()?.parse().ok()?;
                Some((child, parent))
            })
            .collect();
        collect_descendants(pid, &table)
    }

    fn kill(&self, pid: i32, force: bool) -> std::io::Result<()> {
        let signal = if force { Signal::SIGKILL } else { Signal::SIGTERM };
        kill(Pid::from_raw(pid), signal).map_err(std::io::Error::from)
    }
}

/// Walk the (pid, ppid) table breadth-first from `root`.
fn collect_descendants(root: i32, table: &[(i32, i32)]) -> Vec<i32> {
    let mut found = Vec::new();
    let mut frontier = vec![root];
    while let Some(parent) = frontier.pop() {
        for &(child, ppid) in table {
            if ppid == parent && !found.contains(&child) {
                found.push(child);
                frontier.push(child);
            }
        }
    }
    found
}

/// Result of a daemon stop request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// The recorded daemon (and its process tree) was terminated.
    Stopped(i32),
    /// No PID record exists for this executable; nothing to stop.
    NotRunning,
}

/// Stop the daemon recorded for `executable`: kill its descendants,
/// terminate the recorded pid, delete the record. A missing PID file
/// is a no-op.
pub fn stop_daemon(
    pid_dir: &Path,
    executable: &Path,
    hasher: &dyn PathHasher,
    tree: &dyn ProcessTree,
) -> Result<StopOutcome, PidError> {
    let path = pid_file(pid_dir, executable, hasher);
    if !path.exists() {
        return Ok(StopOutcome::NotRunning);
    }

    let text = std::fs::read_to_string(&path).map_err(|e| PidError::Read(path.clone(), e))?;
    let pid: i32 = text
        .trim()
        .parse()
        .map_err(|_| PidError::Malformed(path.clone(), text.trim().to_string()))?;

    for child in tree.descendants(pid) {
        if let Err(e) = tree.kill(child, true) {
            warn!(pid = child, error = %e, "could not kill descendant process");
        }
    }
    if let Err(e) = tree.kill(pid, false) {
        warn!(pid, error = %e, "could not terminate recorded daemon pid");
    }

    if let Err(e) = std::fs::remove_file(&path) {
        warn!(path = %path.display(), error = %e, "could not remove PID file");
    }
    info!(pid, "daemon stopped");
    Ok(StopOutcome::Stopped(pid))
}

#[cfg(test)]
#[path = "pidfile_tests.rs"]
mod tests;
