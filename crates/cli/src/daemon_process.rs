// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Forge Contributors

//! Background re-invocation for daemon mode.
//!
//! `run --daemon` does not fork: it re-invokes the current executable
//! as `run --foreground ...` with stdio redirected to the configured
//! log files and the child detached into its own process group. The
//! explicit `--foreground` marker keeps the child from detaching
//! again.

use anyhow::{Context, Result};
use forge_engine::{save_pid, Sha256PathHasher};
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::warn;

use crate::commands::run::RunArgs;
use crate::commands::Loaded;

/// Argument vector for the re-invoked child. Flags come before the
/// script word: everything after it is swallowed by the trailing
/// application-options positional.
fn daemon_argv(config_file: Option<&Path>, args: &RunArgs) -> Vec<OsString> {
    let mut argv: Vec<OsString> = vec!["run".into(), "--foreground".into()];
    if let Some(path) = config_file {
        argv.push("--config".into());
        argv.push(path.into());
    }
    if args.update {
        argv.push("--update".into());
    }
    if args.watch {
        argv.push("--watch".into());
    }
    if let Some(script) = &args.script {
        argv.push(script.into());
    }
    argv.extend(args.app_options.iter().map(OsString::from));
    argv
}

fn log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open daemon log file {}", path.display()))
}

/// Detach a supervising child and return immediately.
pub fn start_daemon(loaded: &Loaded, config_file: Option<&Path>, args: &RunArgs) -> Result<()> {
    let current = std::env::current_exe().context("failed to resolve the forge executable")?;
    let stdout = log_file(&loaded.config.daemon.stdout_log)?;
    let stderr = log_file(&loaded.config.daemon.stderr_log)?;

    let mut command = Command::new(current);
    command
        .args(daemon_argv(config_file, args))
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr)
        .process_group(0);

    let child = command.spawn().context("failed to start the forge daemon")?;
    let pid = child.id();

    // A failed record only breaks a later `forge stop`; the daemon
    // itself is already running.
    if let Err(e) = save_pid(
        pid,
        &loaded.config.daemon.pid_dir,
        &loaded.target.executable,
        &Sha256PathHasher,
    ) {
        warn!(error = %e, "could not record the daemon pid");
    }

    println!("forge daemon started (pid {})", pid);
    Ok(())
}

#[cfg(test)]
#[path = "daemon_process_tests.rs"]
mod tests;
