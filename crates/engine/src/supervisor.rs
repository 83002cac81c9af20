// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Forge Contributors

//! The process supervisor: owns the lifecycle of exactly one child
//! application process.
//!
//! A monitor task spawns the child and restarts it on crash, up to a
//! bounded number of consecutive crashes; a crash after a stable
//! stretch of uptime resets the budget. The supervisor never polls:
//! it reacts to direct calls from the runner, which in turn forwards
//! bus signals (`application.signal.restart`, `.update`).

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use forge_core::{topics, EventBus, Payload};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::git::{GitClient, ShellRunner};
use crate::update::{self, UpdateOutcome, UpdateSpec};

/// Consecutive-crash budget before the supervisor gives up restarting.
pub const DEFAULT_MAX_RESTARTS: u32 = 5;

/// Uptime after which a later crash no longer counts as consecutive.
const CRASH_WINDOW: Duration = Duration::from_secs(5);

/// How to spawn and update the supervised application.
#[derive(Debug, Clone)]
pub struct SupervisorSpec {
    /// Absolute path of the supervised executable.
    pub executable: PathBuf,
    pub args: Vec<String>,
    /// Working directory for the child (the application root).
    pub directory: PathBuf,
    /// Optional interpreter the executable is run through.
    pub execute: Option<PathBuf>,
    pub max_restarts: u32,
    pub update: UpdateSpec,
}

/// Bookkeeping for the live child. At most one exists per supervisor;
/// cleared when the monitor task confirms the stop.
struct Running {
    pid: u32,
    started_at: Instant,
    restarts: u32,
    cancel: CancellationToken,
    stopped: watch::Receiver<bool>,
}

struct Inner {
    bus: EventBus,
    spec: SupervisorSpec,
    state: Mutex<Option<Running>>,
}

/// Callback invoked once a requested stop has been confirmed.
pub type StopCallback = Box<dyn FnOnce() + Send>;

#[derive(Clone)]
pub struct Supervisor {
    inner: Arc<Inner>,
}

impl Supervisor {
    pub fn new(bus: EventBus, spec: SupervisorSpec) -> Self {
        Self { inner: Arc::new(Inner { bus, spec, state: Mutex::new(None) }) }
    }

    pub fn is_running(&self) -> bool {
        self.inner.state.lock().is_some()
    }

    /// Pid of the live child, if any.
    pub fn pid(&self) -> Option<u32> {
        self.inner.state.lock().as_ref().map(|r| r.pid).filter(|&p| p != 0)
    }

    /// Restart count within the current crash window.
    pub fn restart_count(&self) -> u32 {
        self.inner.state.lock().as_ref().map(|r| r.restarts).unwrap_or(0)
    }

    /// Spawn the child under the crash monitor. No-op if one is
    /// already running.
    pub fn start(&self) {
        let mut guard = self.inner.state.lock();
        if guard.is_some() {
            return;
        }
        let cancel = CancellationToken::new();
        let (stopped_tx, stopped_rx) = watch::channel(false);
        *guard = Some(Running {
            pid: 0,
            started_at: Instant::now(),
            restarts: 0,
            cancel: cancel.clone(),
            stopped: stopped_rx,
        });
        drop(guard);

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            monitor(inner, cancel, stopped_tx).await;
        });
    }

    /// Gracefully terminate the child, wait for the confirmed stop,
    /// clear state, invoke `callback`, and optionally start again.
    ///
    /// Idempotent: with nothing running and `restart_after` false this
    /// is a no-op; with `restart_after` true it starts directly.
    pub async fn stop(&self, restart_after: bool, callback: Option<StopCallback>) {
        let handles = {
            let guard = self.inner.state.lock();
            guard.as_ref().map(|r| (r.cancel.clone(), r.stopped.clone()))
        };

        match handles {
            None => {
                if restart_after {
                    self.start();
                }
            }
            Some((cancel, mut stopped)) => {
                cancel.cancel();
                while !*stopped.borrow_and_update() {
                    if stopped.changed().await.is_err() {
                        break;
                    }
                }
                if let Some(cb) = callback {
                    cb();
                }
                if restart_after {
                    self.start();
                }
            }
        }
    }

    /// Publish a restart event, then stop-and-start.
    pub async fn restart(&self) {
        match self.pid() {
            Some(pid) => self.inner.bus.publish(
                topics::FORGE_RESTART,
                Payload::Process { pid, message: format!("[forge] Restarting Process: PID {}", pid) },
            ),
            None => self
                .inner
                .bus
                .publish(topics::FORGE_RESTART, Payload::message("[forge] Restarting Process")),
        }
        self.stop(true, None).await;
    }

    /// Clear child bookkeeping without touching the OS-level process.
    /// Used internally after a confirmed stop.
    pub fn reset(&self) {
        *self.inner.state.lock() = None;
    }

    /// Run a safe update; on success restart the child, on failure
    /// leave it running on whatever code state resulted.
    pub async fn update(&self) -> UpdateOutcome {
        let outcome =
            update::safe(&self.inner.bus, &GitClient, &ShellRunner, &self.inner.spec.update).await;
        match outcome {
            UpdateOutcome::Success => self.restart().await,
            UpdateOutcome::Failure => {
                self.inner.bus.publish(
                    topics::FORGE_ERROR,
                    Payload::message("[forge] Update failed; repository could not be rolled back"),
                );
            }
        }
        outcome
    }
}

fn build_command(spec: &SupervisorSpec) -> Command {
    let mut cmd = match &spec.execute {
        Some(interpreter) => {
            let mut cmd = Command::new(interpreter);
            cmd.arg(&spec.executable);
            cmd
        }
        None => Command::new(&spec.executable),
    };
    cmd.args(&spec.args)
        .current_dir(&spec.directory)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

/// The child's stderr carries an exec failure rather than application
/// output when the shell could not launch the target at all. Shells
/// report this either with the classic `execvp(...)` prefix or with a
/// `command: No such file or directory` / `command: not found`
/// diagnostic and exit 127.
fn is_exec_failure(line: &str) -> bool {
    line.starts_with("execvp(")
        || line.ends_with(": No such file or directory")
        || line.ends_with(": not found")
}

fn relay_output(bus: &EventBus, child: &mut Child) {
    if let Some(stdout) = child.stdout.take() {
        let bus = bus.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                bus.publish(topics::APP_OUTPUT, Payload::message(line));
            }
        });
    }
    if let Some(stderr) = child.stderr.take() {
        let bus = bus.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if is_exec_failure(&line) {
                    bus.publish(
                        topics::FORGE_ERROR,
                        Payload::message(format!("[forge] Failed to start child process: {}", line)),
                    );
                } else {
                    bus.publish(topics::APP_ERROR, Payload::message(line));
                }
            }
        });
    }
}

fn publish_exit(bus: &EventBus, status: std::io::Result<std::process::ExitStatus>) {
    let (code, signal) = match status {
        Ok(status) => {
            #[cfg(unix)]
            let signal = std::os::unix::process::ExitStatusExt::signal(&status);
            #[cfg(not(unix))]
            let signal = None;
            (status.code(), signal)
        }
        Err(_) => (None, None),
    };
    bus.publish(topics::APP_EXIT, Payload::Exit { code, signal });
    bus.publish(topics::FORGE_EXIT, Payload::message("[forge] Process has terminated"));
}

/// Monitor loop: spawn, relay output, wait, and restart within the
/// crash budget. Runs until a graceful stop is requested, the budget
/// is exhausted, or the spawn itself fails.
async fn monitor(inner: Arc<Inner>, cancel: CancellationToken, stopped_tx: watch::Sender<bool>) {
    let mut restarts: u32 = 0;

    loop {
        let mut child = match build_command(&inner.spec).spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(executable = %inner.spec.executable.display(), error = %e, "spawn failed");
                inner.bus.publish(
                    topics::FORGE_ERROR,
                    Payload::message(format!(
                        "[forge] Failed to start {}: {}",
                        inner.spec.executable.display(),
                        e
                    )),
                );
                break;
            }
        };

        let pid = child.id().unwrap_or(0);
        let started_at = Instant::now();
        {
            let mut guard = inner.state.lock();
            if let Some(running) = guard.as_mut() {
                running.pid = pid;
                running.started_at = started_at;
                running.restarts = restarts;
            }
        }
        inner.bus.publish(
            topics::FORGE_START,
            Payload::Process { pid, message: format!("[forge] Process started with PID {}", pid) },
        );
        relay_output(&inner.bus, &mut child);

        let cancelled = tokio::select! {
            status = child.wait() => {
                publish_exit(&inner.bus, status);
                false
            }
            _ = cancel.cancelled() => true,
        };

        if cancelled {
            if pid != 0 {
                let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
            }
            let status = child.wait().await;
            publish_exit(&inner.bus, status);
            info!(pid, "child stopped on request");
            break;
        }

        // A stop requested while we were publishing the exit must not
        // resurrect the child.
        if cancel.is_cancelled() {
            break;
        }

        if started_at.elapsed() >= CRASH_WINDOW {
            restarts = 0;
        } else {
            restarts += 1;
        }
        if restarts >= inner.spec.max_restarts {
            warn!(restarts, "restart budget exhausted, giving up");
            inner.bus.publish(
                topics::FORGE_EXIT,
                Payload::message("[forge] Process exceeded restart limit; giving up"),
            );
            break;
        }
    }

    *inner.state.lock() = None;
    let _ = stopped_tx.send(true);
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
