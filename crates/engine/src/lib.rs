// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Forge Contributors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! forge-engine: the orchestration core of the forge supervisor.
//!
//! Components coordinate exclusively over the `forge_core` event bus:
//! the ingress connector and filesystem watcher raise signals, the
//! update state machine pauses the watcher around every attempt, and
//! the process supervisor owns the one supervised child.

pub mod git;
pub mod ingress;
pub mod pidfile;
pub mod supervisor;
pub mod update;
pub mod watcher;

pub use git::{GitClient, GitError, ScriptRunner, ShellRunner, SourceControl};
pub use ingress::{Ingress, IngressError};
pub use pidfile::{
    pid_file, save_pid, stop_daemon, PathHasher, PidError, ProcessTree, Sha256PathHasher,
    StopOutcome, SystemProcessTree,
};
pub use supervisor::{Supervisor, SupervisorSpec, DEFAULT_MAX_RESTARTS};
pub use update::{safe, UpdateInput, UpdateMachine, UpdateOutcome, UpdateSpec, UpdateState};
pub use watcher::Watcher;
