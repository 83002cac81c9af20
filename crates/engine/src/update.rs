// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Forge Contributors

//! The update state machine: fetch → reset → run-script, with a full
//! rollback to the pre-update revision on any forward failure.
//!
//! The machine itself is a pure transition function over
//! [`UpdateState`] and [`UpdateInput`], returning the side effects to
//! perform; [`safe`] is the async driver that executes those effects
//! against a [`SourceControl`] and [`ScriptRunner`]. Every failure in
//! a step becomes the next input; nothing is thrown across the
//! machine boundary, so it always lands in a defined state.
//!
//! The rollback path deliberately mirrors the forward path's script
//! step: a post-update script (dependency installation, say) may be
//! needed to make the rolled-back revision runnable, not only the
//! newly pulled one.

use std::path::PathBuf;

use forge_core::{topics, EventBus, Payload};
use tracing::{error, info};

use crate::git::{ScriptRunner, SourceControl};

/// States of one update attempt. `waiting` ignores every input except
/// an explicit [`UpdateInput::Begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    Waiting,
    Starting,
    Updating,
    RollingBack,
}

/// Inputs fed to the machine: the entry trigger plus the completion of
/// each external operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateInput {
    /// Explicit entry, from the `safe()` entry point.
    Begin,
    /// Pre-update revision query finished. `None` when the query
    /// failed; the attempt still proceeds, and rollback will skip its
    /// reset step.
    Captured(Option<String>),
    FetchSucceeded,
    FetchFailed,
    ScriptSucceeded,
    ScriptFailed,
    /// Rollback reset finished; its outcome is deliberately ignored.
    ResetFinished,
}

/// Side effects the driver must perform after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateEffect {
    PublishUpdateStart,
    CaptureRevision,
    FetchAndReset,
    RunScript,
    ResetToPreUpdate,
    Conclude(UpdateOutcome),
}

/// Terminal outcome of an attempt, signaled to the caller; not a
/// stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Success,
    /// The rollback could not complete safely; the repository is left
    /// on whatever source state resulted.
    Failure,
}

/// Per-attempt context. The pre-update SHA is captured exactly once,
/// before any destructive operation, and is the only rollback basis.
#[derive(Debug, Clone)]
pub struct UpdateSpec {
    pub remote: String,
    pub revision: String,
    pub directory: PathBuf,
    pub script: Option<String>,
}

/// Pure transition function plus the captured rollback target.
#[derive(Debug)]
pub struct UpdateMachine {
    state: UpdateState,
    pre_update_sha: Option<String>,
}

impl Default for UpdateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateMachine {
    pub fn new() -> Self {
        Self { state: UpdateState::Waiting, pre_update_sha: None }
    }

    pub fn state(&self) -> UpdateState {
        self.state
    }

    /// The revision recorded at entry to `starting`.
    pub fn pre_update_sha(&self) -> Option<&str> {
        self.pre_update_sha.as_deref()
    }

    /// Advance the machine. Undefined (state, input) pairs are ignored
    /// in place, so the machine never leaves a defined state.
    pub fn step(&mut self, input: UpdateInput) -> Vec<UpdateEffect> {
        use UpdateEffect as E;
        use UpdateInput as I;
        use UpdateState as S;

        let (next, effects) = match (self.state, input) {
            (S::Waiting, I::Begin) => {
                (S::Starting, vec![E::PublishUpdateStart, E::CaptureRevision])
            }
            (S::Starting, I::Captured(sha)) => {
                self.pre_update_sha = sha;
                (S::Updating, vec![E::FetchAndReset])
            }
            (S::Updating, I::FetchSucceeded) => (S::Updating, vec![E::RunScript]),
            (S::Updating, I::FetchFailed) => (S::RollingBack, vec![E::ResetToPreUpdate]),
            (S::Updating, I::ScriptSucceeded) => {
                (S::Waiting, vec![E::Conclude(UpdateOutcome::Success)])
            }
            (S::Updating, I::ScriptFailed) => (S::RollingBack, vec![E::ResetToPreUpdate]),
            (S::RollingBack, I::ResetFinished) => (S::RollingBack, vec![E::RunScript]),
            (S::RollingBack, I::ScriptSucceeded) => {
                (S::Waiting, vec![E::Conclude(UpdateOutcome::Success)])
            }
            (S::RollingBack, I::ScriptFailed) => {
                (S::Waiting, vec![E::Conclude(UpdateOutcome::Failure)])
            }
            (state, _) => (state, vec![]),
        };
        self.state = next;
        effects
    }
}

/// Run one safe update attempt to its terminal outcome.
///
/// Publishes `forge.update.start` on entry to `starting` and
/// `forge.update.end` after either terminal branch, which is the
/// watcher's suspension window. Progress goes to `forge.log.output`,
/// failures to `forge.log.error`.
pub async fn safe(
    bus: &EventBus,
    repo: &dyn SourceControl,
    shell: &dyn ScriptRunner,
    spec: &UpdateSpec,
) -> UpdateOutcome {
    let mut machine = UpdateMachine::new();
    let mut pending = machine.step(UpdateInput::Begin);

    loop {
        let mut next_input = None;
        for effect in pending {
            match effect {
                UpdateEffect::PublishUpdateStart => {
                    bus.publish(topics::FORGE_UPDATE_START, Payload::Empty);
                }
                UpdateEffect::CaptureRevision => {
                    let sha = match repo.current_revision(&spec.directory).await {
                        Ok(sha) => Some(sha),
                        Err(e) => {
                            log_error(bus, &format!("[forge] Could not read current revision: {}", e));
                            None
                        }
                    };
                    next_input = Some(UpdateInput::Captured(sha));
                }
                UpdateEffect::FetchAndReset => {
                    log_output(bus, "[forge] Updating repository");
                    next_input = Some(
                        match repo.fetch(&spec.directory, &spec.remote, &spec.revision).await {
                            Ok(out) => {
                                log_output(bus, out.trim_end());
                                UpdateInput::FetchSucceeded
                            }
                            Err(e) => {
                                log_error(bus, &e.to_string());
                                UpdateInput::FetchFailed
                            }
                        },
                    );
                }
                UpdateEffect::RunScript => {
                    next_input = Some(match &spec.script {
                        Some(script) => {
                            log_output(bus, "[forge] Running update script");
                            match shell.run(&spec.directory, script).await {
                                Ok(out) => {
                                    if !out.trim().is_empty() {
                                        log_output(bus, out.trim_end());
                                    }
                                    UpdateInput::ScriptSucceeded
                                }
                                Err(e) => {
                                    log_error(bus, &e.to_string());
                                    UpdateInput::ScriptFailed
                                }
                            }
                        }
                        None => {
                            log_output(bus, "No update script specified");
                            UpdateInput::ScriptSucceeded
                        }
                    });
                }
                UpdateEffect::ResetToPreUpdate => {
                    match machine.pre_update_sha().map(str::to_string) {
                        Some(sha) => {
                            log_output(bus, &format!("[forge] Resetting to revision {}", sha));
                            // The reset's own outcome is ignored: the
                            // rollback script still runs either way.
                            if let Err(e) = repo.reset_hard(&spec.directory, &sha).await {
                                log_error(bus, &e.to_string());
                            }
                        }
                        None => {
                            log_error(bus, "[forge] No pre-update revision recorded; skipping reset");
                        }
                    }
                    next_input = Some(UpdateInput::ResetFinished);
                }
                UpdateEffect::Conclude(outcome) => {
                    bus.publish(topics::FORGE_UPDATE_END, Payload::Empty);
                    match outcome {
                        UpdateOutcome::Success => info!("update attempt finished"),
                        UpdateOutcome::Failure => {
                            error!("update failed and the repository could not be rolled back");
                        }
                    }
                    return outcome;
                }
            }
        }

        match next_input {
            Some(input) => pending = machine.step(input),
            // No effect produced an input: the machine is parked. This
            // cannot happen from the Begin entry point, but bail rather
            // than spin.
            None => return UpdateOutcome::Failure,
        }
    }
}

fn log_output(bus: &EventBus, message: &str) {
    bus.publish(topics::FORGE_LOG_OUTPUT, Payload::message(message));
}

fn log_error(bus: &EventBus, message: &str) {
    bus.publish(topics::FORGE_LOG_ERROR, Payload::message(message));
}

#[cfg(test)]
#[path = "update_tests.rs"]
mod tests;
