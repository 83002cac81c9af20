// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Forge Contributors

//! Event model for the forge event bus.
//!
//! An [`Event`] is a `(topic, payload)` pair. Topics are dot-separated
//! strings; the well-known ones live in [`topics`]. Payloads are
//! free-form: a log line, a process exit, a changed path, or a raw
//! JSON document from an ingress source.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Well-known topics.
///
/// The `forge.*` channel carries supervisor/system events; the
/// `application.*` channel carries the supervised process's own output
/// and the signals other components raise on its behalf.
pub mod topics {
    /// Child process spawned (payload: pid + message).
    pub const FORGE_START: &str = "forge.start";
    /// Child process terminated, or restart budget exhausted.
    pub const FORGE_EXIT: &str = "forge.exit";
    /// Supervisor is about to restart the child.
    pub const FORGE_RESTART: &str = "forge.restart";
    /// Supervisor-level error (spawn failure, update failure).
    pub const FORGE_ERROR: &str = "forge.error";
    /// Informational supervisor log line.
    pub const FORGE_LOG_OUTPUT: &str = "forge.log.output";
    /// Error-level supervisor log line.
    pub const FORGE_LOG_ERROR: &str = "forge.log.error";
    /// An update attempt entered its starting state.
    pub const FORGE_UPDATE_START: &str = "forge.update.start";
    /// An update attempt reached a terminal outcome.
    pub const FORGE_UPDATE_END: &str = "forge.update.end";

    /// A line of child stdout.
    pub const APP_OUTPUT: &str = "application.output";
    /// A line of child stderr.
    pub const APP_ERROR: &str = "application.error";
    /// Child exit with code/signal.
    pub const APP_EXIT: &str = "application.exit";
    /// Restart requested (watcher or operator).
    pub const APP_SIGNAL_RESTART: &str = "application.signal.restart";
    /// Update requested (ingress connector).
    pub const APP_SIGNAL_UPDATE: &str = "application.signal.update";
}

/// Event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    /// Human-readable message.
    Message { text: String },
    /// Process lifecycle message with the pid it concerns.
    Process { pid: u32, message: String },
    /// Process exit status.
    Exit {
        code: Option<i32>,
        signal: Option<i32>,
    },
    /// A filesystem path changed.
    Changed { path: PathBuf },
    /// Raw structured payload (webhook/queue message).
    Json { value: serde_json::Value },
    /// No payload.
    Empty,
}

impl Payload {
    pub fn message(text: impl Into<String>) -> Self {
        Payload::Message { text: text.into() }
    }

    /// The textual form of the payload, for log relays.
    pub fn as_text(&self) -> String {
        match self {
            Payload::Message { text } => text.clone(),
            Payload::Process { message, .. } => message.clone(),
            Payload::Exit { code, signal } => match (code, signal) {
                (Some(c), _) => format!("exit code {}", c),
                (None, Some(s)) => format!("killed by signal {}", s),
                (None, None) => "exited".to_string(),
            },
            Payload::Changed { path } => path.display().to_string(),
            Payload::Json { value } => value.to_string(),
            Payload::Empty => String::new(),
        }
    }
}

/// A broadcast event: a topic plus a payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub topic: String,
    pub payload: Payload,
}

impl Event {
    pub fn new(topic: impl Into<String>, payload: Payload) -> Self {
        Self { topic: topic.into(), payload }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
