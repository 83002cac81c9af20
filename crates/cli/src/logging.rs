// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Forge Contributors

//! Bus-to-tracing bridge.
//!
//! The only component that turns bus traffic into operator-visible
//! output. Everything else publishes and stays quiet.

use forge_core::{topics, Event, EventBus, Payload};
use tracing::{error, info, warn};

/// Subscribe the log bridge to the supervisor and application channels.
pub fn attach(bus: &EventBus) {
    bus.subscribe("forge.*", |event: &Event| {
        let message = event.payload.as_text();
        match event.topic.as_str() {
            topics::FORGE_ERROR | topics::FORGE_LOG_ERROR => error!("{}", message),
            _ if !message.is_empty() => info!("{}", message),
            _ => {}
        }
    });

    bus.subscribe("application.*", |event: &Event| {
        match (event.topic.as_str(), &event.payload) {
            (topics::APP_OUTPUT, payload) => info!("{}", payload.as_text()),
            (topics::APP_ERROR, payload) => warn!("{}", payload.as_text()),
            (topics::APP_EXIT, Payload::Exit { code, signal }) => {
                info!(code = ?code, signal = ?signal, "application exited");
            }
            // Signal topics are internal plumbing, not log output.
            _ => {}
        }
    });
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
