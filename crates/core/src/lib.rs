// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Forge Contributors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! forge-core: event bus, event model, and configuration for the
//! forge continuous-deployment supervisor.

pub mod bus;
pub mod config;
pub mod event;

pub use bus::{EventBus, SubscriptionToken, TopicPattern};
pub use config::{
    deep_merge, AppTarget, Config, ConfigBuilder, ConfigError, Connections, DaemonConfig,
    GitConfig, HttpSettings, QueueSettings, Scripts, WatchConfig, ENV_CONFIG_FILE, ENV_PREFIX,
};
pub use event::{topics, Event, Payload};
