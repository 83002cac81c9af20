// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Forge Contributors

//! `forge run` - launch and supervise an application

use anyhow::Result;
use clap::Args;
use serde_json::{json, Value};
use std::path::PathBuf;

use crate::{daemon_process, runner};

#[derive(Args)]
pub struct RunArgs {
    /// Script or executable to supervise
    pub script: Option<String>,

    /// Additional arguments passed through to the application
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub app_options: Vec<String>,

    /// Detach and keep running in the background
    #[arg(short = 'd', long)]
    pub daemon: bool,

    /// Run a safe update before the first start
    #[arg(short = 'u', long)]
    pub update: bool,

    /// Restart the application when its files change
    #[arg(short = 'w', long)]
    pub watch: bool,

    /// Marker for the re-invoked daemon child
    #[arg(long, hide = true)]
    pub foreground: bool,
}

pub async fn run(config_file: Option<PathBuf>, args: RunArgs) -> Result<()> {
    let overrides = overrides_from(&args);
    let loaded =
        crate::commands::load(config_file.clone(), args.script.as_deref(), &args.app_options, overrides)?;

    if loaded.config.daemon.on && !args.foreground {
        return daemon_process::start_daemon(&loaded, config_file.as_deref(), &args);
    }
    runner::run(loaded).await
}

/// CLI flags overlay the config as the highest-precedence layer.
fn overrides_from(args: &RunArgs) -> Value {
    let mut overrides = serde_json::Map::new();
    if args.daemon {
        overrides.insert("daemon".to_string(), json!({ "on": true }));
    }
    if args.update {
        overrides.insert("update_on_start".to_string(), json!(true));
    }
    if args.watch {
        overrides.insert("watch".to_string(), json!({ "on": true }));
    }
    Value::Object(overrides)
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
