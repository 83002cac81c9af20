// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Forge Contributors

//! `forge stop` - stop a daemonized application

use anyhow::Result;
use forge_engine::{stop_daemon, Sha256PathHasher, StopOutcome, SystemProcessTree};
use serde_json::Value;
use std::path::PathBuf;

use crate::commands::TargetArgs;

pub fn stop(config_file: Option<PathBuf>, args: TargetArgs) -> Result<()> {
    let loaded = crate::commands::load(
        config_file,
        args.script.as_deref(),
        &[],
        Value::Object(serde_json::Map::new()),
    )?;

    let outcome = stop_daemon(
        &loaded.config.daemon.pid_dir,
        &loaded.target.executable,
        &Sha256PathHasher,
        &SystemProcessTree,
    )?;
    match outcome {
        StopOutcome::Stopped(pid) => println!("Stopped forge daemon (pid {})", pid),
        StopOutcome::NotRunning => println!("forge is not running"),
    }
    Ok(())
}
